use crate::{AspectRatio, Category};
use serde::{Deserialize, Serialize};

/// Concrete pixel dimensions accepted by the image model.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter,
)]
pub enum ImageSize {
    #[default]
    Square1024,
    Landscape1792,
    Portrait1792,
}

impl ImageSize {
    /// The wire form the provider expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square1024 => "1024x1024",
            Self::Landscape1792 => "1792x1024",
            Self::Portrait1792 => "1024x1792",
        }
    }
}

impl From<AspectRatio> for ImageSize {
    fn from(ratio: AspectRatio) -> Self {
        match ratio {
            AspectRatio::Square => Self::Square1024,
            AspectRatio::Landscape => Self::Landscape1792,
            AspectRatio::Portrait => Self::Portrait1792,
        }
    }
}

/// Rendering mode of the image model.
///
/// Vivid produces hyper-real, dramatic output; natural stays closer to
/// photographic reality.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderStyle {
    #[default]
    Vivid,
    Natural,
}

impl RenderStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vivid => "vivid",
            Self::Natural => "natural",
        }
    }

    /// Picks the mode for a render.
    ///
    /// Highly detailed requests and nature or uncategorized styles render
    /// natural; everything else renders vivid.
    pub fn for_render(category: Option<Category>, detail: Option<i32>) -> Self {
        if detail.is_some_and(|d| d > 95) {
            return Self::Natural;
        }
        match category {
            None | Some(Category::Nature) => Self::Natural,
            Some(_) => Self::Vivid,
        }
    }
}

/// Output fidelity of the image model.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageQuality {
    Standard,
    /// Finer detail and greater consistency, at a higher cost.
    #[default]
    Hd,
}

impl ImageQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Hd => "hd",
        }
    }
}

/// A provider-agnostic image generation request.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct ImageRequest {
    /// Provider model identifier.
    model: String,
    /// Full rendering prompt.
    prompt: String,
    #[builder(default)]
    size: ImageSize,
    #[builder(default)]
    style: RenderStyle,
    #[builder(default)]
    quality: ImageQuality,
    /// End-user identifier forwarded for the provider's abuse monitoring.
    #[builder(default)]
    user: Option<String>,
}

/// A rendered image as returned by a provider, already decoded to bytes.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters, derive_new::new)]
pub struct GeneratedImage {
    /// Raw PNG bytes.
    bytes: Vec<u8>,
    /// The provider's rewritten prompt, when it revised ours.
    revised_prompt: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_ratio_maps_to_pixel_size() {
        assert_eq!(ImageSize::from(AspectRatio::Landscape).as_str(), "1792x1024");
        assert_eq!(ImageSize::from(AspectRatio::Portrait).as_str(), "1024x1792");
        assert_eq!(ImageSize::from(AspectRatio::Square).as_str(), "1024x1024");
    }

    #[test]
    fn high_detail_renders_natural() {
        assert_eq!(
            RenderStyle::for_render(Some(Category::Fantasy), Some(96)),
            RenderStyle::Natural
        );
        assert_eq!(
            RenderStyle::for_render(Some(Category::Fantasy), Some(95)),
            RenderStyle::Vivid
        );
    }

    #[test]
    fn nature_and_uncategorized_render_natural() {
        assert_eq!(
            RenderStyle::for_render(Some(Category::Nature), None),
            RenderStyle::Natural
        );
        assert_eq!(RenderStyle::for_render(None, None), RenderStyle::Natural);
        assert_eq!(
            RenderStyle::for_render(Some(Category::Abstract), None),
            RenderStyle::Vivid
        );
    }
}
