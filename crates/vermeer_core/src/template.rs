use crate::{ArtStyleId, ProjectId, TemplateId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Requested output shape, mapped to a concrete pixel size at generation
/// time.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum AspectRatio {
    #[default]
    Square,
    Landscape,
    Portrait,
}

/// Lowest accepted detail level.
pub const DETAIL_MIN: i32 = 1;
/// Highest accepted detail level.
pub const DETAIL_MAX: i32 = 100;

/// Per-image creative choices layered on top of a project.
///
/// A project can hold many templates, each describing one image to render:
/// which style, what shape, how detailed, what must and must not appear.
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
pub struct Template {
    #[builder(default)]
    id: TemplateId,
    /// Project this template renders.
    project_id: ProjectId,
    /// Chosen art style, if any.
    #[builder(default)]
    art_style_id: Option<ArtStyleId>,
    /// Output shape. Defaults to square when unset.
    #[builder(default)]
    aspect_ratio: Option<AspectRatio>,
    /// Detail level on a 1 to 100 scale, where 1 is minimalist and 100 is
    /// intricate. Values outside the range are clamped when prompting.
    #[builder(default)]
    detail: Option<i32>,
    /// Overall mood, e.g. "serene" or "ominous".
    #[builder(default)]
    mood: Option<String>,
    /// Elements that must appear in the image.
    #[builder(default)]
    key_elements: Option<String>,
    /// Elements that must not appear in the image.
    #[builder(default)]
    exclude: Option<String>,
    #[builder(default = "Utc::now()")]
    created_at: DateTime<Utc>,
}

impl Template {
    /// Detail level clamped to the accepted scale, when one was set.
    pub fn detail_clamped(&self) -> Option<i32> {
        self.detail.map(|d| d.clamp(DETAIL_MIN, DETAIL_MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_is_clamped_to_scale() {
        let template = TemplateBuilder::default()
            .project_id(ProjectId::new())
            .detail(Some(250))
            .build()
            .unwrap();
        assert_eq!(template.detail_clamped(), Some(DETAIL_MAX));

        let unset = TemplateBuilder::default()
            .project_id(ProjectId::new())
            .build()
            .unwrap();
        assert_eq!(unset.detail_clamped(), None);
    }

    #[test]
    fn aspect_ratio_defaults_to_square() {
        assert_eq!(AspectRatio::default(), AspectRatio::Square);
    }
}
