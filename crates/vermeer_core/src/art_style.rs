use crate::ArtStyleId;
use serde::{Deserialize, Serialize};

/// Broad family an art style belongs to.
///
/// The generate stage renders `Nature` (and uncategorized) styles with the
/// provider's natural rendering mode rather than the default vivid one.
#[derive(
    Debug,
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
pub enum Category {
    Abstract,
    Digital,
    Fantasy,
    Geometric,
    Historical,
    Illustrative,
    Modern,
    Nature,
    SciFi,
    Technological,
    Traditional,
}

/// A named visual style the model can be asked to paint in.
///
/// The `prompt` fragment is spliced into the final image prompt verbatim,
/// while `keywords` feed the recommendation stage.
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
pub struct ArtStyle {
    #[builder(default)]
    id: ArtStyleId,
    /// Display name, e.g. "Watercolor" or "Art Deco".
    name: String,
    /// Prompt fragment describing how to render the style.
    prompt: String,
    /// Searchable terms the recommendation stage matches against.
    #[builder(default)]
    keywords: Vec<String>,
    /// Style family, when one applies.
    #[builder(default)]
    category: Option<Category>,
    /// Optional blurb shown alongside the style.
    #[builder(default)]
    description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn category_round_trips_as_text() {
        let parsed = Category::from_str("SciFi").unwrap();
        assert_eq!(parsed, Category::SciFi);
        assert_eq!(Category::Nature.to_string(), "Nature");
    }

    #[test]
    fn builder_requires_name_and_prompt() {
        let style = ArtStyleBuilder::default()
            .name("Watercolor")
            .prompt("soft translucent washes of pigment on textured paper")
            .build()
            .unwrap();
        assert_eq!(style.name(), "Watercolor");
        assert!(style.category().is_none());

        let missing = ArtStyleBuilder::default().name("Watercolor").build();
        assert!(missing.is_err());
    }
}
