//! Prompt assembly for the three model calls the pipeline makes.
//!
//! Each builder returns the full system prompt as paragraphs joined by
//! blank lines. Optional template fields contribute a paragraph only when
//! set, so the model never sees placeholder noise for absent constraints.

use sha2::{Digest, Sha256};
use vermeer_core::{ArtStyle, IntendedUse};

/// Hex digest of the source text, used to skip re-summarizing unchanged
/// projects.
pub fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    format!("{digest:x}")
}

/// System prompt for the summarize stage.
pub fn summary_prompt(intended_use: IntendedUse) -> String {
    [
        "The user will provide you with a text. Your role is to summarize the text.".to_string(),
        format!(
            "This text is intended for a {} project.",
            intended_use.label()
        ),
        "The summary MUST BE LESS than 1000 characters.".to_string(),
    ]
    .join("\n\n")
}

/// System prompt for the recommend stage.
///
/// `styles` is the full catalog of selectable art style names; the model is
/// instructed to answer only with names from it.
pub fn recommendation_prompt(intended_use: IntendedUse, styles: &[String]) -> String {
    [
        "You will provide 3 recommended art styles based on the provided summary.".to_string(),
        format!("The available art styles are: {}.", styles.join(", ")),
        format!(
            "Take into account the intended use of the project: {}.",
            intended_use.label()
        ),
        "Choose ONLY FROM THE AVAILABLE ART STYLES. You will answer with the exact names \
         provided, do not translate or modify the names."
            .to_string(),
        "You will answer with at least 3 art styles and at most 5. You will provide the names, \
         separated by commas."
            .to_string(),
    ]
    .join("\n\n")
}

/// Everything the render prompt is assembled from.
///
/// `detail` is expected to already be clamped to the 1 to 100 scale.
#[derive(Debug, Clone, derive_new::new)]
pub struct PromptContext<'a> {
    pub art_style: &'a ArtStyle,
    pub intended_use: IntendedUse,
    pub detail: Option<i32>,
    pub mood: Option<&'a str>,
    pub key_elements: Option<&'a str>,
    pub exclude: Option<&'a str>,
}

/// System prompt for the prompt-writing call of the generate stage.
///
/// The model acts as a curator that turns the cached summary (sent as the
/// user message) into a single image prompt honoring the template's
/// constraints.
pub fn render_prompt(context: &PromptContext<'_>) -> String {
    let mut paragraphs = vec![
        "Act as a digital art curator with expertise in AI-generated images. Create innovative \
         and intriguing prompts tailored to DALL-E from text provided by the user. The prompts \
         will push the boundaries of machine creativity."
            .to_string(),
        "You will respond with a single prompt that will be used to generate an image."
            .to_string(),
        art_style_paragraph(context.art_style),
        "You will follow the art style's rules and guidelines.".to_string(),
    ];
    if let Some(paragraph) = intended_use_paragraph(context.intended_use) {
        paragraphs.push(paragraph.to_string());
    }
    if let Some(detail) = context.detail {
        paragraphs.push(format!(
            "On a scale of 1 being the most simple, minimalist and abstract image, and 100 \
             being an extremely intricate, detailed and hyperreal, this image has a detail \
             level of {detail}."
        ));
    }
    if let Some(mood) = context.mood {
        paragraphs.push(format!("The mood of the image should be: {mood}."));
    }
    if let Some(key_elements) = context.key_elements {
        paragraphs.push(format!(
            "The image MUST CONTAIN the following elements: {key_elements}. An image NOT \
             containing these elements is UNACCEPTABLE."
        ));
    }
    if let Some(exclude) = context.exclude {
        paragraphs.push(format!(
            "It should NOT CONTAIN the following elements: {exclude}. An image containing \
             these elements is UNACCEPTABLE."
        ));
    }
    paragraphs.push(
        "We are ONLY depicting the image, not the physical object where it will be published. \
         This means that the image can be printed and displayed for the intended use."
            .to_string(),
    );
    paragraphs.push("NO TEXT. NO WORD OR NUMBERS on the image.".to_string());
    paragraphs.push(
        "Again, you will respond with a single prompt that will be used to generate an image."
            .to_string(),
    );
    paragraphs.join("\n\n")
}

fn art_style_paragraph(style: &ArtStyle) -> String {
    if style.keywords().is_empty() {
        format!("The prompt should be in the art style of {}.", style.prompt())
    } else {
        format!(
            "The prompt should be in the art style of {}, a style that evokes ideas of {}.",
            style.prompt(),
            style.keywords().join(", ")
        )
    }
}

fn intended_use_paragraph(intended_use: IntendedUse) -> Option<&'static str> {
    match intended_use {
        IntendedUse::PersonalBlog => Some(
            "Optimize the image for a personal blog; this means that the image must capture \
             emotion and personality. It should also tell a story or convey a message, and \
             feel authentic and relatable.",
        ),
        IntendedUse::CompanyBlog => Some(
            "Optimize the image for a company blog; this means that the image must be \
             professional and polished. It should also be on-brand and visually appealing, \
             while also being industry-relevant.",
        ),
        IntendedUse::Newsletter => Some(
            "Optimize the image for a newsletter; this means that the image must be engaging \
             and informative. It should be complementary to the content, enhancing the \
             reader's understanding and experience.",
        ),
        IntendedUse::SocialMedia => Some(
            "Optimize the image for social media; this means that the image must be \
             eye-catching and shareable. It should be adaptable to different platforms and \
             formats, and encourage engagement and interaction.",
        ),
        IntendedUse::BookCover => Some(
            "Optimize the image for a book cover; this means that it should represent the \
             genre and tone of the book. It should be visually striking and memorable, and \
             entice the reader to pick up the book. It should set the mood and atmosphere of \
             the book, using color, lighting, and composition to evoke specific emotions or \
             settings.",
        ),
        IntendedUse::BookInterior => Some(
            "Optimize the image for a book interior; this means that it should enhance or \
             complement the text, helping to visualize concepts, settings, or characters \
             described in the passage.",
        ),
        IntendedUse::PodcastCover => Some(
            "Optimize the image for a podcast cover; this means that it should develop an \
             iconic image that represents the podcast's theme or essence, making it \
             recognizable at a glance. This image should be versatile enough to become \
             synonymous with the podcast itself.",
        ),
        IntendedUse::PodcastEpisode => Some(
            "Optimize the image for a podcast episode; this means that it should reflect the \
             specific theme, topic, or guest featured in the episode. It provides a visual \
             teaser that complements the episode's content.",
        ),
        IntendedUse::Other => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vermeer_core::ArtStyleBuilder;

    fn watercolor() -> ArtStyle {
        ArtStyleBuilder::default()
            .name("Watercolor")
            .prompt("soft translucent washes of pigment on textured paper")
            .keywords(vec!["delicate".to_string(), "flowing".to_string()])
            .build()
            .unwrap()
    }

    #[test]
    fn content_hash_is_stable_hex() {
        let a = content_hash("A lighthouse keeper discovers a message in a bottle.");
        let b = content_hash("A lighthouse keeper discovers a message in a bottle.");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, content_hash("A different text."));
    }

    #[test]
    fn summary_prompt_names_the_intended_use() {
        let prompt = summary_prompt(IntendedUse::BookCover);
        assert!(prompt.contains("intended for a book cover project"));
        assert!(prompt.contains("MUST BE LESS than 1000 characters"));
    }

    #[test]
    fn recommendation_prompt_lists_the_catalog() {
        let styles = vec![
            "Art Deco".to_string(),
            "Ukiyo-e".to_string(),
            "Watercolor".to_string(),
        ];
        let prompt = recommendation_prompt(IntendedUse::Newsletter, &styles);
        assert!(prompt.contains("The available art styles are: Art Deco, Ukiyo-e, Watercolor."));
        assert!(prompt.contains("intended use of the project: newsletter"));
        assert!(prompt.contains("at least 3 art styles and at most 5"));
    }

    #[test]
    fn render_prompt_includes_every_set_constraint() {
        let style = watercolor();
        let context = PromptContext::new(
            &style,
            IntendedUse::BookCover,
            Some(80),
            Some("serene"),
            Some("a lighthouse, a bottle"),
            Some("people"),
        );
        let prompt = render_prompt(&context);
        assert!(prompt.contains(
            "art style of soft translucent washes of pigment on textured paper, a style that \
             evokes ideas of delicate, flowing."
        ));
        assert!(prompt.contains("Optimize the image for a book cover"));
        assert!(prompt.contains("detail level of 80."));
        assert!(prompt.contains("The mood of the image should be: serene."));
        assert!(prompt.contains("MUST CONTAIN the following elements: a lighthouse, a bottle."));
        assert!(prompt.contains("NOT CONTAIN the following elements: people."));
        assert!(prompt.contains("NO TEXT. NO WORD OR NUMBERS on the image."));
        assert!(prompt.ends_with(
            "Again, you will respond with a single prompt that will be used to generate an image."
        ));
    }

    #[test]
    fn render_prompt_skips_absent_constraints() {
        let style = watercolor();
        let context = PromptContext::new(&style, IntendedUse::Other, None, None, None, None);
        let prompt = render_prompt(&context);
        assert!(!prompt.contains("Optimize the image"));
        assert!(!prompt.contains("detail level"));
        assert!(!prompt.contains("mood of the image"));
        assert!(!prompt.contains("MUST CONTAIN"));
        assert!(!prompt.contains("NOT CONTAIN"));
        // The frame around the constraints is always present.
        assert!(prompt.starts_with("Act as a digital art curator"));
        assert!(prompt.contains("NO TEXT."));
    }

    #[test]
    fn keywordless_style_omits_the_evokes_clause() {
        let style = ArtStyleBuilder::default()
            .name("Sumi-e")
            .prompt("black ink wash on rice paper")
            .build()
            .unwrap();
        let context = PromptContext::new(&style, IntendedUse::Other, None, None, None, None);
        let prompt = render_prompt(&context);
        assert!(prompt.contains("The prompt should be in the art style of black ink wash on rice paper."));
        assert!(!prompt.contains("evokes ideas of"));
    }
}
