use crate::{ImageId, ProjectId, TemplateId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a generated image.
///
/// An image record is created in `Pending` the moment a render is requested,
/// so callers can poll it while the pipeline works. It moves to exactly one
/// of `Ready` or `Failed` and never transitions again after that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, strum::EnumDiscriminants)]
#[strum_discriminants(name(ImageStatus), derive(strum::Display, Serialize, Deserialize))]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageState {
    /// Queued or mid-generation.
    Pending,
    /// Uploaded and viewable.
    Ready {
        /// The exact prompt the provider rendered, including any revision
        /// the provider applied.
        prompt: String,
        /// Canonical storage location of the full-size PNG.
        url: String,
        /// Publicly servable URL of the full-size PNG.
        public_url: String,
        /// Publicly servable URL of the WebP thumbnail.
        thumbnail_url: String,
    },
    /// Terminally failed; any charged credit has been refunded.
    Failed {
        /// Short operator-facing description of what went wrong.
        reason: String,
    },
}

/// One requested render of a project through a template.
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
pub struct Image {
    #[builder(default)]
    id: ImageId,
    project_id: ProjectId,
    template_id: TemplateId,
    /// Queue job driving this render, recorded for traceability.
    #[builder(default)]
    job_id: Option<String>,
    #[builder(default = "ImageState::Pending")]
    state: ImageState,
    #[builder(default = "Utc::now()")]
    created_at: DateTime<Utc>,
    #[builder(default = "Utc::now()")]
    updated_at: DateTime<Utc>,
}

impl Image {
    /// Creates a fresh pending image for the given template render.
    pub fn pending(project_id: ProjectId, template_id: TemplateId) -> Self {
        let now = Utc::now();
        Self {
            id: ImageId::new(),
            project_id,
            template_id,
            job_id: None,
            state: ImageState::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns a copy with the driving job recorded.
    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    /// Returns a copy in the given lifecycle state, with a fresh
    /// modification time.
    pub fn with_state(mut self, state: ImageState) -> Self {
        self.state = state;
        self.updated_at = Utc::now();
        self
    }

    /// Returns a copy marked ready with its final artifacts.
    pub fn ready(
        self,
        prompt: impl Into<String>,
        url: impl Into<String>,
        public_url: impl Into<String>,
        thumbnail_url: impl Into<String>,
    ) -> Self {
        self.with_state(ImageState::Ready {
            prompt: prompt.into(),
            url: url.into(),
            public_url: public_url.into(),
            thumbnail_url: thumbnail_url.into(),
        })
    }

    /// Returns a copy marked terminally failed.
    pub fn failed(self, reason: impl Into<String>) -> Self {
        self.with_state(ImageState::Failed {
            reason: reason.into(),
        })
    }

    pub fn status(&self) -> ImageStatus {
        ImageStatus::from(&self.state)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, ImageState::Pending)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ImageState::Ready { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, ImageState::Failed { .. })
    }

    /// True once the image has reached `Ready` or `Failed`.
    pub fn is_settled(&self) -> bool {
        !self.is_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_image_is_not_settled() {
        let image = Image::pending(ProjectId::new(), TemplateId::new());
        assert!(image.is_pending());
        assert!(!image.is_settled());
        assert_eq!(image.status(), ImageStatus::Pending);
    }

    #[test]
    fn ready_records_artifacts() {
        let image = Image::pending(ProjectId::new(), TemplateId::new()).ready(
            "a lighthouse at dusk",
            "images/a.png",
            "https://cdn.example.com/a.png",
            "https://cdn.example.com/a.webp",
        );
        assert!(image.is_ready());
        match image.state() {
            ImageState::Ready { thumbnail_url, .. } => {
                assert_eq!(thumbnail_url, "https://cdn.example.com/a.webp");
            }
            other => panic!("expected ready, got {other:?}"),
        }
    }

    #[test]
    fn state_serializes_with_status_tag() {
        let image = Image::pending(ProjectId::new(), TemplateId::new())
            .failed("provider rejected the prompt");
        let json = serde_json::to_value(image.state()).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "provider rejected the prompt");
    }
}
