use crate::{ProjectId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the finished image will be used for.
///
/// Drives both the tone of the text summary and the composition rules
/// baked into the final image prompt.
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
pub enum IntendedUse {
    BookCover,
    BookInterior,
    CompanyBlog,
    Newsletter,
    Other,
    PersonalBlog,
    PodcastCover,
    PodcastEpisode,
    SocialMedia,
}

impl IntendedUse {
    /// Human-readable phrase for use inside prompt text.
    pub fn label(&self) -> &'static str {
        match self {
            Self::BookCover => "book cover",
            Self::BookInterior => "book interior",
            Self::CompanyBlog => "company blog",
            Self::Newsletter => "newsletter",
            Self::Other => "other",
            Self::PersonalBlog => "personal blog",
            Self::PodcastCover => "podcast cover",
            Self::PodcastEpisode => "podcast episode",
            Self::SocialMedia => "social media",
        }
    }
}

/// Lifecycle of a project.
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
)]
pub enum ProjectStatus {
    /// Being edited, not yet handed to the pipeline.
    #[default]
    Draft,
    /// Handed to the pipeline at least once.
    Submitted,
}

/// A body of user-authored text that images are generated from.
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
pub struct Project {
    /// Unique identifier.
    #[builder(default)]
    id: ProjectId,
    /// Owner of the project.
    user_id: UserId,
    /// Optional display title.
    #[builder(default)]
    title: Option<String>,
    /// The source text that gets summarized and illustrated.
    description: String,
    /// What the generated image is for.
    intended_use: IntendedUse,
    /// Current lifecycle state.
    #[builder(default)]
    status: ProjectStatus,
    /// When the project was created.
    #[builder(default = "Utc::now()")]
    created_at: DateTime<Utc>,
    /// When the project was last modified.
    #[builder(default = "Utc::now()")]
    updated_at: DateTime<Utc>,
}

impl Project {
    /// Returns a copy in the given lifecycle state, with a fresh
    /// modification time.
    pub fn with_status(mut self, status: ProjectStatus) -> Self {
        self.status = status;
        self.updated_at = Utc::now();
        self
    }

    /// Returns a copy marked as submitted, with a fresh modification time.
    pub fn submitted(self) -> Self {
        self.with_status(ProjectStatus::Submitted)
    }
}
