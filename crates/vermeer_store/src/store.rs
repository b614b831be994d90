//! Persistence trait for pipeline entities.

use async_trait::async_trait;
use vermeer_core::{
    ArtStyle, ArtStyleId, Image, ImageId, ImageState, Project, ProjectId, ProjectStatus,
    Template, TemplateId,
};
use vermeer_error::StoreResult;

/// Storage for projects, art styles, templates, and image records.
///
/// The pipeline talks to this trait only, so tests can swap in
/// [`MemoryStore`](crate::MemoryStore) while deployments use
/// [`PgStore`](crate::PgStore).
///
/// Lookups return `Ok(None)` when the row does not exist; updates return
/// [`StoreErrorKind::NotFound`](vermeer_error::StoreErrorKind::NotFound)
/// instead, since updating a missing row is a caller bug worth surfacing.
#[async_trait]
pub trait PipelineStore: Send + Sync {
    async fn insert_project(&self, project: &Project) -> StoreResult<()>;

    async fn project(&self, id: ProjectId) -> StoreResult<Option<Project>>;

    async fn update_project_status(&self, id: ProjectId, status: ProjectStatus)
    -> StoreResult<()>;

    async fn insert_art_style(&self, style: &ArtStyle) -> StoreResult<()>;

    async fn art_style(&self, id: ArtStyleId) -> StoreResult<Option<ArtStyle>>;

    /// All styles, ordered by name for stable recommendation prompts.
    async fn art_styles(&self) -> StoreResult<Vec<ArtStyle>>;

    async fn insert_template(&self, template: &Template) -> StoreResult<()>;

    async fn template(&self, id: TemplateId) -> StoreResult<Option<Template>>;

    async fn insert_image(&self, image: &Image) -> StoreResult<()>;

    async fn image(&self, id: ImageId) -> StoreResult<Option<Image>>;

    /// Records the queue job driving a render.
    async fn update_image_job(&self, id: ImageId, job_id: &str) -> StoreResult<()>;

    /// Moves an image to a new lifecycle state and bumps `updated_at`.
    async fn update_image_state(&self, id: ImageId, state: &ImageState) -> StoreResult<()>;

    /// Images for one project, newest first.
    async fn images_for_project(&self, project: ProjectId) -> StoreResult<Vec<Image>>;
}
