//! Status command handler.

use anyhow::Context;
use uuid::Uuid;
use vermeer_core::ImageId;
use vermeer_pipeline::PipelineStatus;
use vermeer_store::{PgStore, PipelineStore};

/// Handles the `status` command: reports where an image is in its
/// lifecycle.
pub async fn handle_status_command(image: Uuid, json: bool) -> anyhow::Result<()> {
    let store = PgStore::from_env().context("connecting to Postgres via DATABASE_URL")?;
    let id = ImageId::from_uuid(image);
    let Some(image) = store.image(id).await? else {
        println!("image {id} not found");
        std::process::exit(1);
    };

    let status = PipelineStatus::from(image.state());
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }
    match status {
        PipelineStatus::Processing => println!("processing"),
        PipelineStatus::Ready { url, thumbnail_url } => {
            println!("ready");
            println!("  url       {url}");
            println!("  thumbnail {thumbnail_url}");
        }
        PipelineStatus::Failed { reason } => println!("failed: {reason}"),
    }
    Ok(())
}
