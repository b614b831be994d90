//! Submit command handler.

use super::RuntimeArgs;
use super::wire::build_pipeline;
use anyhow::Context;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;
use vermeer_pipeline::{PipelineStatus, SubmitRequestBuilder};

/// Handles the `submit` command: runs one render end to end.
///
/// The queue lives in-process, so this spawns the workers alongside the
/// submission and waits for the image to settle before shutting them down.
pub async fn handle_submit_command(
    runtime: &RuntimeArgs,
    user: String,
    project: Uuid,
    template: Uuid,
    text: Option<String>,
    file: Option<PathBuf>,
    wait: u64,
) -> anyhow::Result<()> {
    let text = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading source text from {}", path.display()))?,
        (None, None) => anyhow::bail!("pass the source text with --text or --file"),
    };

    let pipeline = build_pipeline(runtime)?;
    let pool = pipeline.spawn_workers();

    let request = SubmitRequestBuilder::default()
        .user_id(user)
        .project_id(project)
        .template_id(template)
        .text(text)
        .build()?;
    let outcome = pipeline.submit(request).await?;
    println!("image {}", outcome.image_id());
    println!("job   {}", outcome.job_id());

    let status = pipeline
        .wait_for_image(*outcome.image_id(), Duration::from_secs(wait))
        .await?;
    pool.shutdown().await;

    match status {
        PipelineStatus::Processing => {
            println!("still processing after {wait}s; check later with `vermeer status`");
            std::process::exit(2);
        }
        PipelineStatus::Ready { url, thumbnail_url } => {
            println!("ready");
            println!("  url       {url}");
            println!("  thumbnail {thumbnail_url}");
        }
        PipelineStatus::Failed { reason } => {
            println!("failed: {reason}");
            std::process::exit(1);
        }
    }
    Ok(())
}
