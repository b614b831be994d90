//! Worker command handler.

use super::RuntimeArgs;
use super::wire::build_pipeline;

/// Handles the `worker` command: runs the queue workers until Ctrl+C.
pub async fn handle_worker_command(runtime: &RuntimeArgs) -> anyhow::Result<()> {
    let pipeline = build_pipeline(runtime)?;
    let pool = pipeline.spawn_workers();
    tracing::info!(
        workers = pool.worker_count(),
        storage = %runtime.storage_root.display(),
        "Workers running. Press Ctrl+C to stop."
    );

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down workers");
    pool.shutdown().await;
    Ok(())
}
