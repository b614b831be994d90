//! Shared collaborator wiring for the pipeline-running commands.

use super::RuntimeArgs;
use anyhow::Context;
use std::sync::Arc;
use vermeer_cache::InMemoryCache;
use vermeer_interface::TextCompletion;
use vermeer_models::OpenAiClient;
use vermeer_pipeline::{Pipeline, PipelineConfigBuilder};
use vermeer_queue::InMemoryJobStore;
use vermeer_storage::FsObjectStore;
use vermeer_store::{PgStore, PipelineStore};

/// Builds the production pipeline: Postgres rows, OpenAI providers, and
/// filesystem object storage. The job queue is in-process, so whichever
/// command builds the pipeline also runs its workers.
pub(crate) fn build_pipeline(args: &RuntimeArgs) -> anyhow::Result<Pipeline> {
    let store =
        Arc::new(PgStore::from_env().context("connecting to Postgres via DATABASE_URL")?);
    let provider =
        Arc::new(OpenAiClient::from_env().context("configuring OpenAI via OPENAI_API_KEY")?);
    let objects = Arc::new(FsObjectStore::new(
        args.storage_root.clone(),
        args.public_base_url.clone(),
    ));
    let config = PipelineConfigBuilder::default()
        .concurrency(args.concurrency)
        .build()
        .context("assembling pipeline config")?;
    Ok(Pipeline::new(
        Arc::clone(&store) as Arc<dyn PipelineStore>,
        store,
        Arc::new(InMemoryCache::new()),
        objects,
        Arc::clone(&provider) as Arc<dyn TextCompletion>,
        provider,
        Arc::new(InMemoryJobStore::new()),
    )
    .with_config(config))
}
