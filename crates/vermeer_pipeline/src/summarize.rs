//! Summarize stage: turns project text into a cached summary.

use crate::prompt::{content_hash, summary_prompt};
use crate::{GeneratePayload, PipelineConfig, RecommendPayload, SummarizePayload};
use std::sync::Arc;
use vermeer_cache::{MemoCache, hash_key, recommendations_key, summary_key};
use vermeer_core::{
    CACHE_TTL, CompletionRequestBuilder, IMAGE_QUEUE, Message, RECOMMEND_QUEUE, SUMMARY_QUEUE,
    TokenUsage,
};
use vermeer_error::{PipelineError, PipelineErrorKind, PipelineResult};
use vermeer_interface::TextCompletion;
use vermeer_queue::{Job, JobBroker, JobContext, JobHandler, JobOutcome};
use vermeer_store::PipelineStore;

/// Logs the provider's token accounting onto the job when reported.
pub(crate) async fn log_token_usage(ctx: &JobContext, usage: Option<&TokenUsage>) {
    let Some(usage) = usage else {
        return;
    };
    ctx.log(format!("Prompt tokens: {}", usage.prompt_tokens()))
        .await;
    ctx.log(format!("Response tokens: {}", usage.completion_tokens()))
        .await;
    ctx.log(format!("Total tokens: {}", usage.total_tokens()))
        .await;
}

/// Consumes [`SUMMARY_QUEUE`].
///
/// Hashes the source text first and skips the completion call when the hash
/// matches the cached one, then hands the chain to the recommend stage (or
/// straight to generate when recommendations are also cached).
#[derive(derive_new::new)]
pub struct SummarizeHandler {
    store: Arc<dyn PipelineStore>,
    cache: Arc<dyn MemoCache>,
    completion: Arc<dyn TextCompletion>,
    broker: JobBroker,
    config: PipelineConfig,
}

impl SummarizeHandler {
    async fn run(&self, payload: &SummarizePayload, ctx: &JobContext) -> PipelineResult<()> {
        let hash_key = hash_key(&payload.project_id);
        let hash = content_hash(&payload.text);
        if self.cache.get(&hash_key).await?.as_deref() == Some(hash.as_str()) {
            ctx.log(format!("Hash matches existing summary: {hash_key}"))
                .await;
            return self.continue_chain(payload).await;
        }

        let project = self
            .store
            .project(payload.project_id)
            .await?
            .ok_or_else(|| {
                PipelineError::new(PipelineErrorKind::ProjectNotFound(
                    payload.project_id.to_string(),
                ))
            })?;

        let request = CompletionRequestBuilder::default()
            .model(self.config.summary_model().as_str())
            .messages(vec![
                Message::system(summary_prompt(*project.intended_use())),
                Message::user(payload.text.clone()),
            ])
            .build()
            .expect("completion request with model and messages");
        let response = self.completion.complete(request).await?;

        let summary_key = summary_key(&payload.project_id);
        self.cache
            .set(&summary_key, response.content(), CACHE_TTL)
            .await?;
        self.cache.set(&hash_key, &hash, CACHE_TTL).await?;
        ctx.log(format!("Created summary: {summary_key}")).await;
        ctx.log(format!("Created hash: {hash_key}")).await;
        log_token_usage(ctx, response.usage().as_ref()).await;

        let next = RecommendPayload::from(payload);
        self.broker
            .enqueue(RECOMMEND_QUEUE, &payload.project_id.to_string(), &next)
            .await?;
        Ok(())
    }

    /// On a hash hit the summary is current; jump to the furthest stage
    /// whose inputs are already cached.
    async fn continue_chain(&self, payload: &SummarizePayload) -> PipelineResult<()> {
        let cached = self
            .cache
            .get(&recommendations_key(&payload.project_id))
            .await?;
        if cached.is_some() {
            let next = GeneratePayload::from(payload);
            self.broker
                .enqueue(IMAGE_QUEUE, &payload.image_id.to_string(), &next)
                .await?;
        } else {
            let next = RecommendPayload::from(payload);
            self.broker
                .enqueue(RECOMMEND_QUEUE, &payload.project_id.to_string(), &next)
                .await?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl JobHandler for SummarizeHandler {
    fn queue(&self) -> &str {
        SUMMARY_QUEUE
    }

    async fn handle(&self, job: &Job, ctx: &JobContext) -> JobOutcome {
        let payload: SummarizePayload = match job.payload_as() {
            Ok(payload) => payload,
            Err(error) => return JobOutcome::fail(error),
        };
        match self.run(&payload, ctx).await {
            Ok(()) => JobOutcome::Success,
            Err(error) if error.kind.is_retryable() => JobOutcome::retry(error),
            Err(error) => JobOutcome::fail(error),
        }
    }
}
