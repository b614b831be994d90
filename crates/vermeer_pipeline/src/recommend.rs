//! Recommend stage: picks art styles for a project from the catalog.

use crate::prompt::recommendation_prompt;
use crate::{GeneratePayload, PipelineConfig, RecommendPayload};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use vermeer_cache::{MemoCache, recommendations_key, summary_key};
use vermeer_core::{CACHE_TTL, CompletionRequestBuilder, IMAGE_QUEUE, Message, RECOMMEND_QUEUE};
use vermeer_error::{PipelineError, PipelineErrorKind, PipelineResult};
use vermeer_interface::TextCompletion;
use vermeer_queue::{Job, JobBroker, JobContext, JobHandler, JobOutcome};
use vermeer_store::PipelineStore;

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\d+[.)]\s*|[-*]\s*)").expect("valid regex"));

/// Matches the model's reply against the style catalog.
///
/// Accepts comma or newline separated names, strips numbered and bulleted
/// list markers, and keeps catalog casing. Unknown names are dropped and
/// duplicates collapse to their first occurrence.
pub fn parse_recommendations(raw: &str, catalog: &[String]) -> Vec<String> {
    let mut matched = Vec::new();
    for piece in raw.split(['\n', ',']) {
        let cleaned = LIST_MARKER.replace(piece, "");
        let cleaned = cleaned.trim().trim_end_matches('.').trim();
        let cleaned = cleaned.strip_prefix("and ").unwrap_or(cleaned);
        if cleaned.is_empty() {
            continue;
        }
        let name = catalog
            .iter()
            .find(|name| name.eq_ignore_ascii_case(cleaned));
        if let Some(name) = name {
            if !matched.contains(name) {
                matched.push(name.clone());
            }
        }
    }
    matched
}

/// Consumes [`RECOMMEND_QUEUE`].
///
/// Reads the cached summary, asks the model for styles constrained to the
/// catalog, caches the result, and enqueues the generate stage.
#[derive(derive_new::new)]
pub struct RecommendHandler {
    store: Arc<dyn PipelineStore>,
    cache: Arc<dyn MemoCache>,
    completion: Arc<dyn TextCompletion>,
    broker: JobBroker,
    config: PipelineConfig,
}

impl RecommendHandler {
    async fn run(&self, payload: &RecommendPayload, ctx: &JobContext) -> PipelineResult<()> {
        let summary_key = summary_key(&payload.project_id);
        let summary = self.cache.get(&summary_key).await?.ok_or_else(|| {
            PipelineError::new(PipelineErrorKind::SummaryNotFound(summary_key.clone()))
        })?;

        let project = self
            .store
            .project(payload.project_id)
            .await?
            .ok_or_else(|| {
                PipelineError::new(PipelineErrorKind::ProjectNotFound(
                    payload.project_id.to_string(),
                ))
            })?;
        let styles = self.store.art_styles().await?;
        let names: Vec<String> = styles.iter().map(|style| style.name().clone()).collect();

        let request = CompletionRequestBuilder::default()
            .model(self.config.recommendation_model().as_str())
            .messages(vec![
                Message::system(recommendation_prompt(*project.intended_use(), &names)),
                Message::user(summary),
            ])
            .build()
            .expect("completion request with model and messages");
        let response = self.completion.complete(request).await?;

        let matched = parse_recommendations(response.content(), &names);
        // Fall back to the raw reply when the model ignored the catalog.
        let recommendations = if matched.is_empty() {
            response.content().trim().to_string()
        } else {
            matched.join(", ")
        };
        self.cache
            .set(
                &recommendations_key(&payload.project_id),
                &recommendations,
                CACHE_TTL,
            )
            .await?;
        ctx.log(format!("Generated recommendations: {recommendations}"))
            .await;

        let next = GeneratePayload::from(payload);
        self.broker
            .enqueue(IMAGE_QUEUE, &payload.image_id.to_string(), &next)
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl JobHandler for RecommendHandler {
    fn queue(&self) -> &str {
        RECOMMEND_QUEUE
    }

    async fn handle(&self, job: &Job, ctx: &JobContext) -> JobOutcome {
        let payload: RecommendPayload = match job.payload_as() {
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
