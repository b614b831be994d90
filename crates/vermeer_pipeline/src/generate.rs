//! Generate stage: renders, stores, and bills one image.
//!
//! The credit charge happens before any provider call so a user can never
//! spend compute they cannot pay for. Redelivered jobs do not double-charge
//! because the debit is keyed by a correlation id, and terminal failures
//! refund the charge through the credit queue.

use crate::prompt::{PromptContext, render_prompt};
use crate::summarize::log_token_usage;
use crate::{CreditPayload, GeneratePayload, PipelineConfig};
use chrono::Utc;
use std::sync::Arc;
use vermeer_cache::{MemoCache, summary_key};
use vermeer_core::{
    CREDIT_COST_PER_IMAGE, CREDIT_QUEUE, CompletionRequestBuilder, IMAGE_QUEUE, ImageId,
    ImageQuality, ImageRequestBuilder, ImageSize, ImageState, Message, RenderStyle,
};
use vermeer_error::{PipelineError, PipelineErrorKind, PipelineResult};
use vermeer_interface::{ImageGeneration, TextCompletion};
use vermeer_queue::{Job, JobBroker, JobContext, JobHandler, JobOutcome};
use vermeer_storage::{ObjectStore, THUMBNAIL_WIDTH, UploadOptions, thumbnail_webp};
use vermeer_store::{CreditLedger, PipelineStore};

pub(crate) fn charge_correlation(image_id: ImageId) -> String {
    format!("image:{image_id}")
}

pub(crate) fn refund_correlation(image_id: ImageId) -> String {
    format!("refund:image:{image_id}")
}

/// Consumes [`IMAGE_QUEUE`].
#[derive(derive_new::new)]
pub struct GenerateHandler {
    store: Arc<dyn PipelineStore>,
    ledger: Arc<dyn CreditLedger>,
    cache: Arc<dyn MemoCache>,
    completion: Arc<dyn TextCompletion>,
    images: Arc<dyn ImageGeneration>,
    objects: Arc<dyn ObjectStore>,
    broker: JobBroker,
    config: PipelineConfig,
}

impl GenerateHandler {
    async fn run(&self, payload: &GeneratePayload, ctx: &JobContext) -> PipelineResult<()> {
        self.ledger
            .debit(
                &payload.user_id,
                CREDIT_COST_PER_IMAGE,
                &format!("Image {} generation", payload.image_id),
                Some(&charge_correlation(payload.image_id)),
            )
            .await?;
        ctx.log(format!(
            "Charged {CREDIT_COST_PER_IMAGE} credit for image {}",
            payload.image_id
        ))
        .await;

        let template = self
            .store
            .template(payload.template_id)
            .await?
            .ok_or_else(|| {
                PipelineError::new(PipelineErrorKind::TemplateNotFound(
                    payload.template_id.to_string(),
                ))
            })?;
        let art_style_id = (*template.art_style_id()).ok_or_else(|| {
            PipelineError::new(PipelineErrorKind::ArtStyleNotFound(
                payload.template_id.to_string(),
            ))
        })?;
        let style = self.store.art_style(art_style_id).await?.ok_or_else(|| {
            PipelineError::new(PipelineErrorKind::ArtStyleNotFound(art_style_id.to_string()))
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

        let summary_key = summary_key(&payload.project_id);
        let summary = self.cache.get(&summary_key).await?.ok_or_else(|| {
            PipelineError::new(PipelineErrorKind::SummaryNotFound(summary_key.clone()))
        })?;
        ctx.log(format!("Using summary from cache: {summary}")).await;

        let context = PromptContext::new(
            &style,
            *project.intended_use(),
            template.detail_clamped(),
            template.mood().as_deref(),
            template.key_elements().as_deref(),
            template.exclude().as_deref(),
        );
        let request = CompletionRequestBuilder::default()
            .model(self.config.prompt_model().as_str())
            .messages(vec![
                Message::system(render_prompt(&context)),
                Message::user(summary),
            ])
            .build()
            .expect("completion request with model and messages");
        let response = self.completion.complete(request).await?;
        let prompt = response.content().to_string();
        ctx.log(format!("Generated prompt: {prompt}")).await;
        log_token_usage(ctx, response.usage().as_ref()).await;

        let image_request = ImageRequestBuilder::default()
            .model(self.config.image_model().as_str())
            .prompt(prompt.clone())
            .size(ImageSize::from((*template.aspect_ratio()).unwrap_or_default()))
            .style(RenderStyle::for_render(
                *style.category(),
                template.detail_clamped(),
            ))
            .quality(ImageQuality::Hd)
            .user(Some(payload.user_id.to_string()))
            .build()
            .expect("image request with model and prompt");
        let generated = self.images.generate(image_request).await?;
        if let Some(revised) = generated.revised_prompt() {
            ctx.log(format!("Generated image {revised}")).await;
        }

        let millis = Utc::now().timestamp_millis();
        let prefix = format!("{}/{}", payload.user_id, payload.project_id);
        let image_key = format!("{prefix}/{millis}.png");
        let thumbnail_key = format!("{prefix}/{millis}.webp");
        let thumbnail = thumbnail_webp(generated.bytes(), THUMBNAIL_WIDTH)?;
        let url = self
            .objects
            .put(
                generated.bytes(),
                &UploadOptions::attachment(&image_key, "image/png"),
            )
            .await?;
        self.objects
            .put(
                &thumbnail,
                &UploadOptions::attachment(&thumbnail_key, "image/webp"),
            )
            .await?;

        let final_prompt = generated.revised_prompt().clone().unwrap_or(prompt);
        let state = ImageState::Ready {
            prompt: final_prompt,
            url,
            public_url: self.objects.public_url(&image_key),
            thumbnail_url: self.objects.public_url(&thumbnail_key),
        };
        self.store
            .update_image_state(payload.image_id, &state)
            .await?;
        ctx.log(format!("Created image {}", payload.image_id)).await;
        Ok(())
    }

    /// Terminal-failure compensation: the image row settles to `Failed`
    /// and any charged credit comes back through the credit queue.
    async fn settle_failure(
        &self,
        payload: &GeneratePayload,
        error: &PipelineError,
        ctx: &JobContext,
    ) {
        let state = ImageState::Failed {
            reason: error.kind.to_string(),
        };
        if let Err(store_error) = self
            .store
            .update_image_state(payload.image_id, &state)
            .await
        {
            tracing::error!(
                %store_error,
                image = %payload.image_id,
                "failed to record image failure"
            );
        }
        ctx.log(format!("Image {} failed: {}", payload.image_id, error.kind))
            .await;

        // The charge is this stage's only ledger call, so on a ledger error
        // it did not verifiably land; refunding would mint credits.
        if matches!(&error.kind, PipelineErrorKind::Ledger(_)) {
            return;
        }
        let refund = CreditPayload {
            user_id: payload.user_id.clone(),
            amount: CREDIT_COST_PER_IMAGE,
            reason: format!("Image {} generation refunded", payload.image_id),
            product_id: None,
            correlation_id: Some(refund_correlation(payload.image_id)),
        };
        match self
            .broker
            .enqueue(CREDIT_QUEUE, &payload.image_id.to_string(), &refund)
            .await
        {
            Ok(_) => ctx.log(format!("Refund enqueued: {}", refund.reason)).await,
            Err(enqueue_error) => {
                tracing::error!(
                    %enqueue_error,
                    image = %payload.image_id,
                    "failed to enqueue refund"
                );
            }
        }
    }
}

#[async_trait::async_trait]
impl JobHandler for GenerateHandler {
    fn queue(&self) -> &str {
        IMAGE_QUEUE
    }

    async fn handle(&self, job: &Job, ctx: &JobContext) -> JobOutcome {
        let payload: GeneratePayload = match job.payload_as() {
            Ok(payload) => payload,
            Err(error) => return JobOutcome::fail(error),
        };
        match self.run(&payload, ctx).await {
            Ok(()) => JobOutcome::Success,
            Err(error) => {
                if error.kind.is_retryable() && !ctx.final_attempt() {
                    return JobOutcome::retry(error);
                }
                self.settle_failure(&payload, &error, ctx).await;
                JobOutcome::fail(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_ids_are_distinct_per_direction() {
        let id = ImageId::new();
        assert_eq!(charge_correlation(id), format!("image:{id}"));
        assert_eq!(refund_correlation(id), format!("refund:image:{id}"));
        assert_ne!(charge_correlation(id), refund_correlation(id));
    }
}
