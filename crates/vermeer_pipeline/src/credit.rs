//! Credit stage: applies queued grants and debits to the ledger.

use crate::CreditPayload;
use std::sync::Arc;
use vermeer_core::CREDIT_QUEUE;
use vermeer_error::{PipelineError, PipelineErrorKind, PipelineResult};
use vermeer_queue::{Job, JobContext, JobHandler, JobOutcome};
use vermeer_store::CreditLedger;

/// Consumes [`CREDIT_QUEUE`].
///
/// Positive amounts apply as grants, negative amounts as debits. The
/// payload's correlation id makes redelivered adjustments no-ops.
#[derive(derive_new::new)]
pub struct CreditHandler {
    ledger: Arc<dyn CreditLedger>,
}

impl CreditHandler {
    async fn run(&self, payload: &CreditPayload, ctx: &JobContext) -> PipelineResult<()> {
        if payload.amount == 0 {
            return Err(PipelineError::new(PipelineErrorKind::Payload(
                "credit adjustment of zero".to_string(),
            )));
        }
        let entry = if payload.amount > 0 {
            self.ledger
                .credit(
                    &payload.user_id,
                    payload.amount,
                    &payload.reason,
                    payload.product_id,
                    payload.correlation_id.as_deref(),
                )
                .await?
        } else {
            self.ledger
                .debit(
                    &payload.user_id,
                    -payload.amount,
                    &payload.reason,
                    payload.correlation_id.as_deref(),
                )
                .await?
        };
        ctx.log(format!(
            "Applied {} credits, balance {}: {}",
            payload.amount,
            entry.balance(),
            payload.reason
        ))
        .await;
        Ok(())
    }
}

#[async_trait::async_trait]
impl JobHandler for CreditHandler {
    fn queue(&self) -> &str {
        CREDIT_QUEUE
    }

    async fn handle(&self, job: &Job, ctx: &JobContext) -> JobOutcome {
        let payload: CreditPayload = match job.payload_as() {
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
