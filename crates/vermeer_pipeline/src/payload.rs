//! Wire payloads carried by pipeline jobs.
//!
//! Every stage payload carries the full chain context (project, template,
//! image, and user) so each handler can enqueue the next stage without a
//! lookup. Payloads are plain serde structs; the queue stores them as JSON.

use serde::{Deserialize, Serialize};
use vermeer_core::{ImageId, ProductId, ProjectId, TemplateId, UserId};

/// Input to the summarize stage, enqueued at submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizePayload {
    pub project_id: ProjectId,
    pub template_id: TemplateId,
    pub image_id: ImageId,
    pub user_id: UserId,
    /// The source text to summarize.
    pub text: String,
}

/// Input to the recommend stage. The summary itself travels through the
/// cache, not the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendPayload {
    pub project_id: ProjectId,
    pub template_id: TemplateId,
    pub image_id: ImageId,
    pub user_id: UserId,
}

/// Input to the generate stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratePayload {
    pub project_id: ProjectId,
    pub template_id: TemplateId,
    pub image_id: ImageId,
    pub user_id: UserId,
}

impl From<&SummarizePayload> for RecommendPayload {
    fn from(payload: &SummarizePayload) -> Self {
        Self {
            project_id: payload.project_id,
            template_id: payload.template_id,
            image_id: payload.image_id,
            user_id: payload.user_id.clone(),
        }
    }
}

impl From<&SummarizePayload> for GeneratePayload {
    fn from(payload: &SummarizePayload) -> Self {
        Self {
            project_id: payload.project_id,
            template_id: payload.template_id,
            image_id: payload.image_id,
            user_id: payload.user_id.clone(),
        }
    }
}

impl From<&RecommendPayload> for GeneratePayload {
    fn from(payload: &RecommendPayload) -> Self {
        Self {
            project_id: payload.project_id,
            template_id: payload.template_id,
            image_id: payload.image_id,
            user_id: payload.user_id.clone(),
        }
    }
}

/// Input to the credit stage.
///
/// `amount` is signed: positive amounts are grants, negative amounts are
/// debits. A `correlation_id` makes the adjustment idempotent across
/// redeliveries of the same job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditPayload {
    pub user_id: UserId,
    pub amount: i64,
    /// Operator-facing reason recorded on the ledger entry.
    pub reason: String,
    /// Purchased product behind a grant, when there is one.
    pub product_id: Option<ProductId>,
    pub correlation_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_context_carries_through_conversions() {
        let summarize = SummarizePayload {
            project_id: ProjectId::new(),
            template_id: TemplateId::new(),
            image_id: ImageId::new(),
            user_id: UserId::from("user_1"),
            text: "A lighthouse keeper discovers a message in a bottle.".to_string(),
        };
        let recommend = RecommendPayload::from(&summarize);
        let generate = GeneratePayload::from(&recommend);
        assert_eq!(generate.project_id, summarize.project_id);
        assert_eq!(generate.template_id, summarize.template_id);
        assert_eq!(generate.image_id, summarize.image_id);
        assert_eq!(generate.user_id, summarize.user_id);
    }

    #[test]
    fn credit_payload_round_trips_signed_amounts() {
        let payload = CreditPayload {
            user_id: UserId::from("user_1"),
            amount: -25,
            reason: "Refund 42".to_string(),
            product_id: None,
            correlation_id: Some("refund:order:42".to_string()),
        };
        let json = serde_json::to_string(&payload).unwrap();
        let back: CreditPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
        assert_eq!(back.amount, -25);
    }
}
