//! Shared constants for the pipeline and ledger.

use std::time::Duration;

/// Credits charged for each generated image.
pub const CREDIT_COST_PER_IMAGE: i64 = 1;

/// Credits granted to a newly registered account.
pub const TRIAL_CREDITS: i64 = 3;

/// How long cached summaries and recommendations stay valid.
pub const CACHE_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 30);

/// Queue that produces project text summaries.
pub const SUMMARY_QUEUE: &str = "generate_text_summary";

/// Queue that produces art style, mood, and keyword recommendations.
pub const RECOMMEND_QUEUE: &str = "generate_recommendations";

/// Queue that renders, stores, and bills images.
pub const IMAGE_QUEUE: &str = "generate_image";

/// Queue that applies credit grants and refunds to the ledger.
pub const CREDIT_QUEUE: &str = "update_credit_balance";
