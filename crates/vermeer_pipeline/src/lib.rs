//! The render pipeline: summarize, recommend, generate, and the credit
//! adjustments that pay for it.
//!
//! A render is a chain of three jobs. Summarize condenses the user's text
//! and caches the result, recommend picks art styles from the catalog, and
//! generate turns the summary into a prompt, charges one credit, renders
//! the image, and uploads the PNG plus a WebP thumbnail. Each stage
//! re-enqueues the next, so a crash anywhere resumes from the last cached
//! artifact instead of repeating paid work.
//!
//! [`Pipeline`] is the front door: it validates submissions, creates the
//! image record callers poll, and owns the collaborators the stage
//! handlers need. [`Pipeline::spawn_workers`] wires every handler into a
//! [`WorkerPool`](vermeer_queue::WorkerPool); deployments run the pool in
//! the worker process while the web tier only submits.
//!
//! Money moves in two places. The generate stage debits exactly one credit
//! before it spends provider money, keyed by a correlation id so a
//! redelivered job cannot double-charge. When the stage fails terminally
//! it enqueues a correlated refund through the credit queue. Order grants
//! and refunds flow through the same queue via [`Pipeline::grant_order`]
//! and [`Pipeline::refund_order`].

mod config;
mod credit;
mod generate;
mod payload;
mod prompt;
mod recommend;
mod service;
mod summarize;

pub use config::{
    IMAGE_MODEL, PROMPT_MODEL, PipelineConfig, PipelineConfigBuilder, RECOMMENDATION_MODEL,
    SUMMARY_MODEL,
};
pub use credit::CreditHandler;
pub use generate::GenerateHandler;
pub use payload::{CreditPayload, GeneratePayload, RecommendPayload, SummarizePayload};
pub use prompt::{
    PromptContext, content_hash, recommendation_prompt, render_prompt, summary_prompt,
};
pub use recommend::{RecommendHandler, parse_recommendations};
pub use service::{
    Pipeline, PipelineStatus, SubmitOutcome, SubmitRequest, SubmitRequestBuilder,
};
pub use summarize::SummarizeHandler;
