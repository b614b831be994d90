//! Core data types for the Vermeer image generation pipeline.
//!
//! This crate defines the domain vocabulary shared by every other crate in
//! the workspace: projects and the templates that render them, the image
//! lifecycle, the credit ledger records, and the provider-agnostic request
//! and response shapes for text completion and image generation.
//!
//! Nothing here performs I/O. Stores, providers, and the pipeline itself
//! live in their own crates and depend on this one.

mod art_style;
mod completion;
pub mod consts;
mod credit;
mod generation;
mod id;
mod image;
mod project;
mod role;
mod template;
mod token_usage;

pub use art_style::{ArtStyle, ArtStyleBuilder, Category};
pub use completion::{
    CompletionRequest, CompletionRequestBuilder, CompletionResponse, Message,
};
pub use consts::*;
pub use credit::{
    CreditTransaction, CreditTransactionBuilder, Plan, Product, ProductBuilder, Subscription,
    SubscriptionBuilder,
};
pub use generation::{
    GeneratedImage, ImageQuality, ImageRequest, ImageRequestBuilder, ImageSize, RenderStyle,
};
pub use id::{ArtStyleId, ImageId, ProductId, ProjectId, TemplateId, UserId};
pub use image::{Image, ImageBuilder, ImageState, ImageStatus};
pub use project::{IntendedUse, Project, ProjectBuilder, ProjectStatus};
pub use role::Role;
pub use template::{AspectRatio, DETAIL_MAX, DETAIL_MIN, Template, TemplateBuilder};
pub use token_usage::TokenUsage;
