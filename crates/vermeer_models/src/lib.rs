//! Model provider clients.
//!
//! Currently one provider family lives here: [`openai`], speaking the
//! OpenAI REST API for both chat completions and image generation. The
//! clients implement the traits from `vermeer_interface`, so the pipeline
//! never sees provider specifics.
//!
//! Tests that hit live APIs are gated behind the `api` feature and expect
//! credentials in the environment.

pub mod openai;

pub use openai::{OpenAiClient, OpenAiConfig};
