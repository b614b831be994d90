//! OpenAI API client.
//!
//! Wire types in [`dto`] mirror the REST API exactly; [`conversions`]
//! translates between them and the provider-agnostic core types. The
//! [`client`] module owns HTTP and error mapping.

mod client;
mod config;
mod conversions;
mod dto;

pub use client::OpenAiClient;
pub use config::OpenAiConfig;
