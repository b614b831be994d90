//! Service traits implemented by Vermeer model providers.
//!
//! The pipeline is written against these traits rather than any concrete
//! provider, so production wiring and tests differ only in which
//! implementations get injected.

mod error_sink;
mod generation;

pub use error_sink::{ErrorSink, TracingErrorSink};
pub use generation::{ImageGeneration, TextCompletion};
