use vermeer_core::{CompletionRequest, CompletionResponse, GeneratedImage, ImageRequest};
use vermeer_error::ProviderResult;

/// A provider that can run chat completions.
///
/// Implementations are expected to be cheap to clone behind an `Arc` and
/// safe to call concurrently from multiple workers.
#[async_trait::async_trait]
pub trait TextCompletion: Send + Sync {
    /// Runs one completion and returns the generated text with token
    /// accounting when the provider reports it.
    async fn complete(&self, request: CompletionRequest) -> ProviderResult<CompletionResponse>;
}

/// A provider that can render images from text prompts.
#[async_trait::async_trait]
pub trait ImageGeneration: Send + Sync {
    /// Renders one image and returns its decoded bytes along with any
    /// prompt revision the provider applied.
    async fn generate(&self, request: ImageRequest) -> ProviderResult<GeneratedImage>;
}
