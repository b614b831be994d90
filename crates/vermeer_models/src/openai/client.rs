use super::config::OpenAiConfig;
use super::conversions::completion_from_response;
use super::dto::{
    ApiErrorResponse, ChatCompletionRequest, ChatCompletionResponse, ImageGenerationRequest,
    ImageGenerationResponse,
};
use base64::Engine;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use vermeer_core::{CompletionRequest, CompletionResponse, GeneratedImage, ImageRequest};
use vermeer_error::{ProviderError, ProviderErrorKind, ProviderResult, VermeerResult};
use vermeer_interface::{ImageGeneration, TextCompletion};

/// Image generation regularly takes tens of seconds, so the timeout is
/// generous.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Client for the OpenAI chat completion and image generation endpoints.
///
/// One client serves both [`TextCompletion`] and [`ImageGeneration`]; it
/// holds a connection pool and is cheap to clone.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> ProviderResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::new(ProviderErrorKind::Builder(e.to_string())))?;
        Ok(Self { http, config })
    }

    /// Builds a client from `OPENAI_API_KEY` and friends.
    pub fn from_env() -> VermeerResult<Self> {
        let config = OpenAiConfig::from_env()?;
        Ok(Self::new(config)?)
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> ProviderResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.config.base_url(), path);
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.config.api_key())
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::new(ProviderErrorKind::Http(e.to_string())))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<R>()
                .await
                .map_err(|e| ProviderError::new(ProviderErrorKind::ResponseParsing(e.to_string())))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ProviderError::new(map_api_error(status.as_u16(), &body)))
        }
    }
}

/// Maps a non-2xx response to a provider error kind, pulling the message
/// out of the API's error envelope when the body carries one.
fn map_api_error(status: u16, body: &str) -> ProviderErrorKind {
    let message = serde_json::from_str::<ApiErrorResponse>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| {
            let trimmed = body.trim();
            trimmed.chars().take(300).collect()
        });
    match status {
        429 => ProviderErrorKind::RateLimit,
        400 => ProviderErrorKind::InvalidRequest(message),
        404 if message.contains("model") => ProviderErrorKind::ModelNotFound(message),
        _ => ProviderErrorKind::Api { status, message },
    }
}

#[async_trait::async_trait]
impl TextCompletion for OpenAiClient {
    #[tracing::instrument(skip(self, request), fields(model = %request.model()))]
    async fn complete(&self, request: CompletionRequest) -> ProviderResult<CompletionResponse> {
        let dto = ChatCompletionRequest::from(&request);
        let response: ChatCompletionResponse = self.post_json("/chat/completions", &dto).await?;
        let completion = completion_from_response(response)?;
        tracing::debug!(
            tokens = completion
                .usage()
                .as_ref()
                .map(|usage| *usage.total_tokens()),
            "completion finished"
        );
        Ok(completion)
    }
}

#[async_trait::async_trait]
impl ImageGeneration for OpenAiClient {
    #[tracing::instrument(
        skip(self, request),
        fields(model = %request.model(), size = request.size().as_str())
    )]
    async fn generate(&self, request: ImageRequest) -> ProviderResult<GeneratedImage> {
        let dto = ImageGenerationRequest::from(&request);
        let response: ImageGenerationResponse =
            self.post_json("/images/generations", &dto).await?;
        let datum = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::new(ProviderErrorKind::NoContent))?;
        let b64 = datum
            .b64_json
            .ok_or_else(|| ProviderError::new(ProviderErrorKind::NoContent))?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(b64.as_bytes())
            .map_err(|e| {
                ProviderError::new(ProviderErrorKind::ResponseParsing(format!(
                    "invalid base64 image payload: {e}"
                )))
            })?;
        tracing::debug!(
            bytes = bytes.len(),
            revised = datum.revised_prompt.is_some(),
            "decoded generated image"
        );
        Ok(GeneratedImage::new(bytes, datum.revised_prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_status_maps_to_retryable_kind() {
        let kind = map_api_error(429, r#"{"error":{"message":"Rate limit reached"}}"#);
        assert_eq!(kind, ProviderErrorKind::RateLimit);
        assert!(kind.is_retryable());
    }

    #[test]
    fn bad_request_maps_to_invalid_request() {
        let kind = map_api_error(
            400,
            r#"{"error":{"message":"Your prompt was rejected","type":"invalid_request_error"}}"#,
        );
        assert_eq!(
            kind,
            ProviderErrorKind::InvalidRequest("Your prompt was rejected".to_string())
        );
        assert!(!kind.is_retryable());
    }

    #[test]
    fn unknown_model_maps_to_model_not_found() {
        let kind = map_api_error(
            404,
            r#"{"error":{"message":"The model `dall-e-9` does not exist"}}"#,
        );
        assert!(matches!(kind, ProviderErrorKind::ModelNotFound(_)));
    }

    #[test]
    fn server_errors_keep_status_and_stay_retryable() {
        let kind = map_api_error(503, "upstream unavailable");
        assert_eq!(
            kind,
            ProviderErrorKind::Api {
                status: 503,
                message: "upstream unavailable".to_string()
            }
        );
        assert!(kind.is_retryable());
    }

    #[test]
    fn unparseable_error_body_is_truncated() {
        let body = "x".repeat(1000);
        match map_api_error(500, &body) {
            ProviderErrorKind::Api { message, .. } => assert_eq!(message.len(), 300),
            other => panic!("unexpected kind: {other:?}"),
        }
    }
}

// Live tests against the real API. Run with:
//   cargo test -p vermeer_models --features api -- --nocapture
#[cfg(all(test, feature = "api"))]
mod live_tests {
    use super::*;
    use vermeer_core::{CompletionRequestBuilder, ImageQuality, ImageRequestBuilder, Message};

    #[tokio::test]
    async fn completes_against_live_api() {
        let client = OpenAiClient::from_env().unwrap();
        let request = CompletionRequestBuilder::default()
            .model("gpt-3.5-turbo-0125")
            .messages(vec![
                Message::system("Answer with a single word."),
                Message::user("What color is the sky on a clear day?"),
            ])
            .build()
            .unwrap();
        let response = client.complete(request).await.unwrap();
        assert!(!response.content().is_empty());
        assert!(response.usage().is_some());
    }

    #[tokio::test]
    async fn generates_image_against_live_api() {
        let client = OpenAiClient::from_env().unwrap();
        let request = ImageRequestBuilder::default()
            .model("dall-e-3")
            .prompt("A single red apple on a white table, studio lighting")
            .quality(ImageQuality::Standard)
            .build()
            .unwrap();
        let image = client.generate(request).await.unwrap();
        assert!(!image.bytes().is_empty());
    }
}
