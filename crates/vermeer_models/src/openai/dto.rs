//! Wire types matching the OpenAI REST API.
//!
//! Field names and optionality follow the API documentation; anything the
//! API treats as optional is an `Option` here so unexpected omissions
//! never fail deserialization.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageDto {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessageDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessageDto,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct UsageDto {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatCompletionResponse {
    pub model: String,
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<UsageDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageGenerationRequest {
    pub model: String,
    pub prompt: String,
    pub n: u32,
    pub quality: String,
    pub response_format: String,
    pub size: String,
    pub style: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageDatum {
    #[serde(default)]
    pub b64_json: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub revised_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageGenerationResponse {
    pub data: Vec<ImageDatum>,
}

/// Error envelope the API returns on non-2xx responses.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_request_omits_unset_options() {
        let request = ChatCompletionRequest {
            model: "gpt-3.5-turbo-0125".to_string(),
            messages: vec![ChatMessageDto {
                role: "user".to_string(),
                content: "hi".to_string(),
            }],
            temperature: None,
            max_tokens: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "model": "gpt-3.5-turbo-0125",
                "messages": [{"role": "user", "content": "hi"}],
            })
        );
    }

    #[test]
    fn chat_response_parses_without_usage() {
        let raw = json!({
            "model": "gpt-3.5-turbo-0125",
            "choices": [
                {"message": {"role": "assistant", "content": "hello"}, "finish_reason": "stop"}
            ]
        });
        let response: ChatCompletionResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(response.choices[0].message.content, "hello");
        assert!(response.usage.is_none());
    }

    #[test]
    fn image_response_parses_b64_payload() {
        let raw = json!({
            "created": 1713833628,
            "data": [
                {"b64_json": "aGVsbG8=", "revised_prompt": "a calm harbor"}
            ]
        });
        let response: ImageGenerationResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(response.data[0].b64_json.as_deref(), Some("aGVsbG8="));
        assert_eq!(
            response.data[0].revised_prompt.as_deref(),
            Some("a calm harbor")
        );
    }

    #[test]
    fn api_error_envelope_parses() {
        let raw = json!({
            "error": {
                "message": "Rate limit reached",
                "type": "requests",
                "code": "rate_limit_exceeded"
            }
        });
        let response: ApiErrorResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(response.error.message, "Rate limit reached");
    }
}
