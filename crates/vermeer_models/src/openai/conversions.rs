//! Translation between core types and OpenAI wire types.

use super::dto::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessageDto, ImageGenerationRequest,
    UsageDto,
};
use vermeer_core::{
    CompletionRequest, CompletionResponse, ImageRequest, Message, TokenUsage,
};
use vermeer_error::{ProviderError, ProviderErrorKind, ProviderResult};

impl From<&Message> for ChatMessageDto {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role().to_string(),
            content: message.content().clone(),
        }
    }
}

impl From<&CompletionRequest> for ChatCompletionRequest {
    fn from(request: &CompletionRequest) -> Self {
        Self {
            model: request.model().clone(),
            messages: request.messages().iter().map(ChatMessageDto::from).collect(),
            temperature: *request.temperature(),
            max_tokens: *request.max_tokens(),
        }
    }
}

impl From<UsageDto> for TokenUsage {
    fn from(usage: UsageDto) -> Self {
        TokenUsage::new(
            usage.prompt_tokens,
            usage.completion_tokens,
            usage.total_tokens,
        )
    }
}

impl From<&ImageRequest> for ImageGenerationRequest {
    fn from(request: &ImageRequest) -> Self {
        Self {
            model: request.model().clone(),
            prompt: request.prompt().clone(),
            n: 1,
            quality: request.quality().as_str().to_string(),
            response_format: "b64_json".to_string(),
            size: request.size().as_str().to_string(),
            style: request.style().as_str().to_string(),
            user: request.user().clone(),
        }
    }
}

/// Pulls the first choice's text out of a chat response.
#[track_caller]
pub(super) fn completion_from_response(
    response: ChatCompletionResponse,
) -> ProviderResult<CompletionResponse> {
    let usage = response.usage.map(TokenUsage::from);
    let content = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| ProviderError::new(ProviderErrorKind::NoContent))?;
    Ok(CompletionResponse::new(
        content.trim().to_string(),
        response.model,
        usage,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai::dto::ChatChoice;
    use vermeer_core::{
        AspectRatio, CompletionRequestBuilder, ImageQuality, ImageRequestBuilder, ImageSize,
        RenderStyle,
    };

    #[test]
    fn completion_request_maps_roles_and_options() {
        let request = CompletionRequestBuilder::default()
            .model("gpt-4-0125-preview")
            .messages(vec![Message::system("be brief"), Message::user("hi")])
            .temperature(Some(0.2f32))
            .build()
            .unwrap();
        let dto = ChatCompletionRequest::from(&request);
        assert_eq!(dto.model, "gpt-4-0125-preview");
        assert_eq!(dto.messages[0].role, "system");
        assert_eq!(dto.messages[1].role, "user");
        assert_eq!(dto.temperature, Some(0.2));
        assert_eq!(dto.max_tokens, None);
    }

    #[test]
    fn image_request_maps_enums_to_wire_strings() {
        let request = ImageRequestBuilder::default()
            .model("dall-e-3")
            .prompt("a calm harbor")
            .size(ImageSize::from(AspectRatio::Landscape))
            .style(RenderStyle::Natural)
            .quality(ImageQuality::Hd)
            .user(Some("user_1".to_string()))
            .build()
            .unwrap();
        let dto = ImageGenerationRequest::from(&request);
        assert_eq!(dto.size, "1792x1024");
        assert_eq!(dto.style, "natural");
        assert_eq!(dto.quality, "hd");
        assert_eq!(dto.response_format, "b64_json");
        assert_eq!(dto.n, 1);
        assert_eq!(dto.user.as_deref(), Some("user_1"));
    }

    #[test]
    fn empty_choices_map_to_no_content() {
        let response = ChatCompletionResponse {
            model: "gpt-3.5-turbo-0125".to_string(),
            choices: vec![],
            usage: None,
        };
        let err = completion_from_response(response).unwrap_err();
        assert!(err.to_string().contains("no content"));
    }

    #[test]
    fn response_content_is_trimmed() {
        let response = ChatCompletionResponse {
            model: "gpt-3.5-turbo-0125".to_string(),
            choices: vec![ChatChoice {
                message: ChatMessageDto {
                    role: "assistant".to_string(),
                    content: "  a summary  \n".to_string(),
                },
                finish_reason: Some("stop".to_string()),
            }],
            usage: Some(UsageDto {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
        };
        let completion = completion_from_response(response).unwrap();
        assert_eq!(completion.content(), "a summary");
        assert_eq!(*completion.usage().unwrap().total_tokens(), 15);
    }
}
