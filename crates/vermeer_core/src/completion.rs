use crate::{Role, TokenUsage};
use serde::{Deserialize, Serialize};

/// One turn of a chat completion conversation.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters, derive_new::new,
)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content.into())
    }
}

/// A provider-agnostic chat completion request.
///
/// ## Examples
///
/// ```
/// use vermeer_core::{CompletionRequestBuilder, Message};
///
/// let request = CompletionRequestBuilder::default()
///     .model("gpt-3.5-turbo-0125")
///     .messages(vec![
///         Message::system("You are a concise copywriter."),
///         Message::user("Describe a lighthouse in one sentence."),
///     ])
///     .build()
///     .unwrap();
/// assert_eq!(request.model(), "gpt-3.5-turbo-0125");
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct CompletionRequest {
    /// Provider model identifier.
    model: String,
    /// Conversation so far, oldest first.
    messages: Vec<Message>,
    /// Sampling temperature, provider default when unset.
    #[builder(default)]
    temperature: Option<f32>,
    /// Upper bound on generated tokens, provider default when unset.
    #[builder(default)]
    max_tokens: Option<u32>,
}

/// The text and accounting that came back from a completion call.
#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters, derive_new::new,
)]
pub struct CompletionResponse {
    /// Generated text with surrounding whitespace trimmed by the provider
    /// client.
    content: String,
    /// Model that actually served the request.
    model: String,
    /// Token accounting, when the provider reported it.
    usage: Option<TokenUsage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors_set_roles() {
        assert_eq!(*Message::system("s").role(), Role::System);
        assert_eq!(*Message::user("u").role(), Role::User);
        assert_eq!(*Message::assistant("a").role(), Role::Assistant);
    }

    #[test]
    fn request_builder_requires_model() {
        let missing = CompletionRequestBuilder::default()
            .messages(vec![Message::user("hello")])
            .build();
        assert!(missing.is_err());
    }
}
