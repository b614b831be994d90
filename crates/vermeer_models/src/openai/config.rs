use vermeer_error::{ConfigError, ConfigResult};

/// Default API endpoint.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Connection settings for the OpenAI API.
///
/// ## Examples
///
/// ```
/// use vermeer_models::OpenAiConfig;
///
/// let config = OpenAiConfig::new("sk-test")
///     .with_base_url("http://localhost:8080/v1");
/// assert_eq!(config.base_url(), "http://localhost:8080/v1");
/// ```
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    api_key: String,
    base_url: String,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
        }
    }

    /// Reads `OPENAI_API_KEY` (required) and `OPENAI_BASE_URL` (optional)
    /// from the environment.
    #[track_caller]
    pub fn from_env() -> ConfigResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::new("OPENAI_API_KEY not set in environment"))?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }

    /// Points the client at a different endpoint, e.g. a proxy or a test
    /// server. A trailing slash is trimmed.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
