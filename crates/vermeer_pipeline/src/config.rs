//! Tunables for the pipeline service.

use std::time::Duration;
use vermeer_queue::RetryPolicy;

/// Model that writes project summaries.
pub const SUMMARY_MODEL: &str = "gpt-3.5-turbo-0125";
/// Model that picks art style recommendations.
pub const RECOMMENDATION_MODEL: &str = "gpt-3.5-turbo-1106";
/// Model that writes the final image prompt.
pub const PROMPT_MODEL: &str = "gpt-4-0125-preview";
/// Model that renders the image.
pub const IMAGE_MODEL: &str = "dall-e-3";

/// Models and worker tunables for one pipeline instance.
///
/// ## Examples
///
/// ```
/// use vermeer_pipeline::PipelineConfigBuilder;
///
/// let config = PipelineConfigBuilder::default()
///     .concurrency(4usize)
///     .build()
///     .unwrap();
/// assert_eq!(config.summary_model(), "gpt-3.5-turbo-0125");
/// assert_eq!(*config.concurrency(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, derive_getters::Getters, derive_builder::Builder)]
#[builder(setter(into), default)]
pub struct PipelineConfig {
    summary_model: String,
    recommendation_model: String,
    prompt_model: String,
    image_model: String,
    /// Retry schedule stamped onto enqueued jobs and honored by workers.
    retry: RetryPolicy,
    /// Workers spawned per queue.
    concurrency: usize,
    /// Idle sleep between empty claim attempts.
    poll_interval: Duration,
    /// Lease a worker holds on a claimed job.
    lease: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            summary_model: SUMMARY_MODEL.to_string(),
            recommendation_model: RECOMMENDATION_MODEL.to_string(),
            prompt_model: PROMPT_MODEL.to_string(),
            image_model: IMAGE_MODEL.to_string(),
            retry: RetryPolicy::default(),
            concurrency: 2,
            poll_interval: Duration::from_millis(100),
            lease: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pin_the_production_models() {
        let config = PipelineConfig::default();
        assert_eq!(config.summary_model(), SUMMARY_MODEL);
        assert_eq!(config.recommendation_model(), RECOMMENDATION_MODEL);
        assert_eq!(config.prompt_model(), PROMPT_MODEL);
        assert_eq!(config.image_model(), IMAGE_MODEL);
        assert_eq!(*config.retry().max_attempts(), 3);
    }

    #[test]
    fn builder_overrides_only_what_is_set() {
        let config = PipelineConfigBuilder::default()
            .image_model("dall-e-2")
            .lease(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(config.image_model(), "dall-e-2");
        assert_eq!(*config.lease(), Duration::from_secs(5));
        assert_eq!(config.prompt_model(), PROMPT_MODEL);
    }
}
