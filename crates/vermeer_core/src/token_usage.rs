use serde::{Deserialize, Serialize};

/// Token accounting reported by a completion provider.
///
/// Captured on every summary and recommendation call so that per-project
/// model spend can be audited after the fact.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_new::new,
)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt.
    prompt_tokens: u32,
    /// Tokens produced in the response.
    completion_tokens: u32,
    /// Prompt and completion tokens combined.
    total_tokens: u32,
}

impl TokenUsage {
    /// Sums two usage reports, e.g. across the stages of one pipeline run.
    pub fn accumulate(&self, other: &TokenUsage) -> TokenUsage {
        TokenUsage::new(
            self.prompt_tokens + other.prompt_tokens,
            self.completion_tokens + other.completion_tokens,
            self.total_tokens + other.total_tokens,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulate_sums_fields() {
        let a = TokenUsage::new(10, 5, 15);
        let b = TokenUsage::new(3, 2, 5);
        let sum = a.accumulate(&b);
        assert_eq!(*sum.prompt_tokens(), 13);
        assert_eq!(*sum.completion_tokens(), 7);
        assert_eq!(*sum.total_tokens(), 20);
    }
}
