// Per-request telemetry tag set
// Author: kelexine (https://github.com/kelexine)

use crate::gemini::TokenUsage;
use tracing::Span;

/// Region tag for user ids containing "sg".
pub const REGION_SOUTHEAST_ASIA: &str = "SouthEast Asia";

/// Region tag for every other user id.
pub const REGION_NORTH_AMERICA: &str = "North America";

/// Telemetry-only region guess from the user identifier.
///
/// Never used for routing or authorization.
pub fn user_region(user_id: &str) -> &'static str {
    if user_id.to_lowercase().contains("sg") {
        REGION_SOUTHEAST_ASIA
    } else {
        REGION_NORTH_AMERICA
    }
}

/// Tags accumulated while a chat request moves through the pipeline.
///
/// Applied to the `chat_request` span once, at the terminal state. Field names
/// are stable and match the span fields declared by the pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestTags {
    pub user_id: String,
    pub user_region: &'static str,
    pub prompt_length: usize,
    pub jailbreak_attempt: bool,
    pub cache_hit: Option<bool>,
    pub cache_stored: Option<bool>,
    pub response_length: Option<usize>,
    pub tokens: Option<TokenUsage>,
    pub error: bool,
    pub error_type: Option<&'static str>,
    pub error_message: Option<String>,
}

impl RequestTags {
    pub fn new(user_id: &str, prompt: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            user_region: user_region(user_id),
            prompt_length: prompt.chars().count(),
            ..Self::default()
        }
    }

    pub(crate) fn mark_error(&mut self, error_type: Option<&'static str>, message: impl Into<String>) {
        self.error = true;
        self.error_type = error_type;
        self.error_message = Some(message.into());
    }

    /// Record every set tag on `span`.
    pub fn apply(&self, span: &Span) {
        span.record("user.id", self.user_id.as_str());
        span.record("user.region", self.user_region);
        span.record("prompt.length", self.prompt_length as u64);

        if self.jailbreak_attempt {
            span.record("security.jailbreak_attempt", true);
        }
        if let Some(hit) = self.cache_hit {
            span.record("cache.hit", hit);
        }
        if let Some(stored) = self.cache_stored {
            span.record("cache.stored", stored);
        }
        if let Some(length) = self.response_length {
            span.record("response.length", length as u64);
        }
        if let Some(tokens) = self.tokens {
            span.record("llm.tokens.input", u64::from(tokens.input));
            span.record("llm.tokens.output", u64::from(tokens.output));
            span.record("llm.tokens.total", u64::from(tokens.total));
        }
        if self.error {
            span.record("error", true);
        }
        if let Some(error_type) = self.error_type {
            span.record("error.type", error_type);
        }
        if let Some(message) = &self.error_message {
            span.record("error.message", message.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_region() {
        assert_eq!(user_region("user_sg_42"), REGION_SOUTHEAST_ASIA);
        assert_eq!(user_region("SG-ops"), REGION_SOUTHEAST_ASIA);
        assert_eq!(user_region("test_user_123"), REGION_NORTH_AMERICA);
    }

    #[test]
    fn test_new_tags() {
        let tags = RequestTags::new("user_sg", "héllo");
        assert_eq!(tags.prompt_length, 5);
        assert_eq!(tags.user_region, REGION_SOUTHEAST_ASIA);
        assert!(!tags.error);
        assert!(tags.cache_hit.is_none());
    }

    #[test]
    fn test_apply_without_subscriber_is_noop() {
        let mut tags = RequestTags::new("u", "p");
        tags.mark_error(Some("rate_limit"), "quota");
        tags.apply(&Span::none());
        assert_eq!(tags.error_type, Some("rate_limit"));
    }
}
