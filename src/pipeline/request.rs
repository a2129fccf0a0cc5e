// Inbound chat request and its limits
// Author: kelexine (https://github.com/kelexine)

use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};

/// Longest accepted prompt, in characters.
pub const MAX_PROMPT_CHARS: usize = 10_000;

/// Longest accepted user identifier, in characters.
pub const MAX_USER_ID_CHARS: usize = 255;

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    pub user_id: String,
}

/// Body returned by `POST /chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            user_id: user_id.into(),
        }
    }

    /// Check length limits on both fields.
    pub fn validate(&self) -> Result<()> {
        check_field("prompt", &self.prompt, MAX_PROMPT_CHARS)?;
        check_field("user_id", &self.user_id, MAX_USER_ID_CHARS)
    }
}

fn check_field(name: &str, value: &str, max_chars: usize) -> Result<()> {
    if value.is_empty() {
        return Err(RelayError::InvalidRequest(format!("{} must not be empty", name)));
    }
    let len = value.chars().count();
    if len > max_chars {
        return Err(RelayError::InvalidRequest(format!(
            "{} is {} characters, limit is {}",
            name, len, max_chars
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_request() {
        assert!(ChatRequest::new("Hello", "user_1").validate().is_ok());
    }

    #[test]
    fn test_empty_fields_rejected() {
        assert!(ChatRequest::new("", "user_1").validate().is_err());
        assert!(ChatRequest::new("Hello", "").validate().is_err());
    }

    #[test]
    fn test_length_limits_are_inclusive() {
        let prompt = "a".repeat(MAX_PROMPT_CHARS);
        let user_id = "u".repeat(MAX_USER_ID_CHARS);
        assert!(ChatRequest::new(prompt.clone(), user_id.clone()).validate().is_ok());

        let long_prompt = format!("{}a", prompt);
        assert!(matches!(
            ChatRequest::new(long_prompt, "u").validate(),
            Err(RelayError::InvalidRequest(_))
        ));

        let long_user = format!("{}u", user_id);
        assert!(ChatRequest::new("Hello", long_user).validate().is_err());
    }

    #[test]
    fn test_limits_count_characters_not_bytes() {
        // 10,000 multi-byte characters is still within the limit
        let prompt = "é".repeat(MAX_PROMPT_CHARS);
        assert!(ChatRequest::new(prompt, "u").validate().is_ok());
    }
}
