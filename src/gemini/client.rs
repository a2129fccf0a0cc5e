// Gemini API client
// Author: kelexine (https://github.com/kelexine)

use super::models::{ErrorResponse, GenerateContentRequest, GenerateContentResponse};
use super::{Completion, CompletionBackend, CompletionError, TokenUsage};
use crate::config::GeminiConfig;
use crate::error::{RelayError, Result};
use crate::utils::logging::sanitize;
use crate::utils::retry::parse_retry_delay;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Client for the Gemini `generateContent` API.
///
/// Every call is bounded by `gemini.timeout_seconds`. Rate-limit responses
/// (HTTP 429 or `RESOURCE_EXHAUSTED`) are reported as
/// [`CompletionError::QuotaExhausted`]; everything else is a generic failure.
pub struct GeminiClient {
    http_client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a new Gemini client.
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .use_rustls_tls()
            .build()
            .map_err(|e| RelayError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        debug!("Created HTTP client for {}", config.api_base_url);

        Ok(Self {
            http_client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Map a non-success response to a completion error.
    fn classify_failure(status: StatusCode, body: &str) -> CompletionError {
        let detail = serde_json::from_str::<ErrorResponse>(body)
            .ok()
            .and_then(|r| r.error);
        let upstream_status = detail.as_ref().and_then(|d| d.status.clone());
        let message = detail
            .and_then(|d| d.message)
            .unwrap_or_else(|| body.to_string());

        if status == StatusCode::TOO_MANY_REQUESTS
            || upstream_status.as_deref() == Some("RESOURCE_EXHAUSTED")
        {
            CompletionError::QuotaExhausted {
                message: sanitize(&message),
                retry_after: parse_retry_delay(body),
            }
        } else {
            CompletionError::Generation(format!("HTTP {}: {}", status, sanitize(&message)))
        }
    }
}

#[async_trait]
impl CompletionBackend for GeminiClient {
    async fn generate(&self, prompt: &str) -> std::result::Result<Completion, CompletionError> {
        debug!("Calling generateContent API for model: {}", self.model);
        let start = Instant::now();

        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                let reason = if e.is_timeout() { "timeout" } else { "network" };
                crate::metrics::record_llm_call(&self.model, reason, start.elapsed().as_secs_f64());
                error!("Gemini request failed: {}", sanitize(&e.to_string()));
                return Err(CompletionError::Generation(format!("HTTP error: {}", e.without_url())));
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        crate::metrics::record_llm_call(
            &self.model,
            status.as_str(),
            start.elapsed().as_secs_f64(),
        );

        if !status.is_success() {
            let failure = Self::classify_failure(status, &body);
            match &failure {
                CompletionError::QuotaExhausted { .. } => {
                    warn!("Gemini quota exhausted (HTTP {})", status)
                }
                CompletionError::Generation(_) => {
                    error!("Gemini API error: HTTP {} - {}", status, sanitize(&body))
                }
            }
            return Err(failure);
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            CompletionError::Generation(format!("Response parsing error: {}", e))
        })?;

        let text = parsed.text().ok_or_else(|| {
            let reason = parsed
                .candidates
                .first()
                .and_then(|c| c.finish_reason.clone())
                .unwrap_or_else(|| "no candidates".to_string());
            CompletionError::Generation(format!("Response contained no text ({})", reason))
        })?;

        let usage = parsed
            .usage_metadata
            .as_ref()
            .map(TokenUsage::from)
            .unwrap_or_default();

        debug!("Successfully received Gemini response ({} chars)", text.len());
        Ok(Completion { text, usage })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rate_limit_status() {
        let body = r#"{"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED",
            "details": [{"@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": "40s"}]}}"#;

        match GeminiClient::classify_failure(StatusCode::TOO_MANY_REQUESTS, body) {
            CompletionError::QuotaExhausted {
                message,
                retry_after,
            } => {
                assert_eq!(message, "Quota exceeded");
                assert_eq!(retry_after, Some(Duration::from_secs(40)));
            }
            other => panic!("expected quota exhaustion, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_resource_exhausted_without_429() {
        let body = r#"{"error": {"code": 403, "message": "Out of credits", "status": "RESOURCE_EXHAUSTED"}}"#;
        assert!(matches!(
            GeminiClient::classify_failure(StatusCode::FORBIDDEN, body),
            CompletionError::QuotaExhausted { retry_after: None, .. }
        ));
    }

    #[test]
    fn test_classify_other_failures() {
        let body = r#"{"error": {"code": 500, "message": "Internal", "status": "INTERNAL"}}"#;
        assert!(matches!(
            GeminiClient::classify_failure(StatusCode::INTERNAL_SERVER_ERROR, body),
            CompletionError::Generation(_)
        ));

        assert!(matches!(
            GeminiClient::classify_failure(StatusCode::BAD_GATEWAY, "upstream connect error"),
            CompletionError::Generation(_)
        ));
    }

    #[test]
    fn test_endpoint() {
        let config = GeminiConfig {
            api_key: "key".to_string(),
            api_base_url: "http://localhost:1234/v1beta/".to_string(),
            ..GeminiConfig::default()
        };
        let client = GeminiClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:1234/v1beta/models/gemini-flash-latest:generateContent"
        );
        assert_eq!(client.model(), "gemini-flash-latest");
    }
}
