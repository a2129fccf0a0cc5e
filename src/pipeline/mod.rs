//! The chat request pipeline.
//!
//! Every inbound prompt moves through a fixed sequence of states:
//!
//! 1. **Record input**: the user turn is appended to history.
//! 2. **Screen**: a keyword hit returns the fixed refusal.
//! 3. **Cache lookup**: a hit returns the stored response.
//! 4. **Generate**: the completion backend is called; a success is cached
//!    (best-effort) and returned, a failure is recorded and surfaced.
//!
//! Each terminal state writes exactly one assistant turn and applies the
//! request's telemetry tags once.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod request;
mod telemetry;

pub use request::{ChatRequest, ChatResponse, MAX_PROMPT_CHARS, MAX_USER_ID_CHARS};
pub use telemetry::{user_region, RequestTags, REGION_NORTH_AMERICA, REGION_SOUTHEAST_ASIA};

use crate::cache::CacheManager;
use crate::config::AppConfig;
use crate::error::{RelayError, Result, RATE_LIMIT_MESSAGE};
use crate::gemini::{CompletionBackend, CompletionError};
use crate::history::{ChatTurn, HistoryBuffer};
use crate::safety::{SafetyFilter, REFUSAL_MESSAGE};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, field, info_span, warn, Instrument, Span};

/// History text recorded when generation fails for a reason other than quota.
pub const GENERATION_ERROR_MESSAGE: &str = "An error occurred while processing your request.";

/// Which terminal state produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    /// Refused by the safety filter.
    Blocked,
    /// Served from the response cache.
    Cached,
    /// Freshly generated by the backend.
    Generated,
}

impl ReplySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplySource::Blocked => "blocked",
            ReplySource::Cached => "cached",
            ReplySource::Generated => "generated",
        }
    }
}

/// A successful pipeline result.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub text: String,
    pub source: ReplySource,
}

/// Composes screening, caching, generation and history for each request.
pub struct ChatPipeline {
    filter: SafetyFilter,
    cache: Arc<CacheManager>,
    history: Arc<HistoryBuffer>,
    backend: Arc<dyn CompletionBackend>,
}

impl ChatPipeline {
    pub fn new(
        filter: SafetyFilter,
        cache: Arc<CacheManager>,
        history: Arc<HistoryBuffer>,
        backend: Arc<dyn CompletionBackend>,
    ) -> Self {
        Self {
            filter,
            cache,
            history,
            backend,
        }
    }

    /// Assemble a pipeline from configuration around `backend`.
    ///
    /// The cache store is created but not connected.
    pub fn from_config(config: &AppConfig, backend: Arc<dyn CompletionBackend>) -> Result<Self> {
        let cache = crate::cache::build_manager(&config.cache)
            .map_err(|e| RelayError::Config(format!("Cache store: {}", e)))?;

        Ok(Self::new(
            SafetyFilter::new(&config.safety.jailbreak_keywords),
            Arc::new(cache),
            Arc::new(HistoryBuffer::new(config.history.capacity)),
            backend,
        ))
    }

    pub fn history(&self) -> &Arc<HistoryBuffer> {
        &self.history
    }

    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    /// Handle one chat request and return the reply text.
    ///
    /// Safety refusals are successful replies. Quota exhaustion surfaces as
    /// [`RelayError::RateLimited`]; any other upstream failure as
    /// [`RelayError::Generation`].
    pub async fn submit(&self, prompt: &str, user_id: &str) -> Result<ChatReply> {
        self.run(prompt, user_id).await.0
    }

    /// Like [`submit`](Self::submit), also returning the telemetry tags that
    /// were applied to the request span.
    pub async fn run(&self, prompt: &str, user_id: &str) -> (Result<ChatReply>, RequestTags) {
        let span = request_span();
        let start = Instant::now();
        let mut tags = RequestTags::new(user_id, prompt);

        let result = async {
            match ChatRequest::new(prompt, user_id).validate() {
                Ok(()) => self.execute(prompt, user_id, &mut tags).await,
                Err(e) => {
                    tags.mark_error(Some("invalid_request"), e.to_string());
                    Err(e)
                }
            }
        }
        .instrument(span.clone())
        .await;

        tags.apply(&span);

        let outcome = match &result {
            Ok(reply) => reply.source.as_str(),
            Err(RelayError::RateLimited { .. }) => "rate_limited",
            Err(RelayError::InvalidRequest(_)) => "invalid",
            Err(_) => "failed",
        };
        crate::metrics::record_chat_request(outcome, start.elapsed().as_secs_f64());

        (result, tags)
    }

    async fn execute(&self, prompt: &str, user_id: &str, tags: &mut RequestTags) -> Result<ChatReply> {
        // Record input
        self.history
            .record(ChatTurn::user(prompt, user_id, tags.user_region));

        // Screen
        if self.filter.is_violation(prompt) {
            tags.jailbreak_attempt = true;
            tags.mark_error(None, "Jailbreak keyword detected");
            crate::metrics::record_jailbreak_attempt();
            warn!("Security violation: user_id={}", user_id);

            self.history.record(ChatTurn::blocked(REFUSAL_MESSAGE, user_id));
            return Ok(ChatReply {
                text: REFUSAL_MESSAGE.to_string(),
                source: ReplySource::Blocked,
            });
        }

        // Cache lookup
        if let Some(cached) = self.cache.lookup(prompt).await {
            tags.cache_hit = Some(true);
            tags.response_length = Some(cached.chars().count());
            debug!("Returning cached response: user_id={}", user_id);

            self.history.record(ChatTurn::cached(cached.as_str(), user_id));
            return Ok(ChatReply {
                text: cached,
                source: ReplySource::Cached,
            });
        }
        tags.cache_hit = Some(false);

        // Generate
        match self.backend.generate(prompt).await {
            Ok(completion) => {
                tags.response_length = Some(completion.text.chars().count());
                if completion.usage.total > 0 {
                    tags.tokens = Some(completion.usage);
                    crate::metrics::record_tokens(&completion.usage);
                }

                tags.cache_stored = Some(self.cache.store(prompt, &completion.text).await);

                self.history
                    .record(ChatTurn::assistant(completion.text.as_str(), user_id));
                Ok(ChatReply {
                    text: completion.text,
                    source: ReplySource::Generated,
                })
            }
            Err(err @ CompletionError::QuotaExhausted { .. }) => {
                tags.mark_error(Some("rate_limit"), err.to_string());
                crate::metrics::record_rate_limit_error();
                error!("Rate limit exceeded: user_id={}", user_id);

                self.history.record(ChatTurn::error(RATE_LIMIT_MESSAGE, user_id));
                Err(err.into())
            }
            Err(err @ CompletionError::Generation(_)) => {
                tags.mark_error(Some("internal_error"), err.to_string());
                crate::metrics::record_internal_error();
                error!("Error processing request: user_id={}: {}", user_id, err);

                self.history
                    .record(ChatTurn::error(GENERATION_ERROR_MESSAGE, user_id));
                Err(err.into())
            }
        }
    }
}

/// Span carrying the request's telemetry tags; see [`RequestTags::apply`].
fn request_span() -> Span {
    info_span!(
        "chat_request",
        "user.id" = field::Empty,
        "user.region" = field::Empty,
        "prompt.length" = field::Empty,
        "security.jailbreak_attempt" = field::Empty,
        "cache.hit" = field::Empty,
        "cache.stored" = field::Empty,
        "response.length" = field::Empty,
        "llm.tokens.input" = field::Empty,
        "llm.tokens.output" = field::Empty,
        "llm.tokens.total" = field::Empty,
        "error" = field::Empty,
        "error.type" = field::Empty,
        "error.message" = field::Empty,
    )
}
