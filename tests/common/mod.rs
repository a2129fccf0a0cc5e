// Shared test doubles for integration tests
// Author: kelexine (https://github.com/kelexine)

#![allow(dead_code)]

use async_trait::async_trait;
use gemini_chat_relay::cache::{CacheError, CacheManager, KeyValueStore, MemoryStore};
use gemini_chat_relay::gemini::{Completion, CompletionBackend, CompletionError, TokenUsage};
use gemini_chat_relay::history::HistoryBuffer;
use gemini_chat_relay::pipeline::ChatPipeline;
use gemini_chat_relay::safety::SafetyFilter;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How the scripted backend answers.
#[derive(Debug, Clone)]
pub enum Script {
    /// Reply with "Answer to: {prompt}".
    Echo,
    /// Fail with quota exhaustion.
    QuotaExhausted,
    /// Fail with a generic upstream error.
    Fail,
}

/// Completion backend that follows a script and counts calls.
pub struct ScriptedBackend {
    script: Script,
    usage: TokenUsage,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(script: Script) -> Arc<Self> {
        Self::with_usage(script, TokenUsage::default())
    }

    pub fn with_usage(script: Script, usage: TokenUsage) -> Arc<Self> {
        Arc::new(Self {
            script,
            usage,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn generate(&self, prompt: &str) -> Result<Completion, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script {
            Script::Echo => Ok(Completion {
                text: format!("Answer to: {}", prompt),
                usage: self.usage,
            }),
            Script::QuotaExhausted => Err(CompletionError::QuotaExhausted {
                message: "Resource has been exhausted".to_string(),
                retry_after: Some(Duration::from_secs(7)),
            }),
            Script::Fail => Err(CompletionError::Generation(
                "HTTP 500: backend exploded".to_string(),
            )),
        }
    }

    fn model(&self) -> &str {
        "gemini-test"
    }
}

/// Store that is always unreachable and counts how often it was asked.
#[derive(Default)]
pub struct FailingStore {
    pub calls: AtomicUsize,
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Connection("connection refused".to_string()))
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Connection("connection refused".to_string()))
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Err(CacheError::Connection("connection refused".to_string()))
    }
}

pub fn cache_with(store: Arc<dyn KeyValueStore>) -> Arc<CacheManager> {
    Arc::new(CacheManager::new(
        store,
        Duration::from_secs(3600),
        Duration::from_secs(5),
    ))
}

pub fn memory_cache() -> Arc<CacheManager> {
    cache_with(Arc::new(MemoryStore::new()))
}

/// Pipeline with the default keyword list, a memory store and history of `capacity`.
pub fn pipeline(backend: Arc<ScriptedBackend>, cache: Arc<CacheManager>, capacity: usize) -> ChatPipeline {
    ChatPipeline::new(
        SafetyFilter::new(&["ignore"]),
        cache,
        Arc::new(HistoryBuffer::new(capacity)),
        backend,
    )
}
