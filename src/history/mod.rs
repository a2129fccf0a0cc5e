//! Bounded, in-memory conversation history.
//!
//! The relay keeps the most recent turns across all users in a fixed-capacity
//! FIFO buffer. It is owned by the chat pipeline, read by `/history`, and lost
//! on restart.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Default number of retained turns.
pub const DEFAULT_CAPACITY: usize = 50;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One recorded message. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,

    /// Telemetry region of the sender (user turns only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Refused by the safety filter.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub blocked: bool,

    /// Served from the response cache.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,

    /// Records a failed generation.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

impl ChatTurn {
    fn new(role: Role, content: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            user_id: user_id.into(),
            timestamp: Utc::now(),
            region: None,
            blocked: false,
            cached: false,
            error: false,
        }
    }

    /// Incoming prompt.
    pub fn user(content: impl Into<String>, user_id: impl Into<String>, region: &str) -> Self {
        Self {
            region: Some(region.to_string()),
            ..Self::new(Role::User, content, user_id)
        }
    }

    /// Freshly generated reply.
    pub fn assistant(content: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content, user_id)
    }

    /// Refusal produced by the safety filter.
    pub fn blocked(content: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            blocked: true,
            ..Self::new(Role::Assistant, content, user_id)
        }
    }

    /// Reply served from the cache.
    pub fn cached(content: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            cached: true,
            ..Self::new(Role::Assistant, content, user_id)
        }
    }

    /// Failure notice recorded in place of a reply.
    pub fn error(content: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            error: true,
            ..Self::new(Role::Assistant, content, user_id)
        }
    }
}

/// Fixed-capacity FIFO of recent turns, safe to share across requests.
#[derive(Debug)]
pub struct HistoryBuffer {
    turns: Mutex<VecDeque<ChatTurn>>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Create an empty buffer. A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            turns: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append a turn, evicting the oldest one when full. Never fails.
    pub fn record(&self, turn: ChatTurn) {
        let mut turns = self.turns.lock();
        if turns.len() == self.capacity {
            turns.pop_front();
        }
        turns.push_back(turn);
    }

    /// Copy of the buffer, oldest first.
    pub fn snapshot(&self) -> Vec<ChatTurn> {
        self.turns.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_eviction_keeps_last_capacity_in_order() {
        let history = HistoryBuffer::new(3);
        for i in 0..7 {
            history.record(ChatTurn::assistant(format!("turn {}", i), "u"));
        }

        let contents: Vec<String> = history.snapshot().into_iter().map(|t| t.content).collect();
        assert_eq!(contents, vec!["turn 4", "turn 5", "turn 6"]);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let history = HistoryBuffer::new(2);
        history.record(ChatTurn::assistant("a", "u"));
        let snapshot = history.snapshot();

        history.record(ChatTurn::assistant("b", "u"));
        history.record(ChatTurn::assistant("c", "u"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].content, "a");
    }

    #[test]
    fn test_zero_capacity_raised() {
        let history = HistoryBuffer::new(0);
        assert_eq!(history.capacity(), 1);
        history.record(ChatTurn::assistant("a", "u"));
        history.record(ChatTurn::assistant("b", "u"));
        assert_eq!(history.snapshot()[0].content, "b");
    }

    #[test]
    fn test_turn_flags() {
        let user = ChatTurn::user("hi", "user_sg", "SouthEast Asia");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.region.as_deref(), Some("SouthEast Asia"));

        assert!(ChatTurn::blocked("no", "u").blocked);
        assert!(ChatTurn::cached("yes", "u").cached);
        assert!(ChatTurn::error("oops", "u").error);

        let plain = ChatTurn::assistant("ok", "u");
        assert!(!plain.blocked && !plain.cached && !plain.error);
    }

    #[test]
    fn test_turn_serialization_omits_unset_flags() {
        let json = serde_json::to_value(ChatTurn::blocked("no", "u")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["blocked"], true);
        assert!(json.get("cached").is_none());
        assert!(json.get("region").is_none());
    }

    #[test]
    fn test_concurrent_records_are_not_lost() {
        let history = Arc::new(HistoryBuffer::new(1000));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let history = Arc::clone(&history);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        history.record(ChatTurn::assistant(format!("{}-{}", t, i), "u"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(history.len(), 800);
    }

    #[test]
    fn test_concurrent_records_respect_capacity() {
        let history = Arc::new(HistoryBuffer::new(10));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let history = Arc::clone(&history);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        history.record(ChatTurn::assistant("x", "u"));
                        assert!(history.len() <= 10);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(history.len(), 10);
    }
}
