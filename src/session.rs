//! Conversation session store
//!
//! Sessions are created lazily on first message, live for the process
//! lifetime, and keep a bounded history with the oldest entries evicted.
//! Appends are atomic per session; cross-session access is unconstrained.

use chrono::Utc;
use dashmap::DashMap;
use serde::Deserialize;
use serde::Serialize;

/// Maximum messages retained per session; oldest are evicted beyond this.
pub const MAX_HISTORY_LENGTH: usize = 20;

/// One message in a session's conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMessage {
    pub role: String, // "user" or "assistant"
    pub content: String,
    pub timestamp: u64,
}

/// Metadata tracked alongside a session's history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub created_at: u64,
    pub last_activity: u64,
    pub message_count: usize,
}

/// A caller-scoped conversational context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub history: Vec<SessionMessage>,
    pub metadata: SessionMetadata,
}

impl SessionContext {
    fn new() -> Self {
        let now = unix_now();
        Self {
            history: Vec::new(),
            metadata: SessionMetadata {
                created_at: now,
                last_activity: now,
                message_count: 0,
            },
        }
    }
}

/// Process-lifetime session store keyed by session id
pub struct SessionStore {
    sessions: DashMap<String, SessionContext>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Get a snapshot of a session's context, creating it on first use.
    #[must_use]
    pub fn get_or_create(&self, session_id: &str) -> SessionContext {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(SessionContext::new)
            .clone()
    }

    /// Append a message to a session's history, evicting the oldest entry
    /// once the cap is reached. The dashmap entry guard makes the append
    /// atomic per session.
    pub fn append(&self, session_id: &str, role: &str, content: impl Into<String>) {
        let mut entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(SessionContext::new);

        let timestamp = unix_now();
        entry.history.push(SessionMessage {
            role: role.to_string(),
            content: content.into(),
            timestamp,
        });

        if entry.history.len() > MAX_HISTORY_LENGTH {
            let excess = entry.history.len() - MAX_HISTORY_LENGTH;
            entry.history.drain(0..excess);
        }

        entry.metadata.last_activity = timestamp;
        entry.metadata.message_count += 1;
    }

    /// Get a snapshot of a session's context without creating it.
    #[must_use]
    pub fn get(&self, session_id: &str) -> Option<SessionContext> {
        self.sessions.get(session_id).map(|entry| entry.clone())
    }

    /// Whether a session already has any history.
    #[must_use]
    pub fn has_history(&self, session_id: &str) -> bool {
        self.sessions
            .get(session_id)
            .is_some_and(|entry| !entry.history.is_empty())
    }

    /// Number of live sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Total stored messages across all sessions.
    #[must_use]
    pub fn total_messages(&self) -> usize {
        self.sessions
            .iter()
            .map(|entry| entry.history.len())
            .sum()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or_default()
}
