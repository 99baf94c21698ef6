//! Correlation types for session and sync-attempt tracking
//!
//! A session id tags everything one inspector session logs; an attempt id
//! tags a single outbound or inbound selection sync so that its start, its
//! async resolution and its (possibly suppressed) apply step can be joined
//! in the logs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one inspector session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a new SessionId using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (for deserialization)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one selection sync attempt
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptId(String);

impl AttemptId {
    /// Generate a new AttemptId using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Context carried from the start of a sync attempt to its apply step
#[derive(Debug, Clone)]
pub struct SyncContext {
    pub session_id: SessionId,
    pub attempt_id: AttemptId,
}

impl SyncContext {
    /// Create a context for a fresh attempt inside `session_id`
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            attempt_id: AttemptId::new(),
        }
    }
}
