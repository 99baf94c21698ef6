//! Collaborator seams
//!
//! The session reaches parsing, file writes and source lookup only through
//! these traits. Implementations are shared as `Arc<dyn ...>` so an attempt
//! can carry its own handle across an `.await` without borrowing the
//! session.

use std::sync::Arc;

use async_trait::async_trait;
use livetree_core::model::LiveId;
use livetree_core::{DescriptorId, DocumentIndex, DocumentPath, Result, SourceLocation};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Change notification raised by the document provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    /// The backing file changed; any cached index is stale
    Changed(DocumentPath),
    /// The document reparsed and its descriptor set changed
    NodesChanged(DocumentPath),
}

impl DocumentEvent {
    pub fn path(&self) -> &DocumentPath {
        match self {
            DocumentEvent::Changed(p) | DocumentEvent::NodesChanged(p) => p,
        }
    }
}

/// Parsed-document source
///
/// Paths handed in are normalised with the session casing; `as_str()` is
/// the path as the host reported it. The returned index may carry its own
/// casing, the session re-keys it on load.
#[async_trait]
pub trait DocumentIndexProvider: Send + Sync {
    /// Load (or reparse) the descriptor index of `path`
    async fn get_index(&self, path: &DocumentPath) -> Result<Arc<DocumentIndex>>;

    /// Drop any cached index for `path`
    async fn invalidate(&self, path: &DocumentPath);

    async fn invalidate_all(&self);

    /// Subscribe to change notifications
    fn events(&self) -> broadcast::Receiver<DocumentEvent>;
}

/// Optimistic-concurrency precondition of an edit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditGuard {
    /// Content hash of the target element as last parsed
    pub content_hash: Option<String>,
    /// Content hash of the parent element, when the edit may touch it
    pub parent_hash: Option<String>,
}

/// What the edit does; interpreted by the dispatcher only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EditPayload {
    SetAttribute { name: String, value: String },
    RemoveAttribute { name: String },
    RemoveElement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationEnvelope {
    pub document: DocumentPath,
    pub target: DescriptorId,
    pub guard: EditGuard,
    pub payload: EditPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    Success,
    /// The guard no longer matched the file; nothing was written
    GuardFailure,
    MutationFailure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub status: DispatchStatus,
    pub message: Option<String>,
}

impl DispatchOutcome {
    pub fn success() -> Self {
        Self {
            status: DispatchStatus::Success,
            message: None,
        }
    }

    pub fn with_message(status: DispatchStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }
}

/// Writes edits back to markup files and keeps their history
#[async_trait]
pub trait MutationDispatcher: Send + Sync {
    async fn dispatch(&self, envelope: MutationEnvelope) -> Result<DispatchOutcome>;
    async fn undo(&self) -> Result<DispatchOutcome>;
    async fn redo(&self) -> Result<DispatchOutcome>;
    fn can_undo(&self) -> bool;
    fn can_redo(&self) -> bool;
}

/// What to look up a declaration site for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceTarget {
    /// A live object
    Node(LiveId),
    /// A reflective member such as a property or event
    Member {
        declaring_type: String,
        member: String,
    },
}

/// Maps live objects and members to where they were declared
#[async_trait]
pub trait SourceInfoResolver: Send + Sync {
    async fn resolve(&self, target: &SourceTarget) -> Result<Option<SourceLocation>>;
}
