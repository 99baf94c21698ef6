use livetree_core_types::{AttemptId, SessionId};
use thiserror::Error;

/// Result type alias using LiveTreeError
pub type Result<T> = std::result::Result<T, LiveTreeError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers can match on and that
/// is emitted in structured logs. Resolution misses and stale results are
/// not errors and have no kind here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Contract violations
    InvalidInput,
    InvalidOwner,
    Disposed,

    // Lookup
    NotFound,
    NodeNotFound,

    // Documents and collaborators
    DocumentUnavailable,
    SourceUnavailable,
    DispatchFailed,

    // Configuration / IO
    Config,
    Io,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidOwner => "ERR_INVALID_OWNER",
            ExErrorKind::Disposed => "ERR_DISPOSED",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::NodeNotFound => "ERR_NODE_NOT_FOUND",
            ExErrorKind::DocumentUnavailable => "ERR_DOCUMENT_UNAVAILABLE",
            ExErrorKind::SourceUnavailable => "ERR_SOURCE_UNAVAILABLE",
            ExErrorKind::DispatchFailed => "ERR_DISPATCH_FAILED",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification plus optional context so that errors crossing
/// the async boundary can be logged with the attempt they belonged to.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    node_id: Option<u64>,
    descriptor_id: Option<String>,
    document: Option<String>,
    session_id: Option<SessionId>,
    attempt_id: Option<AttemptId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            node_id: None,
            descriptor_id: None,
            document: None,
            session_id: None,
            attempt_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add runtime node context
    pub fn with_node_id(mut self, id: u64) -> Self {
        self.node_id = Some(id);
        self
    }

    /// Add descriptor context
    pub fn with_descriptor_id(mut self, id: impl Into<String>) -> Self {
        self.descriptor_id = Some(id.into());
        self
    }

    /// Add document path context
    pub fn with_document(mut self, path: impl Into<String>) -> Self {
        self.document = Some(path.into());
        self
    }

    pub fn with_session_id(mut self, id: SessionId) -> Self {
        self.session_id = Some(id);
        self
    }

    pub fn with_attempt_id(mut self, id: AttemptId) -> Self {
        self.attempt_id = Some(id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn node_id(&self) -> Option<u64> {
        self.node_id
    }

    pub fn descriptor_id(&self) -> Option<&str> {
        self.descriptor_id.as_deref()
    }

    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn attempt_id(&self) -> Option<&AttemptId> {
        self.attempt_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(node_id) = self.node_id {
            write!(f, " (node_id: {})", node_id)?;
        }
        if let Some(descriptor_id) = &self.descriptor_id {
            write!(f, " (descriptor_id: {})", descriptor_id)?;
        }
        if let Some(document) = &self.document {
            write!(f, " (document: {})", document)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Domain error taxonomy for livetree operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LiveTreeError {
    /// Publisher owner id is empty or otherwise unusable
    #[error("Invalid publisher owner id: {owner:?}")]
    InvalidOwner { owner: String },

    /// Runtime node handle does not refer to a live node
    #[error("Runtime node not found: {node_id}")]
    NodeNotFound { node_id: u64 },

    /// Operation on a collection after it was disposed
    #[error("Child collection of node {node_id} was disposed")]
    Disposed { node_id: u64 },

    /// Live object is not known to the host
    #[error("Live object not known to host: {live_id}")]
    LiveObjectUnknown { live_id: u64 },

    /// Document index could not be produced
    #[error("Document unavailable: {path}: {reason}")]
    DocumentUnavailable { path: String, reason: String },

    /// Source location lookup failed
    #[error("Source info unavailable: {reason}")]
    SourceUnavailable { reason: String },

    /// Mutation dispatcher rejected or failed an edit
    #[error("Dispatch failed: {reason}")]
    DispatchFailed { reason: String },

    /// Configuration could not be parsed or validated
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Filesystem failure
    #[error("IO error: {reason}")]
    Io { reason: String },
}

impl From<LiveTreeError> for ExError {
    fn from(err: LiveTreeError) -> Self {
        match err {
            LiveTreeError::InvalidOwner { owner } => ExError::new(ExErrorKind::InvalidOwner)
                .with_message(format!("Owner id {:?} is not usable", owner)),

            LiveTreeError::NodeNotFound { node_id } => ExError::new(ExErrorKind::NodeNotFound)
                .with_node_id(node_id)
                .with_message("Runtime node not found"),

            LiveTreeError::Disposed { node_id } => ExError::new(ExErrorKind::Disposed)
                .with_node_id(node_id)
                .with_message("Child collection was disposed"),

            LiveTreeError::LiveObjectUnknown { live_id } => ExError::new(ExErrorKind::NotFound)
                .with_message(format!("Live object {} not known to host", live_id)),

            LiveTreeError::DocumentUnavailable { path, reason } => {
                ExError::new(ExErrorKind::DocumentUnavailable)
                    .with_document(path)
                    .with_message(reason)
            }

            LiveTreeError::SourceUnavailable { reason } => {
                ExError::new(ExErrorKind::SourceUnavailable).with_message(reason)
            }

            LiveTreeError::DispatchFailed { reason } => {
                ExError::new(ExErrorKind::DispatchFailed).with_message(reason)
            }

            LiveTreeError::InvalidConfig { reason } => {
                ExError::new(ExErrorKind::Config).with_message(reason)
            }

            LiveTreeError::Io { reason } => ExError::new(ExErrorKind::Io).with_message(reason),
        }
    }
}

impl From<std::io::Error> for LiveTreeError {
    fn from(err: std::io::Error) -> Self {
        LiveTreeError::Io {
            reason: err.to_string(),
        }
    }
}
