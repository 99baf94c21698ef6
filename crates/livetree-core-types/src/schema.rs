//! Canonical schema constants for structured logging
//!
//! These constants keep field names consistent between the core and the
//! engine, and between emitted events and the test capture layer.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_SESSION_ID: &str = "session_id";
pub const FIELD_ATTEMPT_ID: &str = "attempt_id";

// Entity identifiers
pub const FIELD_NODE_ID: &str = "node_id";
pub const FIELD_DESCRIPTOR_ID: &str = "descriptor_id";
pub const FIELD_DOCUMENT: &str = "document";
pub const FIELD_OWNER: &str = "owner";

// Revisions and reasons
pub const FIELD_REVISION: &str = "revision";
pub const FIELD_REASON: &str = "reason";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
pub const EVENT_SUPPRESSED: &str = "suppressed";
