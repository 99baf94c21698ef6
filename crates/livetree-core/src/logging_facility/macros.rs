//! Canonical logging macros
//!
//! These macros provide a structured, consistent way to log operations.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use livetree_core::log_op_start;
/// log_op_start!("resolve_descriptor");
/// log_op_start!("resolve_descriptor", node_id = 7u64);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use livetree_core::log_op_end;
/// log_op_end!("resolve_descriptor", duration_ms = 3);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// The error is converted into an `ExError` so the stable code is logged.
///
/// ```
/// # use livetree_core::{log_op_error, errors::LiveTreeError};
/// let err = LiveTreeError::NodeNotFound { node_id: 4 };
/// log_op_error!("reveal", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::warn!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::warn!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            $($field)*
        );
    }};
}

/// Log a result that was computed but deliberately not applied
///
/// ```
/// # use livetree_core::log_op_suppressed;
/// log_op_suppressed!("inbound_sync", "stale");
/// ```
#[macro_export]
macro_rules! log_op_suppressed {
    ($op:expr, $reason:expr) => {
        tracing::debug!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_SUPPRESSED,
            reason = $reason,
        );
    };
    ($op:expr, $reason:expr, $($field:tt)*) => {
        tracing::debug!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_SUPPRESSED,
            reason = $reason,
            $($field)*
        );
    };
}
