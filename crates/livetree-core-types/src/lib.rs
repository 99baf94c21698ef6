//! Core types shared across livetree crates
//!
//! This crate provides foundational types used by the error, logging and
//! sync facilities:
//!
//! - **Correlation types**: SessionId, AttemptId, SyncContext
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::{AttemptId, SessionId, SyncContext};
