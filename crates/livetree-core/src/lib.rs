//! livetree core - synchronous engine of the live tree inspector
//!
//! This crate holds everything that runs on the UI thread:
//! - the runtime node model and its arena store
//! - the multi-source child-list merger and its child-source trackers
//! - the per-document spatial line index
//! - the descriptor resolver mapping runtime nodes to markup descriptors
//! - the selection coordinator guarding selection broadcasts
//!
//! Asynchronous orchestration (document providers, selection sync, edits)
//! lives in `livetree-engine`.

pub use livetree_core_types as core_types;

pub mod coordinator;
pub mod errors;
pub mod index;
pub mod logging_facility;
pub mod merge;
pub mod model;
pub mod resolver;
pub mod tree;

// Re-export commonly used types
pub use coordinator::{PublishGrant, PublishToken, SelectionCoordinator};
pub use errors::{ExError, ExErrorKind, LiveTreeError, Result};
pub use index::TreeIndex;
pub use merge::CombinedNode;
pub use model::{
    DescriptorId, DocumentDescriptor, DocumentIndex, DocumentPath, LineSpan, LiveHost, LiveId,
    NodeId, PathCasing, RuntimeNode, SelectionSnapshot, SourceLocation,
};
pub use resolver::{DescriptorResolver, NodeFacts, Resolution};
pub use tree::{LiveTreeModel, NodeStore, TreeView};
