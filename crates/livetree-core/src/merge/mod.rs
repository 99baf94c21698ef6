//! Multi-source child-list merging
//!
//! Each runtime node composes its children from up to three independently
//! changing sources. A [`tracker`] per source turns the host's feed into
//! normalised bucket operations, a [`bucket`] keeps each source's entries in
//! its own position rule, and [`CombinedNode`] rebuilds the ordered child
//! list after every change.

pub mod bucket;
pub mod combined;
pub mod tracker;

pub use bucket::{BucketEntry, ChildBucket, Insert};
pub use combined::{CombinedNode, MergeEffects};
pub use tracker::{
    BucketOp, ChildSourceTracker, LogicalTracker, PopupTracker, TemplateTracker, TrackerState,
};
