//! Spatial lookup from document line ranges to runtime nodes

pub mod tree_index;

pub use tree_index::{IndexEntry, TreeIndex};
