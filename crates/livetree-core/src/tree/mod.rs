//! Runtime node tree: arena, live model and view state

pub mod model;
pub mod store;
pub mod view;

pub use model::LiveTreeModel;
pub use store::{ChildrenChanged, NodeStore};
pub use view::{RevealOutcome, TreeView};
