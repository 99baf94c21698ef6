use std::collections::HashMap;

use crate::errors::{LiveTreeError, Result};
use crate::model::{BucketKind, LiveId, LiveInfo, NodeId, RuntimeNode};

/// Collection-changed notification for one node's child list
///
/// The merger rebuilds a child list by clearing it and re-adding every
/// child, so a rebuild shows up as one `Cleared` followed by `Added` events
/// in display order. Tree widgets bind to this stream without knowing the
/// underlying child sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildrenChanged {
    Cleared {
        parent: NodeId,
    },
    Added {
        parent: NodeId,
        index: usize,
        child: NodeId,
    },
}

/// Arena owning every runtime node of one inspector tree
///
/// Not thread-safe: all mutation happens on the UI thread.
#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: HashMap<NodeId, RuntimeNode>,
    roots: Vec<NodeId>,
    next_id: u64,
    changes: Vec<ChildrenChanged>,
    removed: Vec<NodeId>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> NodeId {
        self.next_id += 1;
        NodeId(self.next_id)
    }

    /// Get a node by handle
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node was removed or never existed.
    pub fn get(&self, id: NodeId) -> Result<&RuntimeNode> {
        self.nodes
            .get(&id)
            .ok_or(LiveTreeError::NodeNotFound { node_id: id.0 })
    }

    /// Get a mutable node by handle
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node was removed or never existed.
    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut RuntimeNode> {
        self.nodes
            .get_mut(&id)
            .ok_or(LiveTreeError::NodeNotFound { node_id: id.0 })
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub(crate) fn insert_root(&mut self, live: LiveId, info: &LiveInfo) -> NodeId {
        let id = self.allocate();
        self.nodes.insert(id, RuntimeNode::root(id, live, info));
        self.roots.push(id);
        id
    }

    pub(crate) fn insert_child(
        &mut self,
        parent: NodeId,
        live: LiveId,
        info: &LiveInfo,
        origin: BucketKind,
    ) -> NodeId {
        let id = self.allocate();
        let mut node = RuntimeNode::live(id, live, info, origin);
        node.parent = Some(parent);
        self.nodes.insert(id, node);
        id
    }

    pub(crate) fn insert_template_group(&mut self, parent: NodeId) -> NodeId {
        let id = self.allocate();
        let mut node = RuntimeNode::template_group(id);
        node.parent = Some(parent);
        self.nodes.insert(id, node);
        id
    }

    /// Replace `parent`'s child list, emitting clear + re-add notifications
    pub(crate) fn set_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        for child in &children {
            if let Some(node) = self.nodes.get_mut(child) {
                node.parent = Some(parent);
            }
        }
        let Some(node) = self.nodes.get_mut(&parent) else {
            return;
        };
        node.children.clear();
        self.changes.push(ChildrenChanged::Cleared { parent });
        for (index, child) in children.iter().enumerate() {
            self.changes.push(ChildrenChanged::Added {
                parent,
                index,
                child: *child,
            });
        }
        node.children = children;
    }

    /// Remove a single node from the arena
    ///
    /// Children are expected to have been removed first; the merger disposes
    /// bottom-up so that no node outlives its parent.
    pub(crate) fn remove(&mut self, id: NodeId) {
        if self.nodes.remove(&id).is_some() {
            self.roots.retain(|r| *r != id);
            self.removed.push(id);
        }
    }

    /// Ancestors of `id`, nearest first
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.nodes.get(&id).and_then(|n| n.parent);
        while let Some(p) = current {
            out.push(p);
            current = self.nodes.get(&p).and_then(|n| n.parent);
        }
        out
    }

    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        id == ancestor || self.ancestors(id).contains(&ancestor)
    }

    /// All nodes in pre-order, roots first
    pub fn walk(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                out.push(id);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Pre-order walk of the subtree rooted at `root`, including `root`
    pub fn walk_from(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                out.push(id);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Drain pending collection-changed notifications
    pub fn take_changes(&mut self) -> Vec<ChildrenChanged> {
        std::mem::take(&mut self.changes)
    }

    /// Drain handles of nodes removed since the last call
    pub fn take_removed(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(t: &str) -> LiveInfo {
        LiveInfo::new(t)
    }

    #[test]
    fn test_new_store() {
        let store = NodeStore::new();
        assert!(store.is_empty());
        assert!(store.roots().is_empty());
    }

    #[test]
    fn test_get_missing_node() {
        let store = NodeStore::new();
        let result = store.get(NodeId(99));
        assert!(matches!(
            result,
            Err(LiveTreeError::NodeNotFound { node_id: 99 })
        ));
    }

    #[test]
    fn test_set_children_emits_clear_then_adds() {
        let mut store = NodeStore::new();
        let root = store.insert_root(LiveId(1), &info("Window"));
        let a = store.insert_child(root, LiveId(2), &info("Grid"), BucketKind::Logical);
        let b = store.insert_child(root, LiveId(3), &info("Border"), BucketKind::Logical);

        store.set_children(root, vec![a, b]);

        let changes = store.take_changes();
        assert_eq!(
            changes,
            vec![
                ChildrenChanged::Cleared { parent: root },
                ChildrenChanged::Added {
                    parent: root,
                    index: 0,
                    child: a
                },
                ChildrenChanged::Added {
                    parent: root,
                    index: 1,
                    child: b
                },
            ]
        );
        assert!(store.take_changes().is_empty());
    }

    #[test]
    fn test_ancestors_and_walk() {
        let mut store = NodeStore::new();
        let root = store.insert_root(LiveId(1), &info("Window"));
        let mid = store.insert_child(root, LiveId(2), &info("Grid"), BucketKind::Logical);
        let leaf = store.insert_child(mid, LiveId(3), &info("Button"), BucketKind::Logical);
        store.set_children(root, vec![mid]);
        store.set_children(mid, vec![leaf]);

        assert_eq!(store.ancestors(leaf), vec![mid, root]);
        assert!(store.is_descendant_of(leaf, root));
        assert!(!store.is_descendant_of(root, leaf));
        assert_eq!(store.walk(), vec![root, mid, leaf]);
    }

    #[test]
    fn test_remove_records_handle() {
        let mut store = NodeStore::new();
        let root = store.insert_root(LiveId(1), &info("Window"));
        store.remove(root);
        store.remove(root);

        assert!(!store.contains(root));
        assert_eq!(store.take_removed(), vec![root]);
    }
}
