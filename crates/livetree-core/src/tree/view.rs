use crate::model::NodeId;

use super::store::NodeStore;

/// What `reveal` had to change to make a node reachable
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealOutcome {
    pub scope_cleared: bool,
    pub filter_cleared: bool,
    /// Ancestors that were collapsed and are now expanded, nearest first
    pub expanded: Vec<NodeId>,
}

impl RevealOutcome {
    pub fn changed(&self) -> bool {
        self.scope_cleared || self.filter_cleared || !self.expanded.is_empty()
    }
}

/// Filter and scope applied to the tree
///
/// A node is visible iff it lies inside the scope (when one is set) and it
/// or one of its descendants matches the filter (when one is set). Filter
/// matching is a case-insensitive substring test on the node label.
#[derive(Debug, Clone, Default)]
pub struct TreeView {
    filter: Option<String>,
    scope: Option<NodeId>,
}

impl TreeView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn scope(&self) -> Option<NodeId> {
        self.scope
    }

    pub fn expand(&self, store: &mut NodeStore, node: NodeId) -> bool {
        match store.get_mut(node) {
            Ok(n) if !n.expanded => {
                n.expanded = true;
                true
            }
            _ => false,
        }
    }

    pub fn collapse(&self, store: &mut NodeStore, node: NodeId) -> bool {
        match store.get_mut(node) {
            Ok(n) if n.expanded => {
                n.expanded = false;
                true
            }
            _ => false,
        }
    }

    /// Set or clear the filter text; blank text clears it
    pub fn set_filter(&mut self, store: &mut NodeStore, text: Option<&str>) {
        self.filter = text
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);
        self.refresh(store);
    }

    /// Limit the visible tree to the subtree under `scope`
    pub fn set_scope(&mut self, store: &mut NodeStore, scope: Option<NodeId>) {
        self.scope = scope.filter(|s| store.contains(*s));
        self.refresh(store);
    }

    /// Recompute every node's visibility
    pub fn refresh(&mut self, store: &mut NodeStore) {
        if self.scope.is_some_and(|s| !store.contains(s)) {
            self.scope = None;
        }
        let ids = store.walk();
        let visible: Vec<(NodeId, bool)> = ids
            .iter()
            .map(|id| (*id, self.in_scope(store, *id) && self.matches_filter(store, *id)))
            .collect();
        for (id, v) in visible {
            if let Ok(node) = store.get_mut(id) {
                node.visible = v;
            }
        }
    }

    /// True when the current scope or filter hides `node`
    pub fn is_hidden(&self, store: &NodeStore, node: NodeId) -> bool {
        !(self.in_scope(store, node) && self.matches_filter(store, node))
    }

    /// Make `node` reachable: exit a scope or filter hiding it, expand
    /// collapsed ancestors
    pub fn reveal(
        &mut self,
        store: &mut NodeStore,
        node: NodeId,
        clear_filter: bool,
        expand: bool,
    ) -> RevealOutcome {
        let mut outcome = RevealOutcome::default();
        if !store.contains(node) {
            return outcome;
        }
        if !self.in_scope(store, node) {
            self.scope = None;
            outcome.scope_cleared = true;
        }
        if clear_filter && !self.matches_filter(store, node) {
            self.filter = None;
            outcome.filter_cleared = true;
        }
        if expand {
            for ancestor in store.ancestors(node) {
                if self.expand(store, ancestor) {
                    outcome.expanded.push(ancestor);
                }
            }
        }
        if outcome.scope_cleared || outcome.filter_cleared {
            self.refresh(store);
        }
        outcome
    }

    fn in_scope(&self, store: &NodeStore, node: NodeId) -> bool {
        match self.scope {
            Some(scope) => store.is_descendant_of(node, scope),
            None => true,
        }
    }

    fn matches_filter(&self, store: &NodeStore, node: NodeId) -> bool {
        let Some(filter) = &self.filter else {
            return true;
        };
        store.walk_from(node).into_iter().any(|id| {
            store
                .get(id)
                .map(|n| n.label().to_lowercase().contains(filter.as_str()))
                .unwrap_or(false)
        })
    }
}
