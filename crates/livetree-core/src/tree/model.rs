use std::collections::HashMap;

use crate::errors::{LiveTreeError, Result};
use crate::merge::{BucketOp, CombinedNode};
use crate::model::{BucketKind, FeedEvent, LiveHost, LiveId, NodeId, SubscriptionId};

use super::store::NodeStore;

/// Live composition tree as seen by the inspector
///
/// Owns the node arena, one [`CombinedNode`] per materialised live node and
/// the table routing host subscriptions back to the node that holds them.
/// Children are materialised eagerly: every live node entering the tree gets
/// its own merger immediately.
#[derive(Debug, Default)]
pub struct LiveTreeModel {
    store: NodeStore,
    combined: HashMap<NodeId, CombinedNode>,
    routes: HashMap<SubscriptionId, NodeId>,
}

impl LiveTreeModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut NodeStore {
        &mut self.store
    }

    pub fn combined(&self, node: NodeId) -> Option<&CombinedNode> {
        self.combined.get(&node)
    }

    /// Observed children of `node`, in display order
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.store
            .get(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Number of host subscriptions currently routed
    pub fn subscription_count(&self) -> usize {
        self.routes.len()
    }

    /// Runtime node wrapping `live`, if one is materialised
    pub fn find_live(&self, live: LiveId) -> Option<NodeId> {
        self.store
            .walk()
            .into_iter()
            .find(|id| self.store.get(*id).ok().and_then(|n| n.live_id()) == Some(live))
    }

    /// Materialise `live` as a new root and its whole subtree
    ///
    /// # Errors
    ///
    /// Returns `LiveObjectUnknown` when the host has no info for `live`.
    pub fn attach_root(&mut self, host: &mut dyn LiveHost, live: LiveId) -> Result<NodeId> {
        let info = host
            .info(live)
            .ok_or(LiveTreeError::LiveObjectUnknown { live_id: live.0 })?;
        let root = self.store.insert_root(live, &info);
        self.materialize(host, root);
        tracing::debug!(
            component = module_path!(),
            node_id = root.get(),
            nodes = self.store.len(),
            "root attached"
        );
        Ok(root)
    }

    /// Route one host feed event to the merger holding `subscription`
    ///
    /// Returns false when nothing holds the subscription; the event is
    /// dropped.
    pub fn dispatch(
        &mut self,
        host: &mut dyn LiveHost,
        subscription: SubscriptionId,
        event: FeedEvent,
    ) -> bool {
        let Some(node) = self.routes.get(&subscription).copied() else {
            tracing::trace!(
                component = module_path!(),
                subscription = subscription.0,
                "event for unknown subscription dropped"
            );
            return false;
        };
        let Some(combined) = self.combined.get_mut(&node) else {
            return false;
        };
        let before = combined.subscriptions();
        let handled = combined.handle(host, subscription, event);
        let after = combined.subscriptions();
        for sub in before.iter().filter(|s| !after.contains(s)) {
            self.routes.remove(sub);
        }
        for sub in after {
            self.routes.insert(sub, node);
        }
        match handled {
            Some((kind, ops)) => {
                self.apply(host, node, kind, ops);
                true
            }
            None => false,
        }
    }

    /// Dispose a root and everything below it; idempotent
    pub fn dispose_root(&mut self, host: &mut dyn LiveHost, root: NodeId) {
        self.dispose_node(host, root);
    }

    /// Dispose every root
    pub fn dispose(&mut self, host: &mut dyn LiveHost) {
        let roots = self.store.roots().to_vec();
        for root in roots {
            self.dispose_node(host, root);
        }
    }

    fn materialize(&mut self, host: &mut dyn LiveHost, node: NodeId) {
        let Some(live) = self.store.get(node).ok().and_then(|n| n.live_id()) else {
            return;
        };
        let Some(info) = host.info(live) else {
            return;
        };
        let (combined, seeds) = CombinedNode::attach(host, node, live, &info);
        for sub in combined.subscriptions() {
            self.routes.insert(sub, node);
        }
        self.combined.insert(node, combined);
        for (kind, ops) in seeds {
            self.apply(host, node, kind, ops);
        }
    }

    fn apply(&mut self, host: &mut dyn LiveHost, node: NodeId, kind: BucketKind, ops: Vec<BucketOp>) {
        if ops.is_empty() {
            return;
        }
        let effects = match self.combined.get_mut(&node) {
            Some(combined) => combined.apply(&mut self.store, host, kind, ops),
            None => return,
        };
        for dropped in effects.dropped {
            self.dispose_node(host, dropped);
        }
        for created in effects.created {
            if self.store.contains(created) {
                self.materialize(host, created);
            }
        }
    }

    /// Children first, then the template group, then the trackers
    fn dispose_node(&mut self, host: &mut dyn LiveHost, node: NodeId) {
        if let Some(mut combined) = self.combined.remove(&node) {
            for child in combined.child_nodes() {
                self.dispose_node(host, child);
            }
            if let Some(group) = combined.take_template_group() {
                self.store.remove(group);
            }
            for sub in combined.subscriptions() {
                self.routes.remove(&sub);
            }
            combined.dispose(host);
        } else if let Ok(n) = self.store.get(node) {
            // template group: its parts are owned by the parent's merger
            let parts = n.children.clone();
            for part in parts {
                self.dispose_node(host, part);
            }
        }
        self.store.remove(node);
    }
}
