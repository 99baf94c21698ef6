use crate::model::{BucketKind, FeedEvent, LiveHost, LiveId, LiveInfo, NodeId, SubscriptionId};
use crate::tree::NodeStore;

use super::bucket::{ChildBucket, Insert};
use super::tracker::{
    BucketOp, ChildSourceTracker, LogicalTracker, PopupTracker, TemplateTracker,
};

/// Nodes created and dropped by one merge step
///
/// Dropped nodes are already detached from every bucket; the caller disposes
/// them (and their own child collections) before materialising new ones.
#[derive(Debug, Default)]
pub struct MergeEffects {
    pub created: Vec<NodeId>,
    pub dropped: Vec<NodeId>,
}

/// Child-list merger for one runtime node
///
/// Owns up to three trackers with their buckets plus the synthetic template
/// group. Every bucket change is followed by a full rebuild of the observed
/// child list:
///
/// 1. logical entries, in tracked order;
/// 2. the template group, iff the template bucket is non-empty, holding the
///    template parts in ascending visual index;
/// 3. the popup entry, if present.
#[derive(Debug)]
pub struct CombinedNode {
    owner: NodeId,
    logical: Option<LogicalTracker>,
    template: Option<TemplateTracker>,
    popup: Option<PopupTracker>,
    logical_bucket: ChildBucket,
    template_bucket: ChildBucket,
    popup_bucket: ChildBucket,
    template_group: Option<NodeId>,
    disposed: bool,
}

impl CombinedNode {
    /// Subscribe every applicable tracker for `owner`
    ///
    /// Returns the merger plus the seeding operations per bucket kind. Zero
    /// to three trackers may be active.
    pub fn attach(
        host: &mut dyn LiveHost,
        owner: NodeId,
        owner_live: LiveId,
        info: &LiveInfo,
    ) -> (Self, Vec<(BucketKind, Vec<BucketOp>)>) {
        let mut seeds = Vec::new();

        let mut logical = LogicalTracker::new(owner_live, info.top_level_group);
        let logical = logical.subscribe(host).map(|ops| {
            seeds.push((BucketKind::Logical, ops));
            logical
        });

        let mut template = TemplateTracker::new(owner_live);
        let template = template.subscribe(host).map(|ops| {
            seeds.push((BucketKind::Template, ops));
            template
        });

        let mut popup = PopupTracker::new(owner_live);
        let popup = popup.subscribe(host).map(|ops| {
            seeds.push((BucketKind::Popup, ops));
            popup
        });

        let combined = Self {
            owner,
            logical,
            template,
            popup,
            logical_bucket: ChildBucket::new(BucketKind::Logical),
            template_bucket: ChildBucket::new(BucketKind::Template),
            popup_bucket: ChildBucket::new(BucketKind::Popup),
            template_group: None,
            disposed: false,
        };
        (combined, seeds)
    }

    pub fn owner(&self) -> NodeId {
        self.owner
    }

    pub fn template_group(&self) -> Option<NodeId> {
        self.template_group
    }

    pub fn bucket(&self, kind: BucketKind) -> &ChildBucket {
        match kind {
            BucketKind::Logical => &self.logical_bucket,
            BucketKind::Template => &self.template_bucket,
            BucketKind::Popup => &self.popup_bucket,
        }
    }

    fn bucket_mut(&mut self, kind: BucketKind) -> &mut ChildBucket {
        match kind {
            BucketKind::Logical => &mut self.logical_bucket,
            BucketKind::Template => &mut self.template_bucket,
            BucketKind::Popup => &mut self.popup_bucket,
        }
    }

    /// Which trackers are active
    pub fn active_kinds(&self) -> Vec<BucketKind> {
        let mut kinds = Vec::new();
        if self.logical.is_some() {
            kinds.push(BucketKind::Logical);
        }
        if self.template.is_some() {
            kinds.push(BucketKind::Template);
        }
        if self.popup.is_some() {
            kinds.push(BucketKind::Popup);
        }
        kinds
    }

    pub fn subscriptions(&self) -> Vec<SubscriptionId> {
        let mut out = Vec::new();
        if let Some(t) = &self.logical {
            out.extend(t.subscriptions());
        }
        if let Some(t) = &self.template {
            out.extend(t.subscriptions());
        }
        if let Some(t) = &self.popup {
            out.extend(t.subscriptions());
        }
        out
    }

    /// Route a feed event to the tracker holding `subscription`
    pub fn handle(
        &mut self,
        host: &mut dyn LiveHost,
        subscription: SubscriptionId,
        event: FeedEvent,
    ) -> Option<(BucketKind, Vec<BucketOp>)> {
        if self.disposed {
            return None;
        }
        let trackers: [Option<&mut dyn ChildSourceTracker>; 3] = [
            self.logical.as_mut().map(|t| t as &mut dyn ChildSourceTracker),
            self.template.as_mut().map(|t| t as &mut dyn ChildSourceTracker),
            self.popup.as_mut().map(|t| t as &mut dyn ChildSourceTracker),
        ];
        for tracker in trackers.into_iter().flatten() {
            if tracker.subscriptions().contains(&subscription) {
                let kind = tracker.kind();
                return Some((kind, tracker.handle(host, subscription, event)));
            }
        }
        None
    }

    /// Apply normalised operations to one bucket, then rebuild
    pub fn apply(
        &mut self,
        store: &mut NodeStore,
        host: &dyn LiveHost,
        kind: BucketKind,
        ops: Vec<BucketOp>,
    ) -> MergeEffects {
        let mut effects = MergeEffects::default();
        if self.disposed {
            return effects;
        }
        for op in ops {
            self.apply_op(store, host, kind, op, &mut effects);
        }
        if self.template_bucket.is_empty() {
            if let Some(group) = self.template_group.take() {
                effects.dropped.push(group);
            }
        }
        self.rebuild(store);
        effects
    }

    fn apply_op(
        &mut self,
        store: &mut NodeStore,
        host: &dyn LiveHost,
        kind: BucketKind,
        op: BucketOp,
        effects: &mut MergeEffects,
    ) {
        match op {
            BucketOp::Add { index, child } => {
                if self.bucket(kind).contains(child) {
                    return;
                }
                let Some(info) = host.info(child) else {
                    tracing::debug!(
                        component = module_path!(),
                        live_id = child.0,
                        "skipping child unknown to host"
                    );
                    return;
                };
                let parent = match kind {
                    BucketKind::Template => self.ensure_template_group(store),
                    BucketKind::Logical | BucketKind::Popup => self.owner,
                };
                let node = store.insert_child(parent, child, &info, kind);
                if let Insert::Replaced(previous) = self.bucket_mut(kind).insert(index, child, node)
                {
                    effects.dropped.push(previous.node);
                }
                effects.created.push(node);
            }
            BucketOp::Remove { child } => {
                if let Some(entry) = self.bucket_mut(kind).remove(child) {
                    effects.dropped.push(entry.node);
                }
            }
            BucketOp::Reset => {
                for entry in self.bucket_mut(kind).clear() {
                    effects.dropped.push(entry.node);
                }
            }
        }
    }

    fn ensure_template_group(&mut self, store: &mut NodeStore) -> NodeId {
        match self.template_group {
            Some(group) => group,
            None => {
                let group = store.insert_template_group(self.owner);
                self.template_group = Some(group);
                group
            }
        }
    }

    /// Rebuild the observed child list from the buckets (clear + re-add)
    pub fn rebuild(&self, store: &mut NodeStore) {
        let mut children = self.logical_bucket.nodes();
        if let Some(group) = self.template_group {
            store.set_children(group, self.template_bucket.nodes());
            children.push(group);
        }
        children.extend(self.popup_bucket.nodes());
        store.set_children(self.owner, children);
    }

    /// Every child runtime node in display order, template parts included
    pub fn child_nodes(&self) -> Vec<NodeId> {
        let mut nodes = self.logical_bucket.nodes();
        nodes.extend(self.template_bucket.nodes());
        nodes.extend(self.popup_bucket.nodes());
        nodes
    }

    /// Hand the template group over for disposal; it is never recreated
    pub fn take_template_group(&mut self) -> Option<NodeId> {
        self.disposed = true;
        self.template_group.take()
    }

    /// Tear down trackers, then clear the buckets; idempotent
    pub fn dispose(&mut self, host: &mut dyn LiveHost) {
        self.disposed = true;
        if let Some(t) = self.logical.as_mut() {
            t.dispose(host);
        }
        if let Some(t) = self.template.as_mut() {
            t.dispose(host);
        }
        if let Some(t) = self.popup.as_mut() {
            t.dispose(host);
        }
        self.logical_bucket.clear();
        self.template_bucket.clear();
        self.popup_bucket.clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}
