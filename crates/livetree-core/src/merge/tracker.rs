//! Child-source trackers
//!
//! Each tracker adapts one kind of live feed into normalised bucket
//! operations. A tracker is a small state machine: it starts
//! `Uninitialized`, becomes `Subscribed` once the host accepted its
//! subscription, and ends `Disposed`. Events reaching a tracker that is not
//! subscribed produce no operations, so nothing can touch a bucket after its
//! tracker was torn down.

use crate::model::{
    BucketKind, FeedEvent, FeedKind, LiveHost, LiveId, PopupSourceKind, SubscriptionId,
};

/// Lifecycle of a tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Uninitialized,
    Subscribed,
    Disposed,
}

/// Normalised child-source callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketOp {
    Add { index: usize, child: LiveId },
    Remove { child: LiveId },
    Reset,
}

/// Interface shared by the three tracker kinds
pub trait ChildSourceTracker {
    fn kind(&self) -> BucketKind;

    fn state(&self) -> TrackerState;

    /// Subscriptions currently held, for event routing
    fn subscriptions(&self) -> Vec<SubscriptionId>;

    /// Subscribe to the host feed
    ///
    /// Returns `None` when the live object lacks the capability ("not
    /// applicable"); otherwise the operations that seed the bucket.
    fn subscribe(&mut self, host: &mut dyn LiveHost) -> Option<Vec<BucketOp>>;

    fn handle(
        &mut self,
        host: &mut dyn LiveHost,
        subscription: SubscriptionId,
        event: FeedEvent,
    ) -> Vec<BucketOp>;

    /// Tear down every subscription; idempotent
    fn dispose(&mut self, host: &mut dyn LiveHost);
}

/// Mirror of a full feed, used to turn feed indices into ranks among the
/// accepted children
#[derive(Debug, Default)]
struct FeedMirror {
    items: Vec<(LiveId, bool)>,
}

impl FeedMirror {
    fn rank_before(&self, pos: usize) -> usize {
        self.items[..pos].iter().filter(|(_, ok)| *ok).count()
    }

    fn reset(&mut self, items: Vec<(LiveId, bool)>) -> Vec<BucketOp> {
        self.items = items;
        let mut ops = vec![BucketOp::Reset];
        let mut rank = 0;
        for (child, accepted) in &self.items {
            if *accepted {
                ops.push(BucketOp::Add {
                    index: rank,
                    child: *child,
                });
                rank += 1;
            }
        }
        ops
    }

    fn insert(&mut self, index: usize, items: Vec<(LiveId, bool)>) -> Vec<BucketOp> {
        let mut ops = Vec::new();
        for (offset, (child, accepted)) in items.into_iter().enumerate() {
            if self.items.iter().any(|(c, _)| *c == child) {
                continue;
            }
            let pos = index.saturating_add(offset).min(self.items.len());
            self.items.insert(pos, (child, accepted));
            if accepted {
                ops.push(BucketOp::Add {
                    index: self.rank_before(pos),
                    child,
                });
            }
        }
        ops
    }

    fn remove(&mut self, items: &[LiveId]) -> Vec<BucketOp> {
        let mut ops = Vec::new();
        for child in items {
            if let Some(pos) = self.items.iter().position(|(c, _)| c == child) {
                let (_, accepted) = self.items.remove(pos);
                if accepted {
                    ops.push(BucketOp::Remove { child: *child });
                }
            }
        }
        ops
    }

    fn clear(&mut self) {
        self.items.clear();
    }
}

/// Logical children, or the open top-level windows for a top-level group
///
/// Children belonging to the inspector's own window are filtered out.
#[derive(Debug)]
pub struct LogicalTracker {
    owner: LiveId,
    top_level_group: bool,
    state: TrackerState,
    subscription: Option<SubscriptionId>,
    mirror: FeedMirror,
}

impl LogicalTracker {
    pub fn new(owner: LiveId, top_level_group: bool) -> Self {
        Self {
            owner,
            top_level_group,
            state: TrackerState::Uninitialized,
            subscription: None,
            mirror: FeedMirror::default(),
        }
    }

    fn classify(host: &dyn LiveHost, items: Vec<LiveId>) -> Vec<(LiveId, bool)> {
        items
            .into_iter()
            .map(|child| {
                let accepted = host
                    .info(child)
                    .map(|info| !info.inspector_owned)
                    .unwrap_or(false);
                (child, accepted)
            })
            .collect()
    }
}

impl ChildSourceTracker for LogicalTracker {
    fn kind(&self) -> BucketKind {
        BucketKind::Logical
    }

    fn state(&self) -> TrackerState {
        self.state
    }

    fn subscriptions(&self) -> Vec<SubscriptionId> {
        self.subscription.into_iter().collect()
    }

    fn subscribe(&mut self, host: &mut dyn LiveHost) -> Option<Vec<BucketOp>> {
        if self.state != TrackerState::Uninitialized {
            return None;
        }
        let feed = if self.top_level_group {
            FeedKind::TopLevels
        } else {
            FeedKind::LogicalChildren
        };
        let subscription = host.subscribe(self.owner, feed)?;
        self.subscription = Some(subscription.id);
        self.state = TrackerState::Subscribed;
        let items = Self::classify(host, subscription.items);
        Some(self.mirror.reset(items))
    }

    fn handle(
        &mut self,
        host: &mut dyn LiveHost,
        subscription: SubscriptionId,
        event: FeedEvent,
    ) -> Vec<BucketOp> {
        if self.state != TrackerState::Subscribed || self.subscription != Some(subscription) {
            return Vec::new();
        }
        match event {
            FeedEvent::Inserted { index, items } => {
                let items = Self::classify(host, items);
                self.mirror.insert(index, items)
            }
            FeedEvent::Removed { items } => self.mirror.remove(&items),
            FeedEvent::Reset { items } => {
                let items = Self::classify(host, items);
                self.mirror.reset(items)
            }
            _ => Vec::new(),
        }
    }

    fn dispose(&mut self, host: &mut dyn LiveHost) {
        if self.state == TrackerState::Disposed {
            return;
        }
        if let Some(subscription) = self.subscription.take() {
            host.unsubscribe(subscription);
        }
        self.mirror.clear();
        self.state = TrackerState::Disposed;
    }
}

/// Direct template parts among the owner's rendered children
///
/// A rendered child is accepted only if its templated-parent back-reference
/// is the tracked owner; parts of a nested control's template belong to that
/// control instead.
#[derive(Debug)]
pub struct TemplateTracker {
    owner: LiveId,
    state: TrackerState,
    subscription: Option<SubscriptionId>,
    mirror: FeedMirror,
}

impl TemplateTracker {
    pub fn new(owner: LiveId) -> Self {
        Self {
            owner,
            state: TrackerState::Uninitialized,
            subscription: None,
            mirror: FeedMirror::default(),
        }
    }

    fn classify(&self, host: &dyn LiveHost, items: Vec<LiveId>) -> Vec<(LiveId, bool)> {
        items
            .into_iter()
            .map(|child| {
                let accepted = host
                    .info(child)
                    .map(|info| info.templated_parent == Some(self.owner) && !info.inspector_owned)
                    .unwrap_or(false);
                (child, accepted)
            })
            .collect()
    }
}

impl ChildSourceTracker for TemplateTracker {
    fn kind(&self) -> BucketKind {
        BucketKind::Template
    }

    fn state(&self) -> TrackerState {
        self.state
    }

    fn subscriptions(&self) -> Vec<SubscriptionId> {
        self.subscription.into_iter().collect()
    }

    fn subscribe(&mut self, host: &mut dyn LiveHost) -> Option<Vec<BucketOp>> {
        if self.state != TrackerState::Uninitialized {
            return None;
        }
        let subscription = host.subscribe(self.owner, FeedKind::VisualChildren)?;
        self.subscription = Some(subscription.id);
        self.state = TrackerState::Subscribed;
        let items = self.classify(host, subscription.items);
        Some(self.mirror.reset(items))
    }

    fn handle(
        &mut self,
        host: &mut dyn LiveHost,
        subscription: SubscriptionId,
        event: FeedEvent,
    ) -> Vec<BucketOp> {
        if self.state != TrackerState::Subscribed || self.subscription != Some(subscription) {
            return Vec::new();
        }
        match event {
            FeedEvent::Inserted { index, items } => {
                let items = self.classify(host, items);
                self.mirror.insert(index, items)
            }
            FeedEvent::Removed { items } => self.mirror.remove(&items),
            FeedEvent::Reset { items } => {
                let items = self.classify(host, items);
                self.mirror.reset(items)
            }
            _ => Vec::new(),
        }
    }

    fn dispose(&mut self, host: &mut dyn LiveHost) {
        if self.state == TrackerState::Disposed {
            return;
        }
        if let Some(subscription) = self.subscription.take() {
            host.unsubscribe(subscription);
        }
        self.mirror.clear();
        self.state = TrackerState::Disposed;
    }
}

/// The owner's active popup host
///
/// Watches the declared popup sources and follows the highest-priority one,
/// re-subscribing whenever it changes. At most one host is active; a newly
/// opened host replaces the previous one without an explicit remove.
#[derive(Debug)]
pub struct PopupTracker {
    owner: LiveId,
    state: TrackerState,
    sources_subscription: Option<SubscriptionId>,
    active: Option<(PopupSourceKind, SubscriptionId)>,
    current: Option<LiveId>,
}

impl PopupTracker {
    pub fn new(owner: LiveId) -> Self {
        Self {
            owner,
            state: TrackerState::Uninitialized,
            sources_subscription: None,
            active: None,
            current: None,
        }
    }

    /// The source kind currently followed
    pub fn active_source(&self) -> Option<PopupSourceKind> {
        self.active.map(|(kind, _)| kind)
    }

    fn switch_to(&mut self, host: &mut dyn LiveHost, kind: Option<PopupSourceKind>) -> Vec<BucketOp> {
        if self.active.map(|(k, _)| k) == kind {
            return Vec::new();
        }
        let mut ops = Vec::new();
        if let Some((_, subscription)) = self.active.take() {
            host.unsubscribe(subscription);
        }
        if let Some(child) = self.current.take() {
            ops.push(BucketOp::Remove { child });
        }
        if let Some(kind) = kind {
            if let Some(subscription) = host.subscribe(self.owner, FeedKind::Popup(kind)) {
                self.active = Some((kind, subscription.id));
                if let Some(child) = subscription.items.first().copied() {
                    self.current = Some(child);
                    ops.push(BucketOp::Add { index: 0, child });
                }
            }
        }
        ops
    }
}

impl ChildSourceTracker for PopupTracker {
    fn kind(&self) -> BucketKind {
        BucketKind::Popup
    }

    fn state(&self) -> TrackerState {
        self.state
    }

    fn subscriptions(&self) -> Vec<SubscriptionId> {
        self.sources_subscription
            .into_iter()
            .chain(self.active.map(|(_, s)| s))
            .collect()
    }

    fn subscribe(&mut self, host: &mut dyn LiveHost) -> Option<Vec<BucketOp>> {
        if self.state != TrackerState::Uninitialized {
            return None;
        }
        let subscription = host.subscribe(self.owner, FeedKind::PopupSources)?;
        self.sources_subscription = Some(subscription.id);
        self.state = TrackerState::Subscribed;
        let initial = host
            .info(self.owner)
            .and_then(|info| info.popup_sources.active());
        Some(self.switch_to(host, initial))
    }

    fn handle(
        &mut self,
        host: &mut dyn LiveHost,
        subscription: SubscriptionId,
        event: FeedEvent,
    ) -> Vec<BucketOp> {
        if self.state != TrackerState::Subscribed {
            return Vec::new();
        }
        let from_sources = self.sources_subscription == Some(subscription);
        let from_active = self.active.map(|(_, s)| s) == Some(subscription);
        match event {
            FeedEvent::PopupSourcesChanged(sources) if from_sources => {
                self.switch_to(host, sources.active())
            }
            FeedEvent::PopupOpened(child) if from_active => {
                if self.current == Some(child) {
                    return Vec::new();
                }
                self.current = Some(child);
                vec![BucketOp::Add { index: 0, child }]
            }
            FeedEvent::PopupClosed if from_active => match self.current.take() {
                Some(child) => vec![BucketOp::Remove { child }],
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn dispose(&mut self, host: &mut dyn LiveHost) {
        if self.state == TrackerState::Disposed {
            return;
        }
        if let Some((_, subscription)) = self.active.take() {
            host.unsubscribe(subscription);
        }
        if let Some(subscription) = self.sources_subscription.take() {
            host.unsubscribe(subscription);
        }
        self.current = None;
        self.state = TrackerState::Disposed;
    }
}
