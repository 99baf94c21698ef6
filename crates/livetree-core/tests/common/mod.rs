use std::collections::HashMap;

use livetree_core::model::{
    FeedEvent, FeedKind, LiveHost, LiveId, LiveInfo, PopupSourceKind, PopupSources,
    Subscription, SubscriptionId,
};
use livetree_core::{LiveTreeModel, NodeId};

/// In-memory live application
///
/// Feeds are plain item lists keyed by (owner, kind). Subscribing to a feed
/// that was never declared is "not applicable".
#[derive(Debug, Default)]
pub struct FakeHost {
    infos: HashMap<LiveId, LiveInfo>,
    feeds: HashMap<(LiveId, FeedKind), Vec<LiveId>>,
    subscriptions: HashMap<SubscriptionId, (LiveId, FeedKind)>,
    next_subscription: u64,
    pub unsubscribed: Vec<SubscriptionId>,
}

#[allow(dead_code)]
impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live object
    pub fn add(&mut self, live: u64, info: LiveInfo) -> LiveId {
        let id = LiveId(live);
        self.infos.insert(id, info);
        id
    }

    pub fn info_mut(&mut self, live: LiveId) -> &mut LiveInfo {
        self.infos.entry(live).or_default()
    }

    /// Declare a feed with its current items
    pub fn feed(&mut self, owner: LiveId, kind: FeedKind, items: &[LiveId]) {
        self.feeds.insert((owner, kind), items.to_vec());
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn subscription_for(&self, owner: LiveId, kind: FeedKind) -> Option<SubscriptionId> {
        self.subscriptions
            .iter()
            .find(|(_, v)| **v == (owner, kind))
            .map(|(k, _)| *k)
    }

    fn items_mut(&mut self, owner: LiveId, kind: FeedKind) -> &mut Vec<LiveId> {
        self.feeds.entry((owner, kind)).or_default()
    }
}

impl LiveHost for FakeHost {
    fn info(&self, live: LiveId) -> Option<LiveInfo> {
        self.infos.get(&live).cloned()
    }

    fn subscribe(&mut self, live: LiveId, feed: FeedKind) -> Option<Subscription> {
        let items = self.feeds.get(&(live, feed))?.clone();
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscriptions.insert(id, (live, feed));
        Some(Subscription { id, items })
    }

    fn unsubscribe(&mut self, subscription: SubscriptionId) {
        if self.subscriptions.remove(&subscription).is_some() {
            self.unsubscribed.push(subscription);
        }
    }
}

/// Drives feed changes through both the fake host and the model
#[allow(dead_code)]
pub struct Harness {
    pub host: FakeHost,
    pub model: LiveTreeModel,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(host: FakeHost) -> Self {
        Self {
            host,
            model: LiveTreeModel::new(),
        }
    }

    pub fn attach(&mut self, live: LiveId) -> NodeId {
        self.model.attach_root(&mut self.host, live).unwrap()
    }

    fn emit(&mut self, owner: LiveId, kind: FeedKind, event: FeedEvent) -> bool {
        match self.host.subscription_for(owner, kind) {
            Some(sub) => self.model.dispatch(&mut self.host, sub, event),
            None => false,
        }
    }

    pub fn insert(&mut self, owner: LiveId, kind: FeedKind, index: usize, items: &[LiveId]) {
        let feed = self.host.items_mut(owner, kind);
        let at = index.min(feed.len());
        for (offset, item) in items.iter().enumerate() {
            feed.insert(at + offset, *item);
        }
        self.emit(
            owner,
            kind,
            FeedEvent::Inserted {
                index,
                items: items.to_vec(),
            },
        );
    }

    pub fn remove(&mut self, owner: LiveId, kind: FeedKind, items: &[LiveId]) {
        self.host
            .items_mut(owner, kind)
            .retain(|i| !items.contains(i));
        self.emit(
            owner,
            kind,
            FeedEvent::Removed {
                items: items.to_vec(),
            },
        );
    }

    pub fn reset(&mut self, owner: LiveId, kind: FeedKind, items: &[LiveId]) {
        *self.host.items_mut(owner, kind) = items.to_vec();
        self.emit(
            owner,
            kind,
            FeedEvent::Reset {
                items: items.to_vec(),
            },
        );
    }

    pub fn switch_popup_sources(&mut self, owner: LiveId, sources: PopupSources) {
        self.host.info_mut(owner).popup_sources = sources.clone();
        self.emit(
            owner,
            FeedKind::PopupSources,
            FeedEvent::PopupSourcesChanged(sources),
        );
    }

    pub fn open_popup(&mut self, owner: LiveId, kind: PopupSourceKind, host_live: LiveId) {
        *self.host.items_mut(owner, FeedKind::Popup(kind)) = vec![host_live];
        self.emit(owner, FeedKind::Popup(kind), FeedEvent::PopupOpened(host_live));
    }

    pub fn close_popup(&mut self, owner: LiveId, kind: PopupSourceKind) {
        self.host.items_mut(owner, FeedKind::Popup(kind)).clear();
        self.emit(owner, FeedKind::Popup(kind), FeedEvent::PopupClosed);
    }

    /// Live ids of a node's observed children; template group shown as `None`
    pub fn child_lives(&self, node: NodeId) -> Vec<Option<LiveId>> {
        self.model
            .children(node)
            .into_iter()
            .map(|c| self.model.store().get(c).ok().and_then(|n| n.live_id()))
            .collect()
    }

    pub fn node_of(&self, live: LiveId) -> NodeId {
        self.model.find_live(live).unwrap()
    }
}

/// Info for a plain markup-backed control
#[allow(dead_code)]
pub fn control(type_name: &str) -> LiveInfo {
    LiveInfo::new(type_name).markup()
}

/// Info for a template part of `owner`
#[allow(dead_code)]
pub fn part(type_name: &str, owner: LiveId, part_name: &str) -> LiveInfo {
    LiveInfo {
        templated_parent: Some(owner),
        part_name: Some(part_name.to_string()),
        ..LiveInfo::new(type_name)
    }
}
