#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use livetree_core::model::{FeedEvent, FeedKind, LiveInfo, Subscription, SubscriptionId};
use livetree_core::{
    DocumentDescriptor, DocumentIndex, DocumentPath, LineSpan, LiveHost, LiveId, LiveTreeError,
    NodeId, PathCasing, Result, SelectionSnapshot, SourceLocation,
};
use livetree_engine::{
    DispatchOutcome, DocumentEvent, DocumentIndexProvider, InspectorSession, MutationDispatcher,
    MutationEnvelope, Providers, SelectionObserver, SourceInfoResolver, SourceTarget, SyncConfig,
};
use tokio::sync::broadcast;

pub const WINDOW: LiveId = LiveId(1);
pub const ROOT_PANEL: LiveId = LiveId(2);
pub const CHILD_BUTTON: LiveId = LiveId(3);
pub const OTHER_BUTTON: LiveId = LiveId(4);
pub const SIDE_PANEL: LiveId = LiveId(5);
pub const SIDE_BUTTON: LiveId = LiveId(6);

pub const TREE: &str = "inspector-tree";
pub const PREVIEW: &str = "source-preview";

pub fn main_path() -> DocumentPath {
    DocumentPath::new("/app/MainWindow.xml", PathCasing::Sensitive)
}

// ---- live host ----

#[derive(Debug, Default)]
pub struct FakeHost {
    infos: HashMap<LiveId, LiveInfo>,
    feeds: HashMap<(LiveId, FeedKind), Vec<LiveId>>,
    subscriptions: HashMap<SubscriptionId, (LiveId, FeedKind)>,
    next_subscription: u64,
}

impl FakeHost {
    pub fn add(&mut self, live: u64, info: LiveInfo) {
        self.infos.insert(LiveId(live), info);
    }

    pub fn feed(&mut self, owner: LiveId, items: &[LiveId]) {
        self.feeds
            .insert((owner, FeedKind::LogicalChildren), items.to_vec());
    }

    /// Remove `child` from `owner`'s logical feed, returning the event to
    /// route
    pub fn remove_child(&mut self, owner: LiveId, child: LiveId) -> Option<(SubscriptionId, FeedEvent)> {
        let key = (owner, FeedKind::LogicalChildren);
        self.feeds.get_mut(&key)?.retain(|c| *c != child);
        let sub = self
            .subscriptions
            .iter()
            .find(|(_, v)| **v == key)
            .map(|(k, _)| *k)?;
        Some((sub, FeedEvent::Removed { items: vec![child] }))
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
        self.subscriptions.remove(&subscription);
    }
}

// ---- document provider ----

/// Documents filed under the path as reported, like files on disk
pub struct InMemoryDocuments {
    indexes: Mutex<HashMap<String, Arc<DocumentIndex>>>,
    unavailable: Mutex<HashSet<String>>,
    pub invalidated: Mutex<Vec<DocumentPath>>,
    pub invalidated_all: Mutex<usize>,
    events: broadcast::Sender<DocumentEvent>,
}

impl InMemoryDocuments {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            indexes: Mutex::new(HashMap::new()),
            unavailable: Mutex::new(HashSet::new()),
            invalidated: Mutex::new(Vec::new()),
            invalidated_all: Mutex::new(0),
            events,
        }
    }

    pub fn put(&self, index: DocumentIndex) {
        self.indexes
            .lock()
            .unwrap()
            .insert(index.path().as_str().to_string(), Arc::new(index));
    }

    pub fn make_unavailable(&self, path: &DocumentPath) {
        self.unavailable
            .lock()
            .unwrap()
            .insert(path.as_str().to_string());
    }

    /// Replace the index and announce the change
    pub fn reparse(&self, index: DocumentIndex) -> DocumentEvent {
        let event = DocumentEvent::Changed(index.path().clone());
        self.put(index);
        let _ = self.events.send(event.clone());
        event
    }
}

#[async_trait]
impl DocumentIndexProvider for InMemoryDocuments {
    async fn get_index(&self, path: &DocumentPath) -> Result<Arc<DocumentIndex>> {
        if self.unavailable.lock().unwrap().contains(path.as_str()) {
            return Err(LiveTreeError::DocumentUnavailable {
                path: path.as_str().to_string(),
                reason: "parse failed".to_string(),
            });
        }
        self.indexes
            .lock()
            .unwrap()
            .get(path.as_str())
            .cloned()
            .ok_or_else(|| LiveTreeError::DocumentUnavailable {
                path: path.as_str().to_string(),
                reason: "unknown document".to_string(),
            })
    }

    async fn invalidate(&self, path: &DocumentPath) {
        self.invalidated.lock().unwrap().push(path.clone());
    }

    async fn invalidate_all(&self) {
        *self.invalidated_all.lock().unwrap() += 1;
    }

    fn events(&self) -> broadcast::Receiver<DocumentEvent> {
        self.events.subscribe()
    }
}

// ---- dispatcher ----

pub struct RecordingDispatcher {
    pub envelopes: Mutex<Vec<MutationEnvelope>>,
    pub next: Mutex<DispatchOutcome>,
    pub history: Mutex<usize>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self {
            envelopes: Mutex::new(Vec::new()),
            next: Mutex::new(DispatchOutcome::success()),
            history: Mutex::new(0),
        }
    }

    pub fn answer(&self, outcome: DispatchOutcome) {
        *self.next.lock().unwrap() = outcome;
    }
}

#[async_trait]
impl MutationDispatcher for RecordingDispatcher {
    async fn dispatch(&self, envelope: MutationEnvelope) -> Result<DispatchOutcome> {
        self.envelopes.lock().unwrap().push(envelope);
        let outcome = self.next.lock().unwrap().clone();
        if outcome.status == livetree_engine::DispatchStatus::Success {
            *self.history.lock().unwrap() += 1;
        }
        Ok(outcome)
    }

    async fn undo(&self) -> Result<DispatchOutcome> {
        let mut history = self.history.lock().unwrap();
        *history = history.saturating_sub(1);
        Ok(DispatchOutcome::success())
    }

    async fn redo(&self) -> Result<DispatchOutcome> {
        Ok(DispatchOutcome::success())
    }

    fn can_undo(&self) -> bool {
        *self.history.lock().unwrap() > 0
    }

    fn can_redo(&self) -> bool {
        false
    }
}

// ---- source info ----

#[derive(Default)]
pub struct StaticSources {
    locations: HashMap<LiveId, SourceLocation>,
}

#[async_trait]
impl SourceInfoResolver for StaticSources {
    async fn resolve(&self, target: &SourceTarget) -> Result<Option<SourceLocation>> {
        match target {
            SourceTarget::Node(live) => Ok(self.locations.get(live).cloned()),
            SourceTarget::Member { .. } => Ok(None),
        }
    }
}

// ---- observer ----

pub struct RecordingObserver {
    owner: String,
    pub seen: Mutex<Vec<(SelectionSnapshot, String)>>,
}

impl RecordingObserver {
    pub fn new(owner: &str) -> Arc<Self> {
        Arc::new(Self {
            owner: owner.to_string(),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn last(&self) -> Option<SelectionSnapshot> {
        self.seen.lock().unwrap().last().map(|(s, _)| s.clone())
    }

    pub fn count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

impl SelectionObserver for RecordingObserver {
    fn owner(&self) -> &str {
        &self.owner
    }

    fn on_selection(&self, snapshot: &SelectionSnapshot, origin: &str) {
        self.seen
            .lock()
            .unwrap()
            .push((snapshot.clone(), origin.to_string()));
    }
}

// ---- fixture ----

/// Window > RootPanel > [ChildButton, Button], Window > SidePanel > [Button]
pub fn main_index(revision: u64) -> DocumentIndex {
    DocumentIndex::new(
        main_path(),
        revision,
        vec![
            DocumentDescriptor::new("w", vec![], "Window", LineSpan::new(1, 20)),
            DocumentDescriptor::new("rp", vec![0], "StackPanel", LineSpan::new(2, 8))
                .with_name("RootPanel")
                .with_content_hash("h-rp"),
            DocumentDescriptor::new("cb", vec![0, 0], "Button", LineSpan::new(3, 3))
                .with_name("ChildButton")
                .with_content_hash("h-cb"),
            DocumentDescriptor::new("ob", vec![0, 1], "Button", LineSpan::new(4, 4)),
            DocumentDescriptor::new("sp", vec![1], "StackPanel", LineSpan::new(9, 12)),
            DocumentDescriptor::new("sb", vec![1, 0], "Button", LineSpan::new(10, 10)),
        ],
    )
}

pub struct Fixture {
    pub host: FakeHost,
    pub session: InspectorSession,
    pub documents: Arc<InMemoryDocuments>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub preview: Arc<RecordingObserver>,
    pub panel: Arc<RecordingObserver>,
}

impl Fixture {
    /// Attached tree with the window's location primed
    pub async fn new() -> Self {
        Self::with_config(SyncConfig {
            path_casing: livetree_engine::CasingSetting::Sensitive,
            ..SyncConfig::default()
        })
        .await
    }

    pub async fn with_config(config: SyncConfig) -> Self {
        let mut host = FakeHost::default();
        host.add(1, LiveInfo::new("Window").markup());
        host.add(2, LiveInfo::new("StackPanel").named("RootPanel").markup());
        host.add(3, LiveInfo::new("Button").named("ChildButton").markup());
        host.add(4, LiveInfo::new("Button").markup());
        host.add(5, LiveInfo::new("StackPanel").markup());
        host.add(6, LiveInfo::new("Button").markup());
        host.feed(WINDOW, &[ROOT_PANEL, SIDE_PANEL]);
        host.feed(ROOT_PANEL, &[CHILD_BUTTON, OTHER_BUTTON]);
        host.feed(SIDE_PANEL, &[SIDE_BUTTON]);

        let documents = Arc::new(InMemoryDocuments::new());
        documents.put(main_index(1));
        let dispatcher = Arc::new(RecordingDispatcher::new());
        let mut sources = StaticSources::default();
        sources.locations.insert(
            WINDOW,
            SourceLocation::new(main_path(), LineSpan::new(1, 20)),
        );

        let providers = Providers {
            documents: documents.clone(),
            dispatcher: dispatcher.clone(),
            sources: Arc::new(sources),
        };
        let mut session = InspectorSession::new(config, providers);
        session.attach(&mut host, WINDOW).unwrap();
        session.prime_locations().await;

        let preview = RecordingObserver::new(PREVIEW);
        let panel = RecordingObserver::new("property-panel");
        session.register_observer(&(preview.clone() as Arc<dyn SelectionObserver>));
        session.register_observer(&(panel.clone() as Arc<dyn SelectionObserver>));

        Self {
            host,
            session,
            documents,
            dispatcher,
            preview,
            panel,
        }
    }

    pub fn node(&self, live: LiveId) -> NodeId {
        self.session.model().find_live(live).unwrap()
    }

    /// Snapshot an external observer would send for descriptor `id`
    pub fn request(&self, id: &str) -> SelectionSnapshot {
        let index = main_index(1);
        let descriptor = index
            .get(&livetree_core::DescriptorId::new(id))
            .unwrap();
        SelectionSnapshot::for_descriptor(main_path(), descriptor)
    }
}
