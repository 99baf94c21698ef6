//! One inspector session
//!
//! `InspectorSession` owns every piece of UI-thread state: the live tree,
//! the view, revision counters, per-document spatial indexes, the
//! descriptor-to-node cache and the current selection. It is not shared
//! between threads.
//!
//! Anything that has to wait on a provider is split into three steps:
//! `begin_*` captures what it needs from the session, the returned attempt
//! is driven with `.run().await` without touching the session, and
//! `complete_*` applies the result back on the session (or suppresses it
//! when it has gone stale). The `async fn` helpers at the bottom of each
//! submodule chain the three steps for callers that do not interleave.

mod documents;
mod edit;
mod inbound;
mod locations;
mod outbound;

use std::collections::HashMap;
use std::sync::Arc;

use livetree_core::core_types::{SessionId, SyncContext};
use livetree_core::model::{FeedEvent, SubscriptionId};
use livetree_core::{
    DescriptorId, DocumentDescriptor, DocumentIndex, DocumentPath, LineSpan, LiveHost, LiveId,
    LiveTreeModel, NodeId, PathCasing, Result, SelectionCoordinator, SelectionSnapshot, TreeIndex,
    TreeView,
};
use livetree_core::{log_op_error, log_op_suppressed};

use crate::config::SyncConfig;
use crate::observer::{ObserverSet, SelectionObserver};
use crate::providers::{DocumentIndexProvider, MutationDispatcher, SourceInfoResolver};
use crate::revision::RevisionCounters;

pub use documents::{DocumentRefresh, RefreshLoaded, RefreshOutcome};
pub use edit::{EditAttempt, EditDone, EditReport};
pub use inbound::{InboundAttempt, InboundLoaded, InboundOutcome};
pub use locations::{LocationFetch, LocationsFetched};
pub use outbound::{OutboundAttempt, OutboundLoaded, OutboundOutcome};

/// How a tree-owned publish ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishResult {
    /// Published; carries how many observers were notified
    Delivered(usize),
    /// Another owner holds the publisher slot
    Refused,
    /// Equal to the last published snapshot
    Unchanged,
}

/// External collaborators of a session
#[derive(Clone)]
pub struct Providers {
    pub documents: Arc<dyn DocumentIndexProvider>,
    pub dispatcher: Arc<dyn MutationDispatcher>,
    pub sources: Arc<dyn SourceInfoResolver>,
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers").finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct InspectorSession {
    session_id: SessionId,
    config: SyncConfig,
    casing: PathCasing,
    providers: Providers,
    model: LiveTreeModel,
    view: TreeView,
    coordinator: SelectionCoordinator,
    revisions: RevisionCounters,
    indexes: HashMap<DocumentPath, TreeIndex>,
    descriptor_nodes: HashMap<(DocumentPath, DescriptorId), NodeId>,
    /// Last index seen per document
    documents: HashMap<DocumentPath, Arc<DocumentIndex>>,
    /// Documents a location or descriptor has pointed at, in first-seen order
    associated: Vec<DocumentPath>,
    selection: Option<NodeId>,
    observers: ObserverSet,
    status: Option<String>,
}

impl InspectorSession {
    pub fn new(config: SyncConfig, providers: Providers) -> Self {
        let casing = config.casing();
        let session_id = SessionId::new();
        tracing::debug!(
            component = module_path!(),
            session_id = %session_id,
            tree_owner = config.tree_owner.as_str(),
            "inspector session created"
        );
        Self {
            session_id,
            config,
            casing,
            providers,
            model: LiveTreeModel::new(),
            view: TreeView::new(),
            coordinator: SelectionCoordinator::new(),
            revisions: RevisionCounters::new(),
            indexes: HashMap::new(),
            descriptor_nodes: HashMap::new(),
            documents: HashMap::new(),
            associated: Vec::new(),
            selection: None,
            observers: ObserverSet::new(),
            status: None,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn model(&self) -> &LiveTreeModel {
        &self.model
    }

    pub fn view(&self) -> &TreeView {
        &self.view
    }

    /// Handle onto the session's publisher slot, for observers
    pub fn coordinator(&self) -> SelectionCoordinator {
        self.coordinator.clone()
    }

    pub fn revisions(&self) -> &RevisionCounters {
        &self.revisions
    }

    pub fn selection(&self) -> Option<NodeId> {
        self.selection
    }

    /// Last user-facing status message, e.g. the outcome of an edit
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn tree_index(&self, document: &DocumentPath) -> Option<&TreeIndex> {
        self.indexes.get(document)
    }

    pub fn associated_documents(&self) -> &[DocumentPath] {
        &self.associated
    }

    /// Normalise a raw path with the session's casing rule
    pub fn path(&self, raw: &str) -> DocumentPath {
        DocumentPath::new(raw, self.casing)
    }

    pub fn register_observer(&mut self, observer: &Arc<dyn SelectionObserver>) {
        self.observers.register(observer);
    }

    /// Node currently cached for a descriptor, if still alive
    pub fn node_for_descriptor(&self, document: &DocumentPath, id: &DescriptorId) -> Option<NodeId> {
        self.descriptor_nodes
            .get(&(document.clone(), id.clone()))
            .copied()
            .filter(|n| self.model.store().contains(*n))
    }

    // ---- live tree ----

    /// Materialise `live` and its subtree as a new root
    ///
    /// # Errors
    ///
    /// Returns `LiveObjectUnknown` when the host has no info for `live`.
    pub fn attach(&mut self, host: &mut dyn LiveHost, live: LiveId) -> Result<NodeId> {
        let root = self.model.attach_root(host, live)?;
        self.view.refresh(self.model.store_mut());
        Ok(root)
    }

    /// Route a host feed event into the tree and purge caches of whatever
    /// it removed
    pub fn dispatch_feed(
        &mut self,
        host: &mut dyn LiveHost,
        subscription: SubscriptionId,
        event: FeedEvent,
    ) -> bool {
        let handled = self.model.dispatch(host, subscription, event);
        self.purge_removed();
        if handled {
            self.view.refresh(self.model.store_mut());
        }
        handled
    }

    /// Tear down every root and its subscriptions
    pub fn dispose(&mut self, host: &mut dyn LiveHost) {
        self.model.dispose(host);
        self.purge_removed();
    }

    // ---- view ----

    pub fn expand(&mut self, node: NodeId) -> bool {
        self.view.expand(self.model.store_mut(), node)
    }

    pub fn collapse(&mut self, node: NodeId) -> bool {
        self.view.collapse(self.model.store_mut(), node)
    }

    pub fn set_filter(&mut self, text: Option<&str>) {
        self.view.set_filter(self.model.store_mut(), text);
    }

    pub fn set_scope(&mut self, scope: Option<NodeId>) {
        self.view.set_scope(self.model.store_mut(), scope);
    }

    // ---- shared helpers ----

    fn purge_removed(&mut self) {
        let removed = self.model.store_mut().take_removed();
        if removed.is_empty() {
            return;
        }
        for node in &removed {
            for index in self.indexes.values_mut() {
                index.remove(*node);
            }
        }
        self.descriptor_nodes.retain(|_, n| !removed.contains(n));
        if self.selection.is_some_and(|s| removed.contains(&s)) {
            self.selection = None;
            self.revisions.bump_local_selection();
        }
        tracing::trace!(
            component = module_path!(),
            session_id = %self.session_id,
            removed = removed.len(),
            "caches purged"
        );
    }

    fn associate(&mut self, document: &DocumentPath) {
        if !self.associated.contains(document) {
            self.associated.push(document.clone());
        }
    }

    fn remember_index(&mut self, index: &Arc<DocumentIndex>) {
        let path = index.path().clone();
        self.associate(&path);
        self.documents.insert(path, Arc::clone(index));
    }

    /// Document a node resolves against first: its own backing document,
    /// else the nearest ancestor's
    fn own_document(&self, node: NodeId) -> Option<DocumentPath> {
        let store = self.model.store();
        std::iter::once(node)
            .chain(store.ancestors(node))
            .find_map(|id| store.get(id).ok().and_then(|n| n.backing_document().cloned()))
    }

    fn record_descriptor(&mut self, node: NodeId, document: &DocumentPath, id: &DescriptorId) {
        self.descriptor_nodes
            .insert((document.clone(), id.clone()), node);
    }

    /// Cache `descriptor` on `node`, keyed for id lookups and indexed by span
    fn cache_descriptor(
        &mut self,
        node: NodeId,
        document: DocumentPath,
        descriptor: DocumentDescriptor,
        revision: u64,
    ) {
        self.record_descriptor(node, &document, &descriptor.id);
        self.index_span(node, &document, descriptor.span);
        if let Ok(runtime) = self.model.store_mut().get_mut(node) {
            runtime.descriptor = Some(descriptor);
            runtime.descriptor_document = Some(document);
            runtime.descriptor_revision = Some(revision);
        }
    }

    fn index_span(&mut self, node: NodeId, document: &DocumentPath, span: LineSpan) {
        if !self.config.spatial_index {
            return;
        }
        self.indexes
            .entry(document.clone())
            .or_insert_with(|| TreeIndex::new(document.clone()))
            .upsert(node, span);
    }

    /// Snapshot describing what `node` points at in source
    fn snapshot_of(&self, node: NodeId) -> Option<SelectionSnapshot> {
        let n = self.model.store().get(node).ok()?;
        match (&n.descriptor, &n.descriptor_document) {
            (Some(descriptor), Some(document)) => Some(SelectionSnapshot::for_descriptor(
                document.clone(),
                descriptor,
            )),
            _ => n.location.as_ref().map(SelectionSnapshot::for_location),
        }
    }

    /// Publish `snapshot` under the tree owner and notify observers
    fn publish_as_tree(
        &mut self,
        snapshot: SelectionSnapshot,
        ctx: &SyncContext,
        op: &str,
    ) -> PublishResult {
        let owner = self.config.tree_owner.clone();
        let grant = match self.coordinator.try_begin_publish(&owner, snapshot.clone()) {
            Ok(grant) => grant,
            Err(e) => {
                log_op_error!(
                    op,
                    e,
                    duration_ms = 0u64,
                    session_id = %ctx.session_id,
                    attempt_id = %ctx.attempt_id
                );
                return PublishResult::Refused;
            }
        };
        if !grant.granted() {
            log_op_suppressed!(op, "refused", attempt_id = %ctx.attempt_id);
            return PublishResult::Refused;
        }
        let Some(mut token) = grant.into_changed_token() else {
            log_op_suppressed!(op, "unchanged", attempt_id = %ctx.attempt_id);
            return PublishResult::Unchanged;
        };
        let delivered = self.observers.notify(&snapshot, &owner);
        token.release();
        PublishResult::Delivered(delivered)
    }

    fn context(&self) -> SyncContext {
        SyncContext::new(self.session_id.clone())
    }
}
