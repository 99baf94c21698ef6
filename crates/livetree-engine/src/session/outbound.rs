//! Tree selection → descriptor → observers

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use livetree_core::core_types::SyncContext;
use livetree_core::{
    log_op_end, log_op_start, log_op_suppressed, DescriptorResolver, DocumentIndex, DocumentPath,
    NodeId, Result, SelectionSnapshot,
};

use super::{InspectorSession, PublishResult};
use crate::providers::DocumentIndexProvider;

const OP: &str = "outbound_sync";

/// Outbound sync waiting for its documents
pub struct OutboundAttempt {
    ctx: SyncContext,
    started: Instant,
    node: NodeId,
    local_revision: u64,
    own: Option<DocumentPath>,
    others: Vec<DocumentPath>,
    documents: Arc<dyn DocumentIndexProvider>,
}

#[derive(Debug)]
pub struct OutboundLoaded {
    ctx: SyncContext,
    started: Instant,
    node: NodeId,
    local_revision: u64,
    own: Option<Arc<DocumentIndex>>,
    others: Vec<Arc<DocumentIndex>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutboundOutcome {
    Published {
        snapshot: SelectionSnapshot,
        notified: usize,
    },
    /// The node maps to nothing in source; nothing was broadcast
    Unresolved,
    /// The user selected something else while this attempt ran
    Stale,
    Refused,
    Unchanged,
}

/// Load one index, turning provider failures into "no document"
///
/// An index the provider filed under another casing is re-keyed to `path`,
/// so everything cached from it compares with the session's own paths.
pub(super) async fn load_index(
    documents: &Arc<dyn DocumentIndexProvider>,
    path: &DocumentPath,
) -> Option<Arc<DocumentIndex>> {
    match documents.get_index(path).await {
        Ok(index) if index.path().key() == path.key() => Some(index),
        Ok(index) => Some(Arc::new(index.as_ref().clone().with_path(path.clone()))),
        Err(e) => {
            tracing::warn!(
                component = module_path!(),
                document = path.as_str(),
                error = %e,
                "document index unavailable"
            );
            None
        }
    }
}

impl OutboundAttempt {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub async fn run(self) -> OutboundLoaded {
        let own = match &self.own {
            Some(path) => load_index(&self.documents, path).await,
            None => None,
        };
        let others = join_all(
            self.others
                .iter()
                .map(|path| load_index(&self.documents, path)),
        )
        .await
        .into_iter()
        .flatten()
        .collect();
        OutboundLoaded {
            ctx: self.ctx,
            started: self.started,
            node: self.node,
            local_revision: self.local_revision,
            own,
            others,
        }
    }
}

impl InspectorSession {
    /// The user selected `node` in the tree
    ///
    /// Returns `None` when `node` is already the selection, so an applied
    /// inbound selection never echoes back out.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if `node` is not in the tree.
    pub fn begin_select(&mut self, node: NodeId) -> Result<Option<OutboundAttempt>> {
        self.model.store().get(node)?;
        if self.selection == Some(node) {
            log_op_suppressed!(OP, "already_selected", node_id = node.get());
            return Ok(None);
        }
        self.selection = Some(node);
        let local_revision = self.revisions.bump_local_selection();

        let own = self.own_document(node);
        let others = if self.config.cross_document_retry {
            self.associated
                .iter()
                .filter(|p| Some(*p) != own.as_ref())
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        let ctx = self.context();
        log_op_start!(
            OP,
            session_id = %ctx.session_id,
            attempt_id = %ctx.attempt_id,
            node_id = node.get(),
            revision = local_revision
        );
        Ok(Some(OutboundAttempt {
            ctx,
            started: Instant::now(),
            node,
            local_revision,
            own,
            others,
            documents: Arc::clone(&self.providers.documents),
        }))
    }

    /// Cache what was resolved, then publish unless the user moved on
    pub fn complete_select(&mut self, loaded: OutboundLoaded) -> OutboundOutcome {
        for index in loaded.own.iter().chain(loaded.others.iter()) {
            self.remember_index(index);
        }
        self.refresh_descriptor(loaded.node, loaded.own.as_deref(), &loaded.others);

        let outcome = self.publish_outbound(&loaded);
        log_op_end!(
            OP,
            duration_ms = loaded.started.elapsed().as_millis() as u64,
            attempt_id = %loaded.ctx.attempt_id,
            outcome = ?outcome
        );
        outcome
    }

    /// Select `node` and publish it once resolved
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if `node` is not in the tree.
    pub async fn select(&mut self, node: NodeId) -> Result<OutboundOutcome> {
        let Some(attempt) = self.begin_select(node)? else {
            return Ok(OutboundOutcome::Unchanged);
        };
        let loaded = attempt.run().await;
        Ok(self.complete_select(loaded))
    }

    /// Clear the tree selection and publish the empty snapshot
    pub fn clear_selection(&mut self) -> PublishResult {
        self.selection = None;
        self.revisions.bump_local_selection();
        let ctx = self.context();
        self.publish_as_tree(SelectionSnapshot::empty(), &ctx, "clear_selection")
    }

    /// Resolve and cache `node`'s descriptor unless the cached one is from
    /// the same document revision
    fn refresh_descriptor(
        &mut self,
        node: NodeId,
        own: Option<&DocumentIndex>,
        others: &[Arc<DocumentIndex>],
    ) {
        let Ok(runtime) = self.model.store().get(node) else {
            return;
        };
        let up_to_date = match (&runtime.descriptor_document, runtime.descriptor_revision) {
            (Some(document), Some(revision)) => self
                .documents
                .get(document)
                .is_some_and(|i| i.revision() == revision),
            _ => false,
        };
        if up_to_date {
            return;
        }

        let others: Vec<&DocumentIndex> = others.iter().map(|i| i.as_ref()).collect();
        let Some(resolution) =
            DescriptorResolver::new(self.model.store()).resolve(node, own, &others)
        else {
            return;
        };
        self.cache_descriptor(
            node,
            resolution.document,
            resolution.descriptor,
            resolution.revision,
        );
    }

    fn publish_outbound(&mut self, loaded: &OutboundLoaded) -> OutboundOutcome {
        if self.revisions.local_selection() != loaded.local_revision {
            log_op_suppressed!(OP, "stale", attempt_id = %loaded.ctx.attempt_id);
            return OutboundOutcome::Stale;
        }
        let Some(snapshot) = self.snapshot_of(loaded.node) else {
            log_op_suppressed!(OP, "unresolved", attempt_id = %loaded.ctx.attempt_id);
            return OutboundOutcome::Unresolved;
        };
        match self.publish_as_tree(snapshot.clone(), &loaded.ctx, OP) {
            PublishResult::Delivered(notified) => OutboundOutcome::Published { snapshot, notified },
            PublishResult::Refused => OutboundOutcome::Refused,
            PublishResult::Unchanged => OutboundOutcome::Unchanged,
        }
    }
}
