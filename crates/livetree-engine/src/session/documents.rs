use std::sync::Arc;
use std::time::Instant;

use livetree_core::core_types::SyncContext;
use livetree_core::{
    log_op_end, log_op_start, log_op_suppressed, DescriptorId, DescriptorResolver, DocumentIndex,
    DocumentPath, NodeId,
};
use tokio::sync::broadcast;

use super::outbound::load_index;
use super::{InspectorSession, PublishResult};
use crate::providers::{DocumentEvent, DocumentIndexProvider};

const OP: &str = "document_refresh";

/// Reparse of one document after a change notification
pub struct DocumentRefresh {
    ctx: SyncContext,
    started: Instant,
    path: DocumentPath,
    /// Selected node and the descriptor it pointed at in this document
    selected: Option<(NodeId, DescriptorId)>,
    local_revision: u64,
    documents: Arc<dyn DocumentIndexProvider>,
}

#[derive(Debug)]
pub struct RefreshLoaded {
    ctx: SyncContext,
    started: Instant,
    path: DocumentPath,
    selected: Option<(NodeId, DescriptorId)>,
    local_revision: u64,
    index: Option<Arc<DocumentIndex>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The selection did not point into this document, or moved meanwhile
    Untouched,
    /// The selected descriptor still exists under the same id
    Kept(NodeId),
    /// The selected node re-resolved to a different descriptor
    Remapped { node: NodeId, descriptor: DescriptorId },
    /// The selected descriptor is gone; selection cleared
    Cleared,
}

impl DocumentRefresh {
    pub fn path(&self) -> &DocumentPath {
        &self.path
    }

    /// Invalidate the provider's copy and load a fresh index
    pub async fn run(self) -> RefreshLoaded {
        self.documents.invalidate(&self.path).await;
        let index = load_index(&self.documents, &self.path).await;
        RefreshLoaded {
            ctx: self.ctx,
            started: self.started,
            path: self.path,
            selected: self.selected,
            local_revision: self.local_revision,
            index,
        }
    }
}

impl InspectorSession {
    /// Subscribe to the document provider's change notifications
    pub fn document_events(&self) -> broadcast::Receiver<DocumentEvent> {
        self.providers.documents.events()
    }

    /// Drop everything cached from the changed document
    ///
    /// Descriptors cached on nodes are cleared so they re-resolve on next
    /// use. A content change also empties the document's spatial index,
    /// since its line numbers may have shifted.
    pub fn begin_document_refresh(&mut self, event: &DocumentEvent) -> DocumentRefresh {
        let path = self.path(event.path().as_str());
        let selected = self.selection.and_then(|node| {
            let runtime = self.model.store().get(node).ok()?;
            if runtime.descriptor_document.as_ref() != Some(&path) {
                return None;
            }
            runtime.descriptor.as_ref().map(|d| (node, d.id.clone()))
        });

        let store = self.model.store_mut();
        for id in store.walk() {
            if let Ok(node) = store.get_mut(id) {
                if node.descriptor_document.as_ref() == Some(&path) {
                    node.clear_descriptor();
                }
            }
        }
        self.descriptor_nodes.retain(|(document, _), _| *document != path);
        self.documents.remove(&path);
        if matches!(event, DocumentEvent::Changed(_)) {
            if let Some(index) = self.indexes.get_mut(&path) {
                index.clear();
            }
        }

        let ctx = self.context();
        log_op_start!(
            OP,
            session_id = %ctx.session_id,
            attempt_id = %ctx.attempt_id,
            document = path.as_str()
        );
        DocumentRefresh {
            ctx,
            started: Instant::now(),
            path,
            selected,
            local_revision: self.revisions.local_selection(),
            documents: Arc::clone(&self.providers.documents),
        }
    }

    /// Re-resolve the selection against the fresh index
    ///
    /// A kept or remapped descriptor whose snapshot moved is published
    /// again. The selection is cleared, and the empty snapshot published,
    /// only when the fresh index is available and neither the old
    /// descriptor id nor a type-compatible re-resolution exists in it.
    pub fn complete_document_refresh(&mut self, loaded: RefreshLoaded) -> RefreshOutcome {
        if let Some(index) = &loaded.index {
            self.remember_index(index);
        }
        let outcome = self.reselect(&loaded);
        log_op_end!(
            OP,
            duration_ms = loaded.started.elapsed().as_millis() as u64,
            attempt_id = %loaded.ctx.attempt_id,
            document = loaded.path.as_str(),
            outcome = ?outcome
        );
        outcome
    }

    pub async fn refresh_document(&mut self, event: &DocumentEvent) -> RefreshOutcome {
        let refresh = self.begin_document_refresh(event);
        let loaded = refresh.run().await;
        self.complete_document_refresh(loaded)
    }

    fn reselect(&mut self, loaded: &RefreshLoaded) -> RefreshOutcome {
        let Some((node, old_id)) = &loaded.selected else {
            return RefreshOutcome::Untouched;
        };
        if self.selection != Some(*node) || self.revisions.local_selection() != loaded.local_revision
        {
            log_op_suppressed!(OP, "selection_moved", attempt_id = %loaded.ctx.attempt_id);
            return RefreshOutcome::Untouched;
        }
        let Some(index) = loaded.index.as_deref() else {
            log_op_suppressed!(OP, "document_unavailable", attempt_id = %loaded.ctx.attempt_id);
            return RefreshOutcome::Untouched;
        };
        let Ok(type_name) = self.model.store().get(*node).map(|n| n.type_name.clone()) else {
            return RefreshOutcome::Untouched;
        };

        let kept = index
            .get(old_id)
            .filter(|d| d.element_name == type_name)
            .cloned();
        let (descriptor, outcome) = match kept {
            Some(descriptor) => (descriptor, RefreshOutcome::Kept(*node)),
            None => {
                let resolved = DescriptorResolver::new(self.model.store())
                    .resolve(*node, Some(index), &[])
                    .filter(|r| r.descriptor.element_name == type_name);
                let Some(resolution) = resolved else {
                    if let PublishResult::Refused = self.clear_selection() {
                        tracing::debug!(
                            component = module_path!(),
                            node_id = node.get(),
                            "selection cleared without broadcast"
                        );
                    }
                    return RefreshOutcome::Cleared;
                };
                let id = resolution.descriptor.id.clone();
                (
                    resolution.descriptor,
                    RefreshOutcome::Remapped {
                        node: *node,
                        descriptor: id,
                    },
                )
            }
        };

        self.cache_descriptor(*node, index.path().clone(), descriptor, index.revision());
        if let Some(snapshot) = self.snapshot_of(*node) {
            if !self.coordinator.is_current(&snapshot) {
                self.publish_as_tree(snapshot, &loaded.ctx, OP);
            }
        }
        outcome
    }
}
