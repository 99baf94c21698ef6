//! External selection request → runtime node → tree

use std::sync::Arc;
use std::time::Instant;

use livetree_core::core_types::SyncContext;
use livetree_core::tree::RevealOutcome;
use livetree_core::{
    log_op_end, log_op_start, log_op_suppressed, DocumentIndex, LineSpan, NodeId, PublishToken,
    Result, RuntimeNode, SelectionSnapshot,
};

use super::outbound::load_index;
use super::InspectorSession;
use crate::providers::DocumentIndexProvider;
use crate::revision::{Staleness, SyncTicket};

const OP: &str = "inbound_sync";

/// Inbound sync holding its publish token until applied or dropped
pub struct InboundAttempt {
    ctx: SyncContext,
    started: Instant,
    owner: String,
    request: SelectionSnapshot,
    ticket: SyncTicket,
    token: PublishToken,
    documents: Arc<dyn DocumentIndexProvider>,
}

impl std::fmt::Debug for InboundAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundAttempt")
            .field("ctx", &self.ctx)
            .field("started", &self.started)
            .field("owner", &self.owner)
            .field("request", &self.request)
            .field("ticket", &self.ticket)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct InboundLoaded {
    ctx: SyncContext,
    started: Instant,
    owner: String,
    request: SelectionSnapshot,
    ticket: SyncTicket,
    token: PublishToken,
    index: Option<Arc<DocumentIndex>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    Applied { node: NodeId, reveal: RevealOutcome },
    /// No runtime node corresponds to the request; selection untouched
    Unresolved,
    /// A later request started, or the user selected something else
    Stale,
}

impl InboundAttempt {
    pub fn ticket(&self) -> SyncTicket {
        self.ticket
    }

    pub async fn run(self) -> InboundLoaded {
        let index = match &self.request.document {
            Some(path) => load_index(&self.documents, path).await,
            None => None,
        };
        InboundLoaded {
            ctx: self.ctx,
            started: self.started,
            owner: self.owner,
            request: self.request,
            ticket: self.ticket,
            token: self.token,
            index,
        }
    }
}

impl InspectorSession {
    /// An observer asks the tree to select `request`
    ///
    /// Returns `None` when the coordinator refuses `owner` or the request
    /// equals the last published selection.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOwner` for a blank owner id.
    pub fn begin_inbound(
        &mut self,
        owner: &str,
        mut request: SelectionSnapshot,
    ) -> Result<Option<InboundAttempt>> {
        request.document = request.document.map(|d| self.path(d.as_str()));
        let grant = self.coordinator.try_begin_publish(owner, request.clone())?;
        if !grant.granted() {
            log_op_suppressed!(OP, "refused", owner = owner);
            return Ok(None);
        }
        let Some(token) = grant.into_changed_token() else {
            log_op_suppressed!(OP, "unchanged", owner = owner);
            return Ok(None);
        };

        let ticket = self.revisions.begin_sync_attempt();
        if let Some(document) = &request.document {
            self.associate(document);
        }
        let ctx = self.context();
        log_op_start!(
            OP,
            session_id = %ctx.session_id,
            attempt_id = %ctx.attempt_id,
            owner = owner,
            revision = ticket.sync_revision
        );
        Ok(Some(InboundAttempt {
            ctx,
            started: Instant::now(),
            owner: owner.to_string(),
            request,
            ticket,
            token,
            documents: Arc::clone(&self.providers.documents),
        }))
    }

    /// Locate the requested node and apply it if the attempt is still the
    /// latest
    pub fn complete_inbound(&mut self, loaded: InboundLoaded) -> InboundOutcome {
        let InboundLoaded {
            ctx,
            started,
            owner,
            request,
            ticket,
            mut token,
            index,
        } = loaded;

        if let Some(index) = &index {
            self.remember_index(index);
        }
        let span = requested_span(&request, index.as_deref());

        let outcome = match self.locate(&request, span) {
            None => {
                log_op_suppressed!(OP, "unresolved", attempt_id = %ctx.attempt_id);
                InboundOutcome::Unresolved
            }
            Some(target) if !self.may_apply(&ticket, target, &request) => {
                log_op_suppressed!(
                    OP,
                    "stale",
                    attempt_id = %ctx.attempt_id,
                    revision = ticket.sync_revision
                );
                InboundOutcome::Stale
            }
            Some(target) => {
                let reveal = self.apply_inbound(target, &request);
                self.observers.notify(&request, &owner);
                InboundOutcome::Applied {
                    node: target,
                    reveal,
                }
            }
        };
        token.release();

        log_op_end!(
            OP,
            duration_ms = started.elapsed().as_millis() as u64,
            attempt_id = %ctx.attempt_id,
            outcome = ?outcome
        );
        outcome
    }

    /// Request a selection on behalf of `owner` and apply it when resolved
    ///
    /// Refused and unchanged requests come back as `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOwner` for a blank owner id.
    pub async fn request_selection(
        &mut self,
        owner: &str,
        request: SelectionSnapshot,
    ) -> Result<Option<InboundOutcome>> {
        let Some(attempt) = self.begin_inbound(owner, request)? else {
            return Ok(None);
        };
        let loaded = attempt.run().await;
        Ok(Some(self.complete_inbound(loaded)))
    }

    fn may_apply(&self, ticket: &SyncTicket, target: NodeId, request: &SelectionSnapshot) -> bool {
        match self.revisions.check(ticket) {
            Staleness::Current => true,
            Staleness::Superseded => false,
            Staleness::LocalChanged => {
                let selected_id = self
                    .selection
                    .and_then(|s| self.model.store().get(s).ok())
                    .and_then(|n| n.descriptor.as_ref())
                    .map(|d| &d.id);
                self.selection == Some(target)
                    || (request.descriptor_id.is_some()
                        && selected_id == request.descriptor_id.as_ref())
            }
        }
    }

    /// Select `target` without counting it as a local selection, so no
    /// outbound sync follows
    fn apply_inbound(&mut self, target: NodeId, request: &SelectionSnapshot) -> RevealOutcome {
        self.selection = Some(target);
        let reveal = self.view.reveal(
            self.model.store_mut(),
            target,
            self.config.clear_filter_on_sync,
            self.config.expand_on_sync,
        );
        if let (Some(document), Some(id)) = (&request.document, &request.descriptor_id) {
            let confirmed = self
                .model
                .store()
                .get(target)
                .ok()
                .and_then(|n| n.descriptor.as_ref())
                .filter(|d| &d.id == id)
                .map(|d| d.span);
            if let Some(span) = confirmed {
                self.record_descriptor(target, document, id);
                self.index_span(target, document, span);
            }
        }
        reveal
    }

    /// Id cache, then spatial index, then a full scan of the tree
    fn locate(&self, request: &SelectionSnapshot, span: Option<LineSpan>) -> Option<NodeId> {
        if let (Some(document), Some(id)) = (&request.document, &request.descriptor_id) {
            if let Some(node) = self.node_for_descriptor(document, id) {
                return Some(node);
            }
        }
        if self.config.spatial_index {
            if let (Some(document), Some(span)) = (&request.document, span) {
                let hit = self
                    .indexes
                    .get(document)
                    .and_then(|i| i.best_match(span))
                    .filter(|n| self.model.store().contains(*n));
                if hit.is_some() {
                    return hit;
                }
            }
        }
        self.scan(request, span)
    }

    fn scan(&self, request: &SelectionSnapshot, span: Option<LineSpan>) -> Option<NodeId> {
        let store = self.model.store();
        let nodes: Vec<&RuntimeNode> = store
            .walk()
            .into_iter()
            .filter_map(|id| store.get(id).ok())
            .filter(|n| !n.is_template_group())
            .collect();

        let Some(document) = &request.document else {
            let id = request.descriptor_id.as_ref()?;
            return nodes
                .iter()
                .find(|n| n.descriptor.as_ref().is_some_and(|d| &d.id == id))
                .map(|n| n.id);
        };

        let raw = document.as_str();
        let tiers: [&dyn Fn(&RuntimeNode) -> bool; 3] = [
            &|n: &RuntimeNode| {
                n.location.as_ref().is_some_and(|l| &l.document == document)
                    || n.descriptor_document.as_ref() == Some(document)
            },
            &|n: &RuntimeNode| {
                n.location
                    .as_ref()
                    .and_then(|l| l.remote_key.as_deref())
                    == Some(raw)
            },
            &|n: &RuntimeNode| n.location.as_ref().and_then(|l| l.uri.as_deref()) == Some(raw),
        ];

        tiers.iter().find_map(|matches| {
            let candidates: Vec<&RuntimeNode> =
                nodes.iter().copied().filter(|n| matches(*n)).collect();
            best_candidate(&candidates, request, span)
        })
    }
}

/// Exact descriptor id wins; otherwise the smallest line-span penalty
fn best_candidate(
    candidates: &[&RuntimeNode],
    request: &SelectionSnapshot,
    span: Option<LineSpan>,
) -> Option<NodeId> {
    if let Some(id) = &request.descriptor_id {
        let exact = candidates
            .iter()
            .find(|n| n.descriptor.as_ref().is_some_and(|d| &d.id == id));
        if let Some(node) = exact {
            return Some(node.id);
        }
    }
    let span = span?;
    candidates
        .iter()
        .filter_map(|n| node_span(n).map(|s| (n.id, penalty(s, span))))
        .min_by_key(|(_, p)| *p)
        .map(|(id, _)| id)
}

fn node_span(node: &RuntimeNode) -> Option<LineSpan> {
    node.descriptor
        .as_ref()
        .map(|d| d.span)
        .or_else(|| node.location.as_ref().map(|l| l.span))
}

fn penalty(candidate: LineSpan, query: LineSpan) -> u32 {
    candidate.start.abs_diff(query.start) + candidate.end.abs_diff(query.end)
}

/// Line span the request points at; a fresh descriptor span beats the
/// lines the requester sent
fn requested_span(request: &SelectionSnapshot, index: Option<&DocumentIndex>) -> Option<LineSpan> {
    if let (Some(index), Some(id)) = (index, &request.descriptor_id) {
        if let Some(descriptor) = index.get(id) {
            return Some(descriptor.span);
        }
    }
    request
        .start_line
        .map(|start| LineSpan::new(start, request.end_line.unwrap_or(start)))
}
