//! Edits of the selected element, written back through the dispatcher

use std::sync::Arc;
use std::time::Instant;

use livetree_core::core_types::SyncContext;
use livetree_core::{log_op_end, log_op_start, log_op_suppressed};

use super::{DocumentRefresh, InspectorSession};
use crate::providers::{
    DispatchOutcome, DispatchStatus, DocumentEvent, EditGuard, EditPayload, MutationDispatcher,
    MutationEnvelope,
};

const OP: &str = "edit";

pub struct EditAttempt {
    ctx: SyncContext,
    started: Instant,
    envelope: MutationEnvelope,
    dispatcher: Arc<dyn MutationDispatcher>,
}

#[derive(Debug)]
pub struct EditDone {
    ctx: SyncContext,
    started: Instant,
    envelope: MutationEnvelope,
    outcome: DispatchOutcome,
}

/// What the user is told about an edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditReport {
    pub status: DispatchStatus,
    pub message: String,
}

impl EditAttempt {
    pub fn envelope(&self) -> &MutationEnvelope {
        &self.envelope
    }

    /// Hand the envelope to the dispatcher; a dispatcher error becomes a
    /// mutation failure
    pub async fn run(self) -> EditDone {
        let outcome = match self.dispatcher.dispatch(self.envelope.clone()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    component = module_path!(),
                    attempt_id = %self.ctx.attempt_id,
                    error = %e,
                    "dispatch failed"
                );
                DispatchOutcome::with_message(DispatchStatus::MutationFailure, e.to_string())
            }
        };
        EditDone {
            ctx: self.ctx,
            started: self.started,
            envelope: self.envelope,
            outcome,
        }
    }
}

impl InspectorSession {
    /// Build an edit of the selected element
    ///
    /// The guard carries the element's content hash and, with
    /// `include_parent`, its parent's. Returns `None` (and sets the status
    /// message) when nothing selected maps to source.
    pub fn begin_edit(&mut self, payload: EditPayload, include_parent: bool) -> Option<EditAttempt> {
        let mapped = self
            .selection
            .and_then(|node| self.model.store().get(node).ok())
            .and_then(|n| Some((n.descriptor.clone()?, n.descriptor_document.clone()?)));
        let Some((descriptor, document)) = mapped else {
            log_op_suppressed!(OP, "unmapped");
            self.status = Some("Nothing selected maps to source".to_string());
            return None;
        };

        let parent_hash = if include_parent {
            let parent_path = descriptor.path.parent();
            self.documents.get(&document).and_then(|index| {
                index
                    .descriptors()
                    .iter()
                    .find(|d| Some(&d.path) == parent_path.as_ref())
                    .and_then(|d| d.content_hash.clone())
            })
        } else {
            None
        };

        let envelope = MutationEnvelope {
            document,
            target: descriptor.id.clone(),
            guard: EditGuard {
                content_hash: descriptor.content_hash.clone(),
                parent_hash,
            },
            payload,
        };
        let ctx = self.context();
        log_op_start!(
            OP,
            session_id = %ctx.session_id,
            attempt_id = %ctx.attempt_id,
            descriptor_id = envelope.target.as_str(),
            document = envelope.document.as_str()
        );
        Some(EditAttempt {
            ctx,
            started: Instant::now(),
            envelope,
            dispatcher: Arc::clone(&self.providers.dispatcher),
        })
    }

    /// Turn the dispatcher's answer into a status message
    ///
    /// Guard failures are reported, never retried. A successful edit
    /// returns the refresh of the edited document, which the caller drives
    /// like any other refresh.
    pub fn complete_edit(&mut self, done: EditDone) -> (EditReport, Option<DocumentRefresh>) {
        let report = self.report(&done.outcome, Some(done.envelope.document.as_str()));
        log_op_end!(
            OP,
            duration_ms = done.started.elapsed().as_millis() as u64,
            attempt_id = %done.ctx.attempt_id,
            status = ?report.status
        );
        let refresh = (report.status == DispatchStatus::Success).then(|| {
            self.begin_document_refresh(&DocumentEvent::Changed(done.envelope.document.clone()))
        });
        (report, refresh)
    }

    /// Edit the selected element and refresh its document on success
    pub async fn edit(&mut self, payload: EditPayload, include_parent: bool) -> Option<EditReport> {
        let attempt = self.begin_edit(payload, include_parent)?;
        let done = attempt.run().await;
        let (report, refresh) = self.complete_edit(done);
        if let Some(refresh) = refresh {
            let loaded = refresh.run().await;
            self.complete_document_refresh(loaded);
        }
        Some(report)
    }

    pub async fn undo(&mut self) -> Option<EditReport> {
        self.history(false).await
    }

    pub async fn redo(&mut self) -> Option<EditReport> {
        self.history(true).await
    }

    async fn history(&mut self, redo: bool) -> Option<EditReport> {
        let op = if redo { "redo" } else { "undo" };
        let dispatcher = Arc::clone(&self.providers.dispatcher);
        let allowed = if redo {
            dispatcher.can_redo()
        } else {
            dispatcher.can_undo()
        };
        if !allowed {
            log_op_suppressed!(op, "empty_history");
            self.status = Some(format!("Nothing to {op}"));
            return None;
        }

        log_op_start!(op, session_id = %self.session_id);
        let started = Instant::now();
        let result = if redo {
            dispatcher.redo().await
        } else {
            dispatcher.undo().await
        };
        let outcome = result.unwrap_or_else(|e| {
            DispatchOutcome::with_message(DispatchStatus::MutationFailure, e.to_string())
        });
        let report = self.report(&outcome, None);
        log_op_end!(
            op,
            duration_ms = started.elapsed().as_millis() as u64,
            status = ?report.status
        );

        if report.status == DispatchStatus::Success {
            self.providers.documents.invalidate_all().await;
            let selected_document = self.selection.and_then(|node| {
                self.model
                    .store()
                    .get(node)
                    .ok()
                    .and_then(|n| n.descriptor_document.clone())
            });
            if let Some(document) = selected_document {
                self.refresh_document(&DocumentEvent::Changed(document)).await;
            }
        }
        Some(report)
    }

    fn report(&mut self, outcome: &DispatchOutcome, document: Option<&str>) -> EditReport {
        let message = match (outcome.status, &outcome.message) {
            (DispatchStatus::Success, Some(m)) => m.clone(),
            (DispatchStatus::Success, None) => "Edit applied".to_string(),
            (DispatchStatus::GuardFailure, detail) => {
                let mut text = match document {
                    Some(d) => format!("{d} changed since it was last parsed; edit not applied"),
                    None => "Document changed since it was last parsed; edit not applied".to_string(),
                };
                if let Some(detail) = detail {
                    text.push_str(": ");
                    text.push_str(detail);
                }
                text
            }
            (DispatchStatus::MutationFailure, Some(m)) => format!("Edit failed: {m}"),
            (DispatchStatus::MutationFailure, None) => "Edit failed".to_string(),
        };
        self.status = Some(message.clone());
        EditReport {
            status: outcome.status,
            message,
        }
    }
}
