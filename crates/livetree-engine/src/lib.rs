//! livetree engine - asynchronous orchestration of an inspector session
//!
//! Wraps the synchronous `livetree-core` pieces with the collaborators that
//! have to be awaited: document parsing, source-location lookup and the
//! mutation dispatcher. Selection sync runs in both directions with
//! revision counters deciding which results still apply.

pub mod config;
pub mod observer;
pub mod providers;
pub mod revision;
pub mod session;

pub use config::{CasingSetting, SyncConfig};
pub use observer::{ObserverSet, SelectionObserver};
pub use providers::{
    DispatchOutcome, DispatchStatus, DocumentEvent, DocumentIndexProvider, EditGuard, EditPayload,
    MutationDispatcher, MutationEnvelope, SourceInfoResolver, SourceTarget,
};
pub use revision::{RevisionCounters, Staleness, SyncTicket};
pub use session::{
    InboundOutcome, InspectorSession, OutboundOutcome, Providers, PublishResult, RefreshOutcome,
};
