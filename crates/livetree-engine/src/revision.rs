//! Staleness bookkeeping for asynchronous selection sync
//!
//! Two counters, both only ever increasing. The local-selection revision
//! moves whenever the user selects something in the tree; the sync-attempt
//! revision moves whenever an inbound request starts resolving. An inbound
//! result captured both at its start and is checked against them when it
//! comes back.

/// Revisions captured when a sync attempt started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTicket {
    pub sync_revision: u64,
    pub local_revision: u64,
}

/// Verdict on a completed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    /// Still the latest attempt and the user has not selected anything since
    Current,
    /// A later attempt has started; never applied
    Superseded,
    /// Still the latest attempt but the local selection moved on
    LocalChanged,
}

#[derive(Debug, Default)]
pub struct RevisionCounters {
    local_selection: u64,
    sync_attempt: u64,
}

impl RevisionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_selection(&self) -> u64 {
        self.local_selection
    }

    pub fn sync_attempt(&self) -> u64 {
        self.sync_attempt
    }

    pub fn bump_local_selection(&mut self) -> u64 {
        self.local_selection += 1;
        self.local_selection
    }

    /// Start a new attempt; every attempt started earlier becomes superseded
    pub fn begin_sync_attempt(&mut self) -> SyncTicket {
        self.sync_attempt += 1;
        SyncTicket {
            sync_revision: self.sync_attempt,
            local_revision: self.local_selection,
        }
    }

    pub fn check(&self, ticket: &SyncTicket) -> Staleness {
        if ticket.sync_revision != self.sync_attempt {
            Staleness::Superseded
        } else if ticket.local_revision != self.local_selection {
            Staleness::LocalChanged
        } else {
            Staleness::Current
        }
    }
}
