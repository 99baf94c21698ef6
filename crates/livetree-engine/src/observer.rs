use std::sync::{Arc, Weak};

use livetree_core::SelectionSnapshot;

/// Anything that shows or follows the selection: tree, property panel,
/// source preview
pub trait SelectionObserver: Send + Sync {
    /// Owner id this observer publishes under
    fn owner(&self) -> &str;

    /// A selection was published by `origin`
    fn on_selection(&self, snapshot: &SelectionSnapshot, origin: &str);
}

/// Weakly held observers
///
/// The session never keeps an observer alive; entries whose observer was
/// dropped are pruned on the next notification.
#[derive(Default)]
pub struct ObserverSet {
    entries: Vec<Weak<dyn SelectionObserver>>,
}

impl std::fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverSet")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, observer: &Arc<dyn SelectionObserver>) {
        self.entries.push(Arc::downgrade(observer));
    }

    /// Number of observers still alive
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|w| w.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `snapshot` to every live observer except the publisher
    /// itself; returns how many were notified
    pub fn notify(&mut self, snapshot: &SelectionSnapshot, origin: &str) -> usize {
        self.entries.retain(|w| w.strong_count() > 0);
        let mut delivered = 0;
        for observer in self.entries.iter().filter_map(Weak::upgrade) {
            if observer.owner() == origin {
                continue;
            }
            observer.on_selection(snapshot, origin);
            delivered += 1;
        }
        delivered
    }
}
