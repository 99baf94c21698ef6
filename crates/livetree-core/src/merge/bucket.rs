use crate::model::{BucketKind, LiveId, NodeId};

/// One (live child, runtime node) pair in a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketEntry {
    pub live: LiveId,
    pub node: NodeId,
    /// Insertion index (logical), visual index (template), always 0 (popup)
    pub position: usize,
}

/// Result of inserting into a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert {
    Added,
    /// The live child was already present; nothing changed
    AlreadyPresent,
    /// The single popup slot was occupied and has been replaced
    Replaced(BucketEntry),
}

/// Ordered children reported by one child source
///
/// At most one entry per live child. Logical entries keep the tracked
/// insertion order; template entries are kept in ascending visual index and
/// re-indexed on every insert and remove; the popup bucket holds at most one
/// entry and a new host replaces the previous one.
#[derive(Debug, Clone)]
pub struct ChildBucket {
    kind: BucketKind,
    entries: Vec<BucketEntry>,
}

impl ChildBucket {
    pub fn new(kind: BucketKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
        }
    }

    pub fn kind(&self) -> BucketKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, live: LiveId) -> bool {
        self.entries.iter().any(|e| e.live == live)
    }

    pub fn node_for(&self, live: LiveId) -> Option<NodeId> {
        self.entries.iter().find(|e| e.live == live).map(|e| e.node)
    }

    pub fn entries(&self) -> &[BucketEntry] {
        &self.entries
    }

    /// Runtime nodes in bucket order
    pub fn nodes(&self) -> Vec<NodeId> {
        self.entries.iter().map(|e| e.node).collect()
    }

    /// Insert `live` at `index` under this bucket's position rule
    pub fn insert(&mut self, index: usize, live: LiveId, node: NodeId) -> Insert {
        if self.contains(live) {
            return Insert::AlreadyPresent;
        }
        match self.kind {
            BucketKind::Logical => {
                let at = index.min(self.entries.len());
                self.entries.insert(
                    at,
                    BucketEntry {
                        live,
                        node,
                        position: at,
                    },
                );
                self.renumber_from(at);
                Insert::Added
            }
            BucketKind::Template => {
                let visual_index = index.min(self.entries.len());
                for entry in self.entries.iter_mut() {
                    if entry.position >= visual_index {
                        entry.position += 1;
                    }
                }
                let at = self
                    .entries
                    .iter()
                    .position(|e| e.position > visual_index)
                    .unwrap_or(self.entries.len());
                self.entries.insert(
                    at,
                    BucketEntry {
                        live,
                        node,
                        position: visual_index,
                    },
                );
                Insert::Added
            }
            BucketKind::Popup => {
                let previous = self.entries.pop();
                self.entries.push(BucketEntry {
                    live,
                    node,
                    position: 0,
                });
                match previous {
                    Some(entry) => Insert::Replaced(entry),
                    None => Insert::Added,
                }
            }
        }
    }

    /// Remove `live`; unknown children are a no-op
    pub fn remove(&mut self, live: LiveId) -> Option<BucketEntry> {
        let at = self.entries.iter().position(|e| e.live == live)?;
        let removed = self.entries.remove(at);
        match self.kind {
            BucketKind::Logical => self.renumber_from(at),
            BucketKind::Template => {
                for entry in self.entries.iter_mut() {
                    if entry.position > removed.position {
                        entry.position -= 1;
                    }
                }
            }
            BucketKind::Popup => {}
        }
        Some(removed)
    }

    /// Remove every entry, returning them in bucket order
    pub fn clear(&mut self) -> Vec<BucketEntry> {
        std::mem::take(&mut self.entries)
    }

    fn renumber_from(&mut self, from: usize) {
        for (i, entry) in self.entries.iter_mut().enumerate().skip(from) {
            entry.position = i;
        }
    }
}
