use serde::{Deserialize, Serialize};

/// Opaque identity of one live UI object, as assigned by the host
///
/// Two `LiveId`s are equal iff they refer to the same live object; the
/// inspector never dereferences them itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LiveId(pub u64);

impl std::fmt::Display for LiveId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "live#{}", self.0)
    }
}

/// Handle of a `RuntimeNode` inside a `NodeStore`
///
/// Handles are never reused within one store, so a handle that outlived its
/// node simply fails to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Handle of one host feed subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);
