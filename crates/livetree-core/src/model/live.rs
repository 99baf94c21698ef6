//! The running application as seen by the child-source trackers
//!
//! The host owns the live UI objects and their change feeds. Trackers only
//! see `LiveId`s, the static facts in `LiveInfo`, and `FeedEvent`s that the
//! host routes back to the model by `SubscriptionId`.

use super::ids::{LiveId, SubscriptionId};

/// Kinds of popup-like overlays a live object can host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PopupSourceKind {
    ContextMenu,
    ContextFlyout,
    AttachedFlyout,
    ToolTip,
    ButtonFlyout,
}

impl PopupSourceKind {
    /// Resolution order used when several sources are declared at once
    pub const PRIORITY: [PopupSourceKind; 5] = [
        PopupSourceKind::ContextMenu,
        PopupSourceKind::ContextFlyout,
        PopupSourceKind::AttachedFlyout,
        PopupSourceKind::ToolTip,
        PopupSourceKind::ButtonFlyout,
    ];
}

/// Which popup sources are currently declared on a live object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopupSources {
    declared: Vec<PopupSourceKind>,
}

impl PopupSources {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: PopupSourceKind) -> Self {
        if !self.declared.contains(&kind) {
            self.declared.push(kind);
        }
        self
    }

    /// Highest-priority declared source
    pub fn active(&self) -> Option<PopupSourceKind> {
        PopupSourceKind::PRIORITY
            .into_iter()
            .find(|k| self.declared.contains(k))
    }
}

/// Static facts about one live object
#[derive(Debug, Clone, Default)]
pub struct LiveInfo {
    /// Declared runtime type name, e.g. `Button`
    pub type_name: String,
    /// Declared identifier, if any
    pub name: Option<String>,
    /// Object belongs to the inspector's own window
    pub inspector_owned: bool,
    /// Back-reference to the control whose template created this object
    pub templated_parent: Option<LiveId>,
    /// Part name declared in that template
    pub part_name: Option<String>,
    /// Object was instantiated from a markup document
    pub markup_backed: bool,
    /// Object stands for the application's top-level windows
    pub top_level_group: bool,
    pub popup_sources: PopupSources,
}

impl LiveInfo {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn markup(mut self) -> Self {
        self.markup_backed = true;
        self
    }
}

/// Feed a tracker subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    /// Ordered logical children collection
    LogicalChildren,
    /// Open top-level windows, for a top-level group root
    TopLevels,
    /// Rendered (visual) children of the owner
    VisualChildren,
    /// Popup source switching and popup host open/close
    Popup(PopupSourceKind),
    /// Declared popup sources of the owner
    PopupSources,
}

/// A live subscription plus the feed's items at subscription time
#[derive(Debug, Clone)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub items: Vec<LiveId>,
}

/// One change notification from a host feed
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Inserted { index: usize, items: Vec<LiveId> },
    Removed { items: Vec<LiveId> },
    Reset { items: Vec<LiveId> },
    PopupSourcesChanged(PopupSources),
    PopupOpened(LiveId),
    PopupClosed,
}

/// Host-side capabilities the trackers consume
///
/// `subscribe` returns `None` when the live object lacks the capability the
/// feed needs; that is "not applicable", not an error.
pub trait LiveHost {
    fn info(&self, live: LiveId) -> Option<LiveInfo>;

    fn subscribe(&mut self, live: LiveId, feed: FeedKind) -> Option<Subscription>;

    fn unsubscribe(&mut self, subscription: SubscriptionId);
}
