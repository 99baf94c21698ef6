//! Selection-broadcast exclusivity
//!
//! One [`SelectionCoordinator`] exists per inspector session and is handed to
//! every selection observer (tree, property panel, source preview). At most
//! one owner may publish at a time; the same owner may re-enter, and every
//! grant carries a [`PublishToken`] that gives the right back when dropped.
//! The lock is only held inside these calls, never across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::errors::{LiveTreeError, Result};
use crate::model::SelectionSnapshot;

#[derive(Debug, Default)]
struct State {
    /// Active owner and its reentrancy depth; `None` is idle
    publisher: Option<(String, usize)>,
    current: SelectionSnapshot,
}

/// Answer to a publish request
///
/// A refused request carries no token and `changed == false`.
#[derive(Debug)]
pub struct PublishGrant {
    pub token: Option<PublishToken>,
    /// True if the published snapshot differs from the previous one
    pub changed: bool,
}

impl PublishGrant {
    fn refused() -> Self {
        Self {
            token: None,
            changed: false,
        }
    }

    pub fn granted(&self) -> bool {
        self.token.is_some()
    }

    /// Token only when granted and the selection actually changed
    pub fn into_changed_token(self) -> Option<PublishToken> {
        if self.changed {
            self.token
        } else {
            None
        }
    }
}

/// Gatekeeper for selection broadcasts
///
/// Cloning yields another handle onto the same publisher slot.
#[derive(Debug, Clone, Default)]
pub struct SelectionCoordinator {
    state: Arc<Mutex<State>>,
}

impl SelectionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask to publish `selection` as `owner`
    ///
    /// Granted when idle or when `owner` already publishes (depth + 1). A
    /// different owner is refused outright and nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOwner` for a blank owner id.
    pub fn try_begin_publish(&self, owner: &str, selection: SelectionSnapshot) -> Result<PublishGrant> {
        if owner.trim().is_empty() {
            return Err(LiveTreeError::InvalidOwner {
                owner: owner.to_string(),
            });
        }

        let mut state = self.lock();
        if let Some((active, depth)) = state.publisher.as_mut() {
            if active.as_str() != owner {
                tracing::debug!(
                    component = module_path!(),
                    owner,
                    active = active.as_str(),
                    "publish refused"
                );
                return Ok(PublishGrant::refused());
            }
            *depth += 1;
        } else {
            state.publisher = Some((owner.to_string(), 1));
        }

        let changed = state.current != selection;
        state.current = selection;
        drop(state);

        Ok(PublishGrant {
            token: Some(PublishToken {
                state: Arc::clone(&self.state),
                owner: owner.to_string(),
                released: false,
            }),
            changed,
        })
    }

    /// Whether `selection` equals the last published snapshot
    pub fn is_current(&self, selection: &SelectionSnapshot) -> bool {
        self.lock().current == *selection
    }

    pub fn current(&self) -> SelectionSnapshot {
        self.lock().current.clone()
    }

    pub fn active_owner(&self) -> Option<String> {
        self.lock().publisher.as_ref().map(|(o, _)| o.clone())
    }

    pub fn depth(&self) -> usize {
        self.lock().publisher.as_ref().map(|(_, d)| *d).unwrap_or(0)
    }
}

/// Scoped right to broadcast a selection change
///
/// Released on drop; `release` may also be called explicitly and is
/// idempotent.
#[derive(Debug)]
pub struct PublishToken {
    state: Arc<Mutex<State>>,
    owner: String,
    released: bool,
}

impl PublishToken {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((owner, depth)) = &mut state.publisher {
            if *owner == self.owner {
                *depth = depth.saturating_sub(1);
                if *depth == 0 {
                    state.publisher = None;
                }
            }
        }
    }
}

impl Drop for PublishToken {
    fn drop(&mut self) {
        self.release();
    }
}
