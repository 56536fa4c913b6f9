//! # Listener Registry
//!
//! Ordered list of state listeners with drop-to-unsubscribe handles.
//! Listeners are called in registration order. The registry lock is never
//! held while a listener runs, so a listener may subscribe, unsubscribe or
//! read the session from inside its callback.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::state::SessionState;

/// A state listener.
pub type Listener = Arc<dyn Fn(&SessionState) + Send + Sync>;

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

impl ListenerRegistry {
    pub(crate) fn insert(&mut self, listener: Listener) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Clone the current listeners, in registration order.
    pub(crate) fn snapshot(&self) -> Vec<Listener> {
        self.entries.iter().map(|(_, l)| Arc::clone(l)).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Handle returned by [`crate::SessionManager::subscribe`].
///
/// Dropping the handle unsubscribes the listener. Use [`Subscription::detach`]
/// to keep it registered for the manager's lifetime.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<ListenerRegistry>>,
    detached: bool,
}

impl Subscription {
    pub(crate) fn new(id: u64, registry: &Arc<Mutex<ListenerRegistry>>) -> Self {
        Self {
            id,
            registry: Arc::downgrade(registry),
            detached: false,
        }
    }

    /// Stop receiving state updates.
    pub fn unsubscribe(self) {
        // Drop does the work.
    }

    /// Keep the listener registered after this handle is gone.
    pub fn detach(mut self) {
        self.detached = true;
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("detached", &self.detached)
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.detached {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().remove(self.id);
        }
    }
}
