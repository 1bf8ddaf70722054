use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use presence_core::AttendanceState;

type Listener = Arc<dyn Fn(&AttendanceState) + Send + Sync>;

#[derive(Default)]
struct WatchInner {
    latest: AttendanceState,
    listeners: BTreeMap<u64, Listener>,
    next_id: u64,
}

/// Latest known ledger state plus change listeners.
///
/// Owned by the service registry and handed out by clone; there is no global
/// instance.
#[derive(Clone, Default)]
pub struct StateWatch {
    inner: Arc<Mutex<WatchInner>>,
}

/// Removes its listener when dropped or when `unsubscribe` is called.
#[must_use = "dropping the subscription removes the listener"]
pub struct Subscription {
    id: u64,
    inner: Weak<Mutex<WatchInner>>,
}

fn lock(inner: &Mutex<WatchInner>) -> MutexGuard<'_, WatchInner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl StateWatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> AttendanceState {
        lock(&self.inner).latest.clone()
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.inner).listeners.len()
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&AttendanceState) + Send + Sync + 'static,
    ) -> Subscription {
        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.insert(id, Arc::new(listener));
        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Stores `state` and notifies listeners if it differs from the latest one.
    /// Returns whether listeners were notified.
    pub fn publish(&self, state: AttendanceState) -> bool {
        let listeners: Vec<Listener> = {
            let mut inner = lock(&self.inner);
            if inner.latest == state {
                return false;
            }
            inner.latest = state.clone();
            inner.listeners.values().cloned().collect()
        };
        for listener in listeners {
            listener(&state);
        }
        true
    }
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            lock(&inner).listeners.remove(&self.id);
        }
    }
}
