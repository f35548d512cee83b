use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

pub type ListenerError = Box<dyn Error + Send + Sync>;

/// DatumListener is how the layers above the store learn about replicated changes. Callbacks run
/// on the notifier's single consumer task, so they should return quickly. Errors and panics are
/// logged and don't affect other listeners.
pub trait DatumListener: Send + Sync + 'static {
    /// Interest predicate. Only matching keys are delivered.
    fn interests(&self, key: &str) -> bool;

    /// `value` is the latest value at delivery time, not necessarily the one that triggered the
    /// notification.
    fn on_change(&self, key: &str, value: &str) -> Result<(), ListenerError>;

    fn on_delete(&self, key: &str) -> Result<(), ListenerError>;
}

/// Handle returned by `listen()`, used to unregister.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Clone, Default)]
pub(super) struct ListenerRegistry {
    next_id: Arc<AtomicU64>,
    listeners: Arc<RwLock<Vec<(ListenerId, Arc<dyn DatumListener>)>>>,
}

impl ListenerRegistry {
    pub(super) fn add(&self, listener: Arc<dyn DatumListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));

        id
    }

    pub(super) fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);

        listeners.len() != before
    }

    /// Copy of the current listeners, so callbacks run without holding the lock.
    pub(super) fn snapshot(&self) -> Vec<(ListenerId, Arc<dyn DatumListener>)> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
