use crate::consensus::DatumStore;
use crate::notifier::listener::{DatumListener, ListenerId, ListenerRegistry};
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    Change,
    Delete,
}

#[derive(Debug)]
struct Task {
    key: String,
    action: Action,
}

pub(crate) fn create(logger: slog::Logger, capacity: usize, datums: DatumStore) -> (Notifier, NotifierTask) {
    let (sender, receiver) = mpsc::channel(capacity);
    let pending = Arc::new(Mutex::new(HashSet::new()));
    let listeners = ListenerRegistry::default();

    let notifier = Notifier {
        logger: logger.clone(),
        sender,
        pending: pending.clone(),
        listeners: listeners.clone(),
    };
    let task = NotifierTask {
        logger,
        receiver,
        pending,
        listeners,
        datums,
    };

    (notifier, task)
}

/// Producer side. Cheap to clone.
#[derive(Clone)]
pub(crate) struct Notifier {
    logger: slog::Logger,
    sender: mpsc::Sender<Task>,
    // Keys with a CHANGE task sitting in the queue.
    pending: Arc<Mutex<HashSet<String>>>,
    listeners: ListenerRegistry,
}

impl Notifier {
    /// Never blocks. A CHANGE for a key that already has one queued is dropped, because the
    /// consumer reads the latest value when it dispatches. DELETE is always queued.
    pub(crate) fn add_task(&self, key: &str, action: Action) {
        if action == Action::Change && !self.lock_pending().insert(key.to_string()) {
            return;
        }

        let task = Task {
            key: key.to_string(),
            action,
        };
        match self.sender.try_send(task) {
            Ok(()) => {}
            Err(TrySendError::Full(task)) => {
                slog::error!(
                    self.logger,
                    "Notifier queue full. Dropping {:?} for key {}",
                    task.action,
                    task.key
                );
                self.forget_pending(&task);
            }
            Err(TrySendError::Closed(task)) => {
                slog::debug!(self.logger, "Notifier stopped. Dropping {:?} for key {}", task.action, task.key);
                self.forget_pending(&task);
            }
        }
    }

    pub(crate) fn listen(&self, listener: Arc<dyn DatumListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    pub(crate) fn unlisten(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    fn forget_pending(&self, task: &Task) {
        if task.action == Action::Change {
            self.lock_pending().remove(&task.key);
        }
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Consumer side: one task draining the queue in submission order. Exits once every `Notifier`
/// is dropped and the queue is empty.
pub(crate) struct NotifierTask {
    logger: slog::Logger,
    receiver: mpsc::Receiver<Task>,
    pending: Arc<Mutex<HashSet<String>>>,
    listeners: ListenerRegistry,
    datums: DatumStore,
}

impl NotifierTask {
    pub(crate) async fn run(mut self) {
        while let Some(task) = self.receiver.recv().await {
            self.dispatch(task);
        }
        slog::info!(self.logger, "Notifier exiting");
    }

    fn dispatch(&self, task: Task) {
        let value = match task.action {
            Action::Change => {
                // Clear before reading, so a write that lands after this read queues a new task.
                self.pending
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&task.key);
                match self.datums.get(&task.key) {
                    Some(datum) => Some(datum.value),
                    None => {
                        slog::debug!(self.logger, "Key {} is gone. Skipping change notification.", task.key);
                        return;
                    }
                }
            }
            Action::Delete => None,
        };

        for (id, listener) in self.listeners.snapshot() {
            if !listener.interests(&task.key) {
                continue;
            }

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| match &value {
                Some(value) => listener.on_change(&task.key, value),
                None => listener.on_delete(&task.key),
            }));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => slog::error!(
                    self.logger,
                    "Listener {:?} failed {:?} for key {}: {}",
                    id,
                    task.action,
                    task.key,
                    e
                ),
                Err(_) => slog::error!(
                    self.logger,
                    "Listener {:?} panicked on {:?} for key {}",
                    id,
                    task.action,
                    task.key
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::Datum;
    use crate::notifier::ListenerError;

    #[derive(Debug, Clone, PartialEq)]
    enum Seen {
        Change(String, String),
        Delete(String),
    }

    #[derive(Default)]
    struct RecordingListener {
        prefix: String,
        seen: Mutex<Vec<Seen>>,
    }

    impl RecordingListener {
        fn new(prefix: &str) -> Arc<Self> {
            Arc::new(RecordingListener {
                prefix: prefix.to_string(),
                seen: Mutex::new(vec![]),
            })
        }

        fn seen(&self) -> Vec<Seen> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl DatumListener for RecordingListener {
        fn interests(&self, key: &str) -> bool {
            key.starts_with(&self.prefix)
        }

        fn on_change(&self, key: &str, value: &str) -> Result<(), ListenerError> {
            self.seen.lock().unwrap().push(Seen::Change(key.into(), value.into()));
            Ok(())
        }

        fn on_delete(&self, key: &str) -> Result<(), ListenerError> {
            self.seen.lock().unwrap().push(Seen::Delete(key.into()));
            Ok(())
        }
    }

    struct FailingListener {
        panic: bool,
    }

    impl DatumListener for FailingListener {
        fn interests(&self, _key: &str) -> bool {
            true
        }

        fn on_change(&self, _key: &str, _value: &str) -> Result<(), ListenerError> {
            if self.panic {
                panic!("listener blew up");
            }
            Err("listener failed".into())
        }

        fn on_delete(&self, _key: &str) -> Result<(), ListenerError> {
            Err("listener failed".into())
        }
    }

    fn logger() -> slog::Logger {
        slog::Logger::root(slog::Discard, slog::o!())
    }

    fn datum(key: &str, value: &str, timestamp: u64) -> Datum {
        Datum {
            key: key.into(),
            value: value.into(),
            timestamp,
        }
    }

    /// Drop the producer and let the consumer drain everything.
    async fn drain(notifier: Notifier, task: NotifierTask) {
        drop(notifier);
        tokio::time::timeout(std::time::Duration::from_secs(5), task.run())
            .await
            .expect("notifier should drain");
    }

    #[tokio::test]
    async fn change_notifications_coalesce_to_latest_value() {
        let datums = DatumStore::new();
        let (notifier, task) = create(logger(), 16, datums.clone());
        let listener = RecordingListener::new("");
        notifier.listen(listener.clone());

        datums.insert(datum("svc:x", "v1", 1));
        notifier.add_task("svc:x", Action::Change);
        datums.insert(datum("svc:x", "v2", 2));
        notifier.add_task("svc:x", Action::Change);

        drain(notifier, task).await;

        assert_eq!(listener.seen(), vec![Seen::Change("svc:x".into(), "v2".into())]);
    }

    #[tokio::test]
    async fn deletes_are_never_coalesced() {
        let datums = DatumStore::new();
        let (notifier, task) = create(logger(), 16, datums.clone());
        let listener = RecordingListener::new("");
        notifier.listen(listener.clone());

        notifier.add_task("svc:x", Action::Delete);
        notifier.add_task("svc:x", Action::Delete);

        drain(notifier, task).await;

        assert_eq!(
            listener.seen(),
            vec![Seen::Delete("svc:x".into()), Seen::Delete("svc:x".into())]
        );
    }

    #[tokio::test]
    async fn change_for_removed_key_is_skipped() {
        let datums = DatumStore::new();
        let (notifier, task) = create(logger(), 16, datums.clone());
        let listener = RecordingListener::new("");
        notifier.listen(listener.clone());

        datums.insert(datum("svc:x", "v1", 1));
        notifier.add_task("svc:x", Action::Change);
        datums.remove("svc:x");
        notifier.add_task("svc:x", Action::Delete);

        drain(notifier, task).await;

        assert_eq!(listener.seen(), vec![Seen::Delete("svc:x".into())]);
    }

    #[tokio::test]
    async fn failing_listeners_are_isolated() {
        let datums = DatumStore::new();
        let (notifier, task) = create(logger(), 16, datums.clone());
        notifier.listen(Arc::new(FailingListener { panic: true }));
        notifier.listen(Arc::new(FailingListener { panic: false }));
        let listener = RecordingListener::new("svc:");
        notifier.listen(listener.clone());

        datums.insert(datum("svc:x", "v1", 1));
        datums.insert(datum("other", "o", 1));
        notifier.add_task("svc:x", Action::Change);
        notifier.add_task("other", Action::Change);
        notifier.add_task("svc:x", Action::Delete);

        drain(notifier, task).await;

        assert_eq!(
            listener.seen(),
            vec![
                Seen::Change("svc:x".into(), "v1".into()),
                Seen::Delete("svc:x".into()),
            ]
        );
    }

    #[tokio::test]
    async fn unlisten_stops_delivery() {
        let datums = DatumStore::new();
        let (notifier, task) = create(logger(), 16, datums.clone());
        let kept = RecordingListener::new("");
        let removed = RecordingListener::new("");
        notifier.listen(kept.clone());
        let removed_id = notifier.listen(removed.clone());

        assert!(notifier.unlisten(removed_id));
        assert!(!notifier.unlisten(removed_id));
        notifier.add_task("svc:x", Action::Delete);

        drain(notifier, task).await;

        assert_eq!(kept.seen(), vec![Seen::Delete("svc:x".into())]);
        assert!(removed.seen().is_empty());
    }

    #[tokio::test]
    async fn full_queue_drops_task_and_clears_pending() {
        let datums = DatumStore::new();
        let (notifier, task) = create(logger(), 1, datums.clone());
        let listener = RecordingListener::new("");
        notifier.listen(listener.clone());
        datums.insert(datum("a", "1", 1));
        datums.insert(datum("b", "1", 1));

        notifier.add_task("a", Action::Change);
        // Queue is full: dropped, and "b" must not be left marked as pending.
        notifier.add_task("b", Action::Change);
        assert!(!notifier.lock_pending().contains("b"));

        drain(notifier, task).await;

        assert_eq!(listener.seen(), vec![Seen::Change("a".into(), "1".into())]);
    }
}
