use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Raises the flag when dropped. Every `StopCheck` cloned from the same pair sees it.
pub(super) struct Stopper {
    stop_signal: Arc<AtomicBool>,
}

#[derive(Clone)]
pub(super) struct StopCheck {
    stop_signal: Arc<AtomicBool>,
}

impl Drop for Stopper {
    fn drop(&mut self) {
        self.stop_signal.store(true, Ordering::Release);
    }
}

impl StopCheck {
    pub(super) fn should_stop(&self) -> bool {
        self.stop_signal.load(Ordering::Acquire)
    }
}

pub(super) fn new() -> (Stopper, StopCheck) {
    let stop_signal = Arc::new(AtomicBool::new(false));

    (
        Stopper {
            stop_signal: stop_signal.clone(),
        },
        StopCheck { stop_signal },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropping_stopper_stops_every_check() {
        let (stopper, check) = new();
        let other = check.clone();
        assert!(!check.should_stop());

        drop(stopper);

        assert!(check.should_stop());
        assert!(other.should_stop());
    }
}
