use tokio::time::Instant;

#[async_trait::async_trait]
pub(crate) trait Clock: Clone {
    fn now(&self) -> Instant;
    async fn sleep_until(&mut self, deadline: Instant);
}

#[derive(Copy, Clone)]
pub(crate) struct RealClock;

#[async_trait::async_trait]
impl Clock for RealClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now()
    }

    async fn sleep_until(&mut self, deadline: Instant) {
        tokio::time::sleep_until(deadline).await;
    }
}

#[cfg(test)]
pub(crate) use mock::mocked_clock;

#[cfg(test)]
mod mock {
    use super::Clock;
    use tokio::sync::watch;
    use tokio::time::{Duration, Instant};

    pub(crate) fn mocked_clock() -> (MockClock, MockClockController) {
        let now = Instant::now();
        let (tx, rx) = watch::channel(now);

        (
            MockClock { current_time: rx },
            MockClockController {
                current_time: tx,
                time_of_instantiation: now,
            },
        )
    }

    /// Only moves when the paired controller says so.
    #[derive(Clone)]
    pub(crate) struct MockClock {
        current_time: watch::Receiver<Instant>,
    }

    #[async_trait::async_trait]
    impl Clock for MockClock {
        fn now(&self) -> Instant {
            *self.current_time.borrow()
        }

        async fn sleep_until(&mut self, deadline: Instant) {
            while *self.current_time.borrow() < deadline {
                self.current_time.changed().await.expect("Controller dropped");
            }
        }
    }

    pub(crate) struct MockClockController {
        current_time: watch::Sender<Instant>,
        time_of_instantiation: Instant,
    }

    impl MockClockController {
        pub(crate) fn current_time(&self) -> Instant {
            *self.current_time.borrow()
        }

        pub(crate) fn elapsed_time(&self) -> Duration {
            self.current_time() - self.time_of_instantiation
        }

        /// A sleeper only learns that `now` is at or past its deadline. Jumping many periods at
        /// once wakes a periodic task late, and it catches up one period per wake. Step in small
        /// increments when the exact tick count matters.
        pub(crate) fn advance(&mut self, duration: Duration) {
            let new_now = *self.current_time.borrow() + duration;
            self.current_time.send(new_now).expect("MockClock dropped");
        }
    }
}
