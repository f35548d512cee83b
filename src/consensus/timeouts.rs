use rand::Rng;
use std::time::Duration;

/// Timeouts drives the countdown values on the local peer. Countdowns are plain millisecond
/// counters that the tick scheduler decrements, so we hand out i64 millis instead of Instants.
#[derive(Clone, Debug)]
pub(crate) struct Timeouts {
    pub(crate) leader_timeout: Duration,
    pub(crate) leader_timeout_jitter: Duration,
    pub(crate) heartbeat_interval: Duration,
}

impl Timeouts {
    /// Fresh election countdown: base timeout plus random jitter.
    pub(crate) fn leader_due_ms(&self) -> i64 {
        let jitter = rand::thread_rng().gen_range(0..=millis(self.leader_timeout_jitter));
        millis(self.leader_timeout) + jitter
    }

    pub(crate) fn heartbeat_due_ms(&self) -> i64 {
        millis(self.heartbeat_interval)
    }

    /// Starting countdowns are spread over a whole period so a freshly booted cluster doesn't
    /// have every node time out on the same tick.
    pub(crate) fn initial_leader_due_ms(&self) -> i64 {
        rand::thread_rng().gen_range(0..=millis(self.leader_timeout))
    }

    pub(crate) fn initial_heartbeat_due_ms(&self) -> i64 {
        rand::thread_rng().gen_range(0..=millis(self.heartbeat_interval))
    }
}

pub(crate) fn millis(duration: Duration) -> i64 {
    duration.as_millis() as i64
}
