use crate::consensus::{EngineOptions, Timeouts};
use std::convert::TryFrom;
use tokio::time::Duration;

#[derive(Clone, Default, Debug)]
pub struct ConsensusOptions {
    /// How often the election, heartbeat and member refresh tasks run.
    pub tick_period: Option<Duration>,
    /// A follower that hasn't heard a beat for this long (plus jitter) starts an election.
    pub leader_timeout: Option<Duration>,
    pub leader_timeout_jitter: Option<Duration>,
    pub heartbeat_interval: Option<Duration>,
    /// How long a locked publish waits for a majority of acks.
    pub publish_timeout: Option<Duration>,
    pub rpc_timeout: Option<Duration>,
    /// Max keys per fetch when a follower pulls stale datums after a beat.
    pub fetch_batch_size: Option<usize>,
    /// Beats whose JSON payload is larger than this many bytes are gzip'd.
    pub beat_compression_threshold: Option<usize>,
    pub notifier_queue_capacity: Option<usize>,
    /// Beats carry no digest and receivers skip anti-entropy.
    pub beat_only: Option<bool>,
}

#[derive(Clone, Debug)]
pub(crate) struct ConsensusOptionsValidated {
    pub(crate) tick_period: Duration,
    pub(crate) leader_timeout: Duration,
    pub(crate) leader_timeout_jitter: Duration,
    pub(crate) heartbeat_interval: Duration,
    pub(crate) publish_timeout: Duration,
    pub(crate) rpc_timeout: Duration,
    pub(crate) fetch_batch_size: usize,
    pub(crate) beat_compression_threshold: usize,
    pub(crate) notifier_queue_capacity: usize,
    pub(crate) beat_only: bool,
}

impl ConsensusOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        if self.heartbeat_interval >= self.leader_timeout {
            return Err("Leader timeout must be greater than the heartbeat interval");
        }
        if self.tick_period > self.heartbeat_interval {
            return Err("Tick period must not exceed the heartbeat interval");
        }
        if self.tick_period.as_millis() == 0 || self.heartbeat_interval.as_millis() == 0 {
            return Err("Tick period and heartbeat interval must be at least 1ms");
        }
        if self.publish_timeout == Duration::from_millis(0) || self.rpc_timeout == Duration::from_millis(0) {
            return Err("Publish and RPC timeouts must be non-zero");
        }
        if self.fetch_batch_size == 0 || self.beat_compression_threshold == 0 || self.notifier_queue_capacity == 0 {
            return Err("Fetch batch size, compression threshold and notifier capacity must be non-zero");
        }

        Ok(())
    }

    pub(crate) fn timeouts(&self) -> Timeouts {
        Timeouts {
            leader_timeout: self.leader_timeout,
            leader_timeout_jitter: self.leader_timeout_jitter,
            heartbeat_interval: self.heartbeat_interval,
        }
    }

    pub(crate) fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            fetch_batch_size: self.fetch_batch_size,
            beat_compression_threshold: self.beat_compression_threshold,
            beat_only: self.beat_only,
        }
    }
}

impl TryFrom<ConsensusOptions> for ConsensusOptionsValidated {
    type Error = &'static str;

    fn try_from(options: ConsensusOptions) -> Result<Self, Self::Error> {
        let values = ConsensusOptionsValidated {
            tick_period: options.tick_period.unwrap_or(Duration::from_millis(500)),
            leader_timeout: options.leader_timeout.unwrap_or(Duration::from_secs(15)),
            leader_timeout_jitter: options.leader_timeout_jitter.unwrap_or(Duration::from_secs(5)),
            heartbeat_interval: options.heartbeat_interval.unwrap_or(Duration::from_secs(5)),
            publish_timeout: options.publish_timeout.unwrap_or(Duration::from_secs(5)),
            rpc_timeout: options.rpc_timeout.unwrap_or(Duration::from_secs(2)),
            fetch_batch_size: options.fetch_batch_size.unwrap_or(50),
            beat_compression_threshold: options.beat_compression_threshold.unwrap_or(1024),
            notifier_queue_capacity: options.notifier_queue_capacity.unwrap_or(1024 * 1024),
            beat_only: options.beat_only.unwrap_or(false),
        };

        values.validate()?;
        Ok(values)
    }
}
