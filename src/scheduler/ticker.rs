use crate::actor::{ActorExited, WeakActorClient};
use crate::scheduler::stop_signal;
use crate::scheduler::time::{Clock, RealClock};
use crate::scheduler::MemberSource;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

/// Keeps the periodic tasks alive. Dropping it stops all of them at their next wake.
pub(crate) struct TickerHandle {
    _to_drop: stop_signal::Stopper,
}

enum Tick {
    Election,
    Heartbeat,
    Members(Arc<dyn MemberSource>),
}

struct TickerTask<C: Clock> {
    logger: slog::Logger,
    tick: Tick,
    period: Duration,
    start: Instant,
    actor_client: WeakActorClient,
    clock: C,
    stop_check: stop_signal::StopCheck,
}

impl TickerHandle {
    pub(crate) fn spawn(
        logger: slog::Logger,
        period: Duration,
        actor_client: WeakActorClient,
        member_source: Option<Arc<dyn MemberSource>>,
    ) -> Self {
        Self::spawn_with_clock(logger, period, actor_client, member_source, RealClock)
    }

    fn spawn_with_clock<C: Clock + Send + Sync + 'static>(
        logger: slog::Logger,
        period: Duration,
        actor_client: WeakActorClient,
        member_source: Option<Arc<dyn MemberSource>>,
        clock: C,
    ) -> Self {
        let (stopper, stop_check) = stop_signal::new();
        let start = clock.now();

        let mut ticks = vec![Tick::Election, Tick::Heartbeat];
        if let Some(source) = member_source {
            ticks.push(Tick::Members(source));
        }
        for tick in ticks {
            let task = TickerTask {
                logger: logger.clone(),
                tick,
                period,
                start,
                actor_client: actor_client.clone(),
                clock: clock.clone(),
                stop_check: stop_check.clone(),
            };
            tokio::task::spawn(task.run());
        }

        TickerHandle { _to_drop: stopper }
    }
}

impl<C: Clock + Send + Sync + 'static> TickerTask<C> {
    async fn run(mut self) {
        // Wake times are anchored to `start`; a slow tick doesn't shift later ones.
        let mut next_wake = self.start;
        loop {
            next_wake += self.period;
            self.clock.sleep_until(next_wake).await;

            if self.stop_check.should_stop() {
                return;
            }
            if let Err(ActorExited) = self.fire().await {
                slog::debug!(self.logger, "Actor exited, ticker stopping");
                return;
            }
        }
    }

    async fn fire(&self) -> Result<(), ActorExited> {
        let elapsed_ms = self.period.as_millis() as i64;
        match &self.tick {
            Tick::Election => self.actor_client.election_tick(elapsed_ms).await,
            Tick::Heartbeat => self.actor_client.heartbeat_tick(elapsed_ms).await,
            Tick::Members(source) => match source.members().await {
                Ok(addresses) => self.actor_client.update_members(addresses).await,
                Err(e) => {
                    // Keep the current membership; next tick retries.
                    slog::warn!(self.logger, "Failed to refresh cluster members: {}", e);
                    Ok(())
                }
            },
        }
    }
}
