use crate::consensus::datum::Datum;
use crate::consensus::peers::Peer;
use crate::consensus::term::Term;
use crate::persistence::PersistenceError;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug)]
pub(crate) struct PublishInput {
    pub(crate) key: String,
    pub(crate) value: String,
    pub(crate) locked: bool,
}

#[derive(Debug)]
pub(crate) struct PublishOutput {
    pub(crate) timestamp: u64,
    /// Present for locked publishes. The caller awaits it outside the actor.
    pub(crate) quorum: Option<QuorumWaiter>,
}

/// A datum pushed from the leader to a follower.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PublishRequest {
    pub(crate) datum: Datum,
    pub(crate) source: Peer,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DeleteRequest {
    pub(crate) key: String,
    pub(crate) source: Peer,
}

/// Errors of the local (leader-side) write path.
#[derive(thiserror::Error, Debug)]
pub(crate) enum LocalWriteError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("I'm not leader")]
    NotLeader { leader: Option<String> },
    #[error("Failed to persist write")]
    Persistence(#[from] PersistenceError),
    #[error("Replica actor is dead RIP")]
    ActorExited,
}

/// Why a peer refused a request. This is also the vocabulary used on the wire.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub(crate) enum Rejection {
    #[error("Sender is not in the cluster")]
    UnknownPeer,
    #[error("Receiver hasn't finished loading its data")]
    NotInitialized,
    #[error("Receiver doesn't recognize the sender as leader (leader: {leader:?})")]
    NotLeader { leader: Option<String> },
    #[error("Sender's term is out of date. Receiver is at term {current_term:?}")]
    StaleTerm { current_term: Term },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Cluster is in a tough shape. No one is leader.")]
    NoLeader,
    #[error("Only {acked} of {required} peers acknowledged in time")]
    QuorumTimeout { acked: usize, required: usize },
    #[error("Server fault: {0}")]
    ServerFault(String),
}

impl From<LocalWriteError> for Rejection {
    fn from(e: LocalWriteError) -> Self {
        match e {
            LocalWriteError::InvalidInput(message) => Rejection::InvalidInput(message),
            LocalWriteError::NotLeader { leader } => Rejection::NotLeader { leader },
            LocalWriteError::Persistence(e) => Rejection::ServerFault(e.to_string()),
            LocalWriteError::ActorExited => Rejection::ServerFault("Replica actor exited".to_string()),
        }
    }
}

/// Counts acknowledgements of a locked publish. Broadcast tasks hold the senders; each successful
/// apply on a remote peer sends one unit.
#[derive(Debug)]
pub(crate) struct QuorumWaiter {
    acks: mpsc::Receiver<()>,
    required: usize,
}

impl QuorumWaiter {
    pub(crate) fn new(acks: mpsc::Receiver<()>, required: usize) -> Self {
        QuorumWaiter { acks, required }
    }

    /// Resolves once `required` acks arrived. Fails on timeout, or as soon as every broadcast
    /// finished without enough acks.
    pub(crate) async fn wait(mut self, timeout: Duration) -> Result<(), Rejection> {
        let required = self.required;
        let mut acked = 0;

        let counting = async {
            while acked < required {
                match self.acks.recv().await {
                    Some(()) => acked += 1,
                    None => break,
                }
            }
        };
        let _ = tokio::time::timeout(timeout, counting).await;

        if acked >= required {
            Ok(())
        } else {
            Err(Rejection::QuorumTimeout { acked, required })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn quorum_reached() {
        let (tx, rx) = mpsc::channel(4);
        let waiter = QuorumWaiter::new(rx, 2);
        tx.send(()).await.unwrap();
        tx.send(()).await.unwrap();

        waiter.wait(Duration::from_secs(5)).await.unwrap();
    }

    #[tokio::test]
    async fn zero_required_resolves_immediately() {
        let (_tx, rx) = mpsc::channel(1);
        QuorumWaiter::new(rx, 0).wait(Duration::from_millis(1)).await.unwrap();
    }

    #[tokio::test]
    async fn fails_fast_when_all_broadcasts_finish_short() {
        let (tx, rx) = mpsc::channel(4);
        let waiter = QuorumWaiter::new(rx, 2);
        tx.send(()).await.unwrap();
        drop(tx);

        let result = tokio::time::timeout(Duration::from_secs(5), waiter.wait(Duration::from_secs(60)))
            .await
            .expect("should not wait for the full quorum timeout");

        assert_eq!(result, Err(Rejection::QuorumTimeout { acked: 1, required: 2 }));
    }

    #[tokio::test]
    async fn times_out() {
        let (_tx, rx) = mpsc::channel(4);
        let result = QuorumWaiter::new(rx, 1).wait(Duration::from_millis(20)).await;

        assert_eq!(result, Err(Rejection::QuorumTimeout { acked: 0, required: 1 }));
    }
}
