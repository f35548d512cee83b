use crate::actor::ActorExited;
use crate::consensus::{LocalWriteError, Peer, PeerState, Rejection};
use crate::proxy::ProxyError;

/// The local node's view of itself.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PeerInfo {
    pub address: String,
    pub term: u64,
    pub state: PeerState,
    pub vote_for: Option<String>,
}

#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum WriteError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Can be retried after a short delay. Likely an election is in progress.
    #[error("Cluster is in a tough shape. No one is leader.")]
    NoLeader,

    /// Only returned for writes another node forwarded to us. Client writes are forwarded instead.
    #[error("I'm not leader. Leader is {leader:?}")]
    NotLeader { leader: Option<String> },

    /// The write is applied on the leader and stays applied. Followers that missed it catch up
    /// through anti-entropy.
    #[error("Only {acked} of {required} followers acknowledged the write in time")]
    QuorumTimeout { acked: usize, required: usize },

    #[error("Failed to persist write: {0}")]
    Persistence(String),

    #[error("Leader {leader} is unreachable: {message}")]
    LeaderUnreachable { leader: String, message: String },

    #[error("Leader rejected the write: {0}")]
    LeaderRejected(String),

    // Replica logic runs on a background task. This error is returned if the task has exited.
    #[error("Replica task has exited")]
    ReplicaExited,
}

/// Replica logic runs on a background task. This error is returned if the task has exited.
#[derive(Clone, Copy, Debug, thiserror::Error, Eq, PartialEq)]
#[error("Replica task has exited")]
pub struct ReplicaExited;

// ------- Conversions --------

impl From<Peer> for PeerInfo {
    fn from(peer: Peer) -> Self {
        PeerInfo {
            address: peer.address,
            term: peer.term.as_u64(),
            state: peer.state,
            vote_for: peer.vote_for,
        }
    }
}

impl From<ActorExited> for ReplicaExited {
    fn from(_: ActorExited) -> Self {
        ReplicaExited
    }
}

impl From<LocalWriteError> for WriteError {
    fn from(internal_error: LocalWriteError) -> Self {
        match internal_error {
            LocalWriteError::InvalidInput(message) => WriteError::InvalidInput(message),
            LocalWriteError::NotLeader { leader: None } => WriteError::NoLeader,
            LocalWriteError::NotLeader { leader } => WriteError::NotLeader { leader },
            LocalWriteError::Persistence(e) => WriteError::Persistence(e.to_string()),
            LocalWriteError::ActorExited => WriteError::ReplicaExited,
        }
    }
}

/// A rejection coming back from the leader, or from our own quorum wait.
impl From<Rejection> for WriteError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::InvalidInput(message) => WriteError::InvalidInput(message),
            Rejection::NoLeader | Rejection::NotLeader { leader: None } => WriteError::NoLeader,
            Rejection::NotLeader { leader } => WriteError::NotLeader { leader },
            Rejection::QuorumTimeout { acked, required } => WriteError::QuorumTimeout { acked, required },
            Rejection::ServerFault(message) => WriteError::LeaderRejected(message),
            other => WriteError::LeaderRejected(other.to_string()),
        }
    }
}

impl From<ProxyError> for WriteError {
    fn from(proxy_error: ProxyError) -> Self {
        match proxy_error {
            ProxyError::NoLeader => WriteError::NoLeader,
            ProxyError::SelfIsLeader => WriteError::LeaderRejected("Local node is leader; nothing to forward".to_string()),
            ProxyError::LeaderRejected { rejection, .. } => WriteError::from(rejection),
            ProxyError::Unreachable { leader, message } => WriteError::LeaderUnreachable { leader, message },
        }
    }
}

/// What a leader replies to a forwarded write.
impl From<WriteError> for Rejection {
    fn from(write_error: WriteError) -> Self {
        match write_error {
            WriteError::InvalidInput(message) => Rejection::InvalidInput(message),
            WriteError::NoLeader => Rejection::NoLeader,
            WriteError::NotLeader { leader } => Rejection::NotLeader { leader },
            WriteError::QuorumTimeout { acked, required } => Rejection::QuorumTimeout { acked, required },
            other => Rejection::ServerFault(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_leader_without_known_leader_is_no_leader() {
        assert_eq!(
            WriteError::from(LocalWriteError::NotLeader { leader: None }),
            WriteError::NoLeader
        );
        assert_eq!(
            WriteError::from(Rejection::NotLeader { leader: None }),
            WriteError::NoLeader
        );
    }

    #[test]
    fn quorum_timeout_survives_forwarding() {
        let at_leader = WriteError::QuorumTimeout { acked: 1, required: 2 };

        let at_origin = WriteError::from(ProxyError::LeaderRejected {
            leader: "10.0.0.1:8848".into(),
            rejection: Rejection::from(at_leader.clone()),
        });

        assert_eq!(at_origin, at_leader);
    }
}
