use crate::consensus::{DeleteRequest, Datum, EncodedBeat, Peer, PublishRequest, Rejection};

/// A client write relayed from a non-leader to the leader.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ForwardedPublish {
    pub(crate) key: String,
    pub(crate) value: String,
    pub(crate) locked: bool,
}

/// PeerTransport is the client half of every peer-to-peer RPC. `target` is the peer's address.
#[async_trait::async_trait]
pub(crate) trait PeerTransport: Send + Sync + 'static {
    /// Returns the voter's descriptor after it processed our vote request.
    async fn request_vote(&self, target: &str, candidate: Peer) -> Result<Peer, TransportError>;

    async fn send_beat(&self, target: &str, beat: EncodedBeat) -> Result<Peer, TransportError>;

    /// Returns the timestamp the follower holds for the key after the call.
    async fn publish(&self, target: &str, request: PublishRequest) -> Result<u64, TransportError>;

    async fn delete(&self, target: &str, request: DeleteRequest) -> Result<(), TransportError>;

    async fn get_datums(&self, target: &str, keys: Vec<String>) -> Result<Vec<Datum>, TransportError>;

    async fn get_peer(&self, target: &str) -> Result<Peer, TransportError>;

    async fn forward_publish(&self, target: &str, request: ForwardedPublish) -> Result<u64, TransportError>;

    async fn forward_delete(&self, target: &str, key: String) -> Result<(), TransportError>;
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub(crate) enum TransportError {
    #[error("Peer {address} is unreachable: {message}")]
    Unreachable { address: String, message: String },
    #[error("Peer rejected the request")]
    Rejected(#[from] Rejection),
}

impl TransportError {
    pub(crate) fn unreachable(address: &str, message: impl ToString) -> Self {
        TransportError::Unreachable {
            address: address.to_string(),
            message: message.to_string(),
        }
    }
}
