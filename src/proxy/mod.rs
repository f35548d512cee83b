//! Relays client writes that landed on a non-leader to the current leader.
use crate::consensus::Rejection;
use crate::transport::{ForwardedPublish, PeerTransport, TransportError};
use std::sync::Arc;

#[derive(thiserror::Error, Debug, PartialEq)]
pub(crate) enum ProxyError {
    #[error("Local node is leader; nothing to forward")]
    SelfIsLeader,
    #[error("Cluster is in a tough shape. No one is leader.")]
    NoLeader,
    #[error("Leader {leader} rejected the write")]
    LeaderRejected {
        leader: String,
        #[source]
        rejection: Rejection,
    },
    #[error("Leader {leader} is unreachable: {message}")]
    Unreachable { leader: String, message: String },
}

pub(crate) struct LeaderProxy {
    logger: slog::Logger,
    local_address: String,
    transport: Arc<dyn PeerTransport>,
}

impl LeaderProxy {
    pub(crate) fn new(logger: slog::Logger, local_address: String, transport: Arc<dyn PeerTransport>) -> Self {
        LeaderProxy {
            logger,
            local_address,
            transport,
        }
    }

    /// Returns the timestamp the leader assigned.
    pub(crate) async fn forward_publish(
        &self,
        leader: Option<String>,
        request: ForwardedPublish,
    ) -> Result<u64, ProxyError> {
        let leader = self.target(leader)?;
        slog::debug!(self.logger, "Forwarding publish of {} to leader {}", request.key, leader);

        self.transport
            .forward_publish(&leader, request)
            .await
            .map_err(|e| Self::convert_error(leader, e))
    }

    pub(crate) async fn forward_delete(&self, leader: Option<String>, key: String) -> Result<(), ProxyError> {
        let leader = self.target(leader)?;
        slog::debug!(self.logger, "Forwarding delete of {} to leader {}", key, leader);

        self.transport
            .forward_delete(&leader, key)
            .await
            .map_err(|e| Self::convert_error(leader, e))
    }

    fn target(&self, leader: Option<String>) -> Result<String, ProxyError> {
        match leader {
            None => Err(ProxyError::NoLeader),
            Some(leader) if leader == self.local_address => Err(ProxyError::SelfIsLeader),
            Some(leader) => Ok(leader),
        }
    }

    fn convert_error(leader: String, error: TransportError) -> ProxyError {
        match error {
            TransportError::Rejected(rejection) => ProxyError::LeaderRejected { leader, rejection },
            TransportError::Unreachable { message, .. } => ProxyError::Unreachable { leader, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{Datum, DeleteRequest, EncodedBeat, Peer, PublishRequest};
    use std::sync::Mutex;

    /// Records forwarded calls and answers every one with `reply`.
    struct RecordingTransport {
        reply: Result<u64, TransportError>,
        forwarded: Mutex<Vec<String>>,
    }

    impl RecordingTransport {
        fn new(reply: Result<u64, TransportError>) -> Arc<Self> {
            Arc::new(RecordingTransport {
                reply,
                forwarded: Mutex::new(Vec::new()),
            })
        }

        fn record(&self, target: &str, what: &str) {
            self.forwarded.lock().unwrap().push(format!("{} {}", what, target));
        }
    }

    #[async_trait::async_trait]
    impl PeerTransport for RecordingTransport {
        async fn request_vote(&self, _: &str, _: Peer) -> Result<Peer, TransportError> {
            unimplemented!()
        }

        async fn send_beat(&self, _: &str, _: EncodedBeat) -> Result<Peer, TransportError> {
            unimplemented!()
        }

        async fn publish(&self, _: &str, _: PublishRequest) -> Result<u64, TransportError> {
            unimplemented!()
        }

        async fn delete(&self, _: &str, _: DeleteRequest) -> Result<(), TransportError> {
            unimplemented!()
        }

        async fn get_datums(&self, _: &str, _: Vec<String>) -> Result<Vec<Datum>, TransportError> {
            unimplemented!()
        }

        async fn get_peer(&self, _: &str) -> Result<Peer, TransportError> {
            unimplemented!()
        }

        async fn forward_publish(&self, target: &str, request: ForwardedPublish) -> Result<u64, TransportError> {
            self.record(target, &format!("publish {}", request.key));
            self.reply.clone()
        }

        async fn forward_delete(&self, target: &str, key: String) -> Result<(), TransportError> {
            self.record(target, &format!("delete {}", key));
            self.reply.clone().map(|_| ())
        }
    }

    fn proxy(transport: Arc<RecordingTransport>) -> LeaderProxy {
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        LeaderProxy::new(logger, "10.0.0.1:8848".into(), transport)
    }

    fn request() -> ForwardedPublish {
        ForwardedPublish {
            key: "k".into(),
            value: "v".into(),
            locked: false,
        }
    }

    #[tokio::test]
    async fn forwards_to_leader() {
        let transport = RecordingTransport::new(Ok(7));
        let proxy = proxy(transport.clone());

        let timestamp = proxy
            .forward_publish(Some("10.0.0.2:8848".into()), request())
            .await
            .unwrap();
        proxy.forward_delete(Some("10.0.0.2:8848".into()), "k".into()).await.unwrap();

        assert_eq!(timestamp, 7);
        assert_eq!(
            *transport.forwarded.lock().unwrap(),
            vec!["publish k 10.0.0.2:8848", "delete k 10.0.0.2:8848"]
        );
    }

    #[tokio::test]
    async fn fails_fast_without_remote_leader() {
        let transport = RecordingTransport::new(Ok(7));
        let proxy = proxy(transport.clone());

        assert_eq!(proxy.forward_publish(None, request()).await, Err(ProxyError::NoLeader));
        assert_eq!(
            proxy.forward_delete(Some("10.0.0.1:8848".into()), "k".into()).await,
            Err(ProxyError::SelfIsLeader)
        );
        assert!(transport.forwarded.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn leader_failures_are_surfaced() {
        let rejected = proxy(RecordingTransport::new(Err(TransportError::Rejected(Rejection::NoLeader))));
        assert_eq!(
            rejected.forward_publish(Some("10.0.0.2:8848".into()), request()).await,
            Err(ProxyError::LeaderRejected {
                leader: "10.0.0.2:8848".into(),
                rejection: Rejection::NoLeader,
            })
        );

        let down = proxy(RecordingTransport::new(Err(TransportError::unreachable(
            "10.0.0.2:8848",
            "connection refused",
        ))));
        assert_eq!(
            down.forward_publish(Some("10.0.0.2:8848".into()), request()).await,
            Err(ProxyError::Unreachable {
                leader: "10.0.0.2:8848".into(),
                message: "connection refused".into(),
            })
        );
    }
}
