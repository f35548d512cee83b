use crate::consensus::{Datum, DeleteRequest, EncodedBeat, Peer, PublishRequest};
use crate::grpc::grpc_datum_consensus_client::GrpcDatumConsensusClient;
use crate::grpc::{
    ProtoBeatReq, ProtoForwardDeleteReq, ProtoForwardPublishReq, ProtoGetDatumsReq, ProtoGetPeerReq,
};
use crate::transport::wire;
use crate::transport::{ForwardedPublish, PeerTransport, TransportError};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};

type Client = GrpcDatumConsensusClient<Channel>;

/// PeerTransport over tonic. One channel per peer, created lazily and dropped after any failure
/// so the next call reconnects.
pub(crate) struct GrpcTransport {
    logger: slog::Logger,
    rpc_timeout: Duration,
    clients: Mutex<HashMap<String, Client>>,
}

impl GrpcTransport {
    pub(crate) fn new(logger: slog::Logger, rpc_timeout: Duration) -> Self {
        GrpcTransport {
            logger,
            rpc_timeout,
            clients: Mutex::new(HashMap::new()),
        }
    }

    async fn client(&self, target: &str) -> Result<Client, TransportError> {
        if let Some(client) = self.cached(target) {
            return Ok(client);
        }

        let endpoint = Endpoint::from_shared(format!("http://{}", target))
            .map_err(|e| TransportError::unreachable(target, e))?;
        let channel = tokio::time::timeout(self.rpc_timeout, endpoint.connect())
            .await
            .map_err(|_| TransportError::unreachable(target, "connect timed out"))?
            .map_err(|e| TransportError::unreachable(target, e))?;
        slog::debug!(self.logger, "Connected to peer {}", target);

        let client = GrpcDatumConsensusClient::new(channel);
        self.lock_clients().insert(target.to_string(), client.clone());

        Ok(client)
    }

    async fn call<T, F, Fut>(&self, target: &str, rpc: F) -> Result<T, TransportError>
    where
        F: FnOnce(Client) -> Fut,
        Fut: Future<Output = Result<tonic::Response<T>, tonic::Status>>,
    {
        let client = self.client(target).await?;
        let result = match tokio::time::timeout(self.rpc_timeout, rpc(client)).await {
            Ok(Ok(response)) => return Ok(response.into_inner()),
            Ok(Err(status)) => TransportError::unreachable(target, status),
            Err(_) => TransportError::unreachable(target, "rpc timed out"),
        };

        slog::debug!(self.logger, "RPC to {} failed: {}", target, result);
        self.lock_clients().remove(target);
        Err(result)
    }

    fn cached(&self, target: &str) -> Option<Client> {
        self.lock_clients().get(target).cloned()
    }

    fn lock_clients(&self) -> std::sync::MutexGuard<'_, HashMap<String, Client>> {
        self.clients.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl PeerTransport for GrpcTransport {
    async fn request_vote(&self, target: &str, candidate: Peer) -> Result<Peer, TransportError> {
        let request = wire::peer_to_proto(&candidate);
        let reply = self
            .call(target, |mut client| async move { client.vote(request).await })
            .await?;

        Ok(wire::peer_result_from_proto(reply)?)
    }

    async fn send_beat(&self, target: &str, beat: EncodedBeat) -> Result<Peer, TransportError> {
        let request = ProtoBeatReq {
            payload: beat.payload.to_vec(),
            compressed: beat.compressed,
        };
        let reply = self
            .call(target, |mut client| async move { client.beat(request).await })
            .await?;

        Ok(wire::peer_result_from_proto(reply)?)
    }

    async fn publish(&self, target: &str, request: PublishRequest) -> Result<u64, TransportError> {
        let request = wire::publish_request_to_proto(request);
        let reply = self
            .call(target, |mut client| async move { client.publish_datum(request).await })
            .await?;

        Ok(wire::ack_result_from_proto(reply)?)
    }

    async fn delete(&self, target: &str, request: DeleteRequest) -> Result<(), TransportError> {
        let request = wire::delete_request_to_proto(request);
        let reply = self
            .call(target, |mut client| async move { client.delete_datum(request).await })
            .await?;

        wire::ack_result_from_proto(reply)?;
        Ok(())
    }

    async fn get_datums(&self, target: &str, keys: Vec<String>) -> Result<Vec<Datum>, TransportError> {
        let request = ProtoGetDatumsReq { keys };
        let reply = self
            .call(target, |mut client| async move { client.get_datums(request).await })
            .await?;

        Ok(reply.datums.into_iter().map(wire::datum_from_proto).collect())
    }

    async fn get_peer(&self, target: &str) -> Result<Peer, TransportError> {
        let reply = self
            .call(target, |mut client| async move {
                client
                    .get_peer(ProtoGetPeerReq {
                        // Empty
                    })
                    .await
            })
            .await?;

        Ok(wire::peer_result_from_proto(reply)?)
    }

    async fn forward_publish(&self, target: &str, request: ForwardedPublish) -> Result<u64, TransportError> {
        let request = ProtoForwardPublishReq {
            key: request.key,
            value: request.value,
            locked: request.locked,
        };
        let reply = self
            .call(target, |mut client| async move { client.forward_publish(request).await })
            .await?;

        Ok(wire::ack_result_from_proto(reply)?)
    }

    async fn forward_delete(&self, target: &str, key: String) -> Result<(), TransportError> {
        let request = ProtoForwardDeleteReq { key };
        let reply = self
            .call(target, |mut client| async move { client.forward_delete(request).await })
            .await?;

        wire::ack_result_from_proto(reply)?;
        Ok(())
    }
}
