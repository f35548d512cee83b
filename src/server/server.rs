use crate::actor::{ActorClient, ActorExited, WeakActorClient};
use crate::api::ReplicatedStore;
use crate::consensus::{DatumStore, EncodedBeat, Rejection};
use crate::grpc::grpc_datum_consensus_server::{GrpcDatumConsensus, GrpcDatumConsensusServer};
use crate::grpc::{
    ProtoAckResult, ProtoBeatReq, ProtoDeleteReq, ProtoForwardDeleteReq, ProtoForwardPublishReq,
    ProtoGetDatumsReq, ProtoGetDatumsResult, ProtoGetPeerReq, ProtoPeer, ProtoPeerResult, ProtoPublishReq,
};
use crate::server::RpcServerShutdownSignal;
use crate::transport;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

/// RpcServer is the type that implements the peer-to-peer gRPC interface.
pub(crate) struct RpcServer {
    logger: slog::Logger,
    local_replica: WeakActorClient,
    datums: DatumStore,
    store: Arc<ReplicatedStore>,
}

impl RpcServer {
    pub(crate) fn new(
        logger: slog::Logger,
        local_replica: WeakActorClient,
        datums: DatumStore,
        store: Arc<ReplicatedStore>,
    ) -> Self {
        RpcServer {
            logger,
            local_replica,
            datums,
            store,
        }
    }

    pub(crate) async fn run(self, socket_addr: SocketAddr, shutdown_signal: RpcServerShutdownSignal) {
        let logger = self.logger.clone();
        slog::info!(logger, "Listening on '{:?}'", socket_addr);

        // TODO:2 if server port is unavailable, signal back to caller.
        let result = Server::builder()
            .add_service(GrpcDatumConsensusServer::new(self))
            .serve_with_shutdown(socket_addr, shutdown_signal)
            .await;

        slog::info!(logger, "Server run() has exited: {:?}", result);
    }

    fn replica(&self) -> Result<ActorClient, Rejection> {
        self.local_replica.upgrade().ok_or_else(|| ActorExited.into())
    }

    async fn handle_vote(&self, rpc_request: ProtoPeer) -> ProtoPeerResult {
        let app_result = match transport::peer_from_proto(rpc_request) {
            Ok(candidate) => match self.replica() {
                Ok(replica) => replica.received_vote(candidate).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        transport::peer_result_to_proto(app_result)
    }

    async fn handle_beat(&self, rpc_request: ProtoBeatReq) -> ProtoPeerResult {
        let beat = EncodedBeat {
            payload: Bytes::from(rpc_request.payload),
            compressed: rpc_request.compressed,
        };
        let app_result = match self.replica() {
            Ok(replica) => replica.received_beat(beat).await,
            Err(e) => Err(e),
        };
        transport::peer_result_to_proto(app_result)
    }

    async fn handle_publish(&self, rpc_request: ProtoPublishReq) -> ProtoAckResult {
        let app_result = match transport::publish_request_from_proto(rpc_request) {
            Ok(request) => match self.replica() {
                Ok(replica) => replica.received_publish(request).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        transport::ack_result_to_proto(app_result)
    }

    async fn handle_delete(&self, rpc_request: ProtoDeleteReq) -> ProtoAckResult {
        let app_result = match transport::delete_request_from_proto(rpc_request) {
            Ok(request) => match self.replica() {
                Ok(replica) => replica.received_delete(request).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        transport::ack_result_to_proto(app_result.map(|_| 0))
    }

    // Readers don't go through the actor.
    fn handle_get_datums(&self, rpc_request: ProtoGetDatumsReq) -> ProtoGetDatumsResult {
        let datums = self.datums.get_many(&rpc_request.keys);
        ProtoGetDatumsResult {
            datums: datums.into_iter().map(transport::datum_to_proto).collect(),
        }
    }

    async fn handle_get_peer(&self) -> ProtoPeerResult {
        let app_result = match self.replica() {
            Ok(replica) => replica.get_peer().await.map_err(Rejection::from),
            Err(e) => Err(e),
        };
        transport::peer_result_to_proto(app_result)
    }

    async fn handle_forward_publish(&self, rpc_request: ProtoForwardPublishReq) -> ProtoAckResult {
        let app_result = self
            .store
            .publish_forwarded(rpc_request.key, rpc_request.value, rpc_request.locked)
            .await
            .map_err(Rejection::from);
        transport::ack_result_to_proto(app_result)
    }

    async fn handle_forward_delete(&self, rpc_request: ProtoForwardDeleteReq) -> ProtoAckResult {
        let app_result = self
            .store
            .delete_forwarded(rpc_request.key)
            .await
            .map(|_| 0)
            .map_err(Rejection::from);
        transport::ack_result_to_proto(app_result)
    }
}

#[async_trait::async_trait]
impl GrpcDatumConsensus for RpcServer {
    async fn vote(&self, rpc_request_wrapped: Request<ProtoPeer>) -> Result<Response<ProtoPeerResult>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_reply = self.handle_vote(rpc_request).await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_reply);

        Ok(Response::new(rpc_reply))
    }

    async fn beat(&self, rpc_request_wrapped: Request<ProtoBeatReq>) -> Result<Response<ProtoPeerResult>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        // Beats are periodic and may carry a large digest; payload isn't logged.
        slog::debug!(self.logger, "ServerWire - Beat ({} bytes)", rpc_request.payload.len());
        let rpc_reply = self.handle_beat(rpc_request).await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_reply);

        Ok(Response::new(rpc_reply))
    }

    async fn publish_datum(
        &self,
        rpc_request_wrapped: Request<ProtoPublishReq>,
    ) -> Result<Response<ProtoAckResult>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_reply = self.handle_publish(rpc_request).await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_reply);

        Ok(Response::new(rpc_reply))
    }

    async fn delete_datum(
        &self,
        rpc_request_wrapped: Request<ProtoDeleteReq>,
    ) -> Result<Response<ProtoAckResult>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_reply = self.handle_delete(rpc_request).await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_reply);

        Ok(Response::new(rpc_reply))
    }

    async fn get_datums(
        &self,
        rpc_request_wrapped: Request<ProtoGetDatumsReq>,
    ) -> Result<Response<ProtoGetDatumsResult>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_reply = self.handle_get_datums(rpc_request);
        slog::debug!(self.logger, "ServerWire - GetDatums returned {} datums", rpc_reply.datums.len());

        Ok(Response::new(rpc_reply))
    }

    async fn get_peer(&self, _: Request<ProtoGetPeerReq>) -> Result<Response<ProtoPeerResult>, Status> {
        let rpc_reply = self.handle_get_peer().await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_reply);

        Ok(Response::new(rpc_reply))
    }

    async fn forward_publish(
        &self,
        rpc_request_wrapped: Request<ProtoForwardPublishReq>,
    ) -> Result<Response<ProtoAckResult>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_reply = self.handle_forward_publish(rpc_request).await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_reply);

        Ok(Response::new(rpc_reply))
    }

    async fn forward_delete(
        &self,
        rpc_request_wrapped: Request<ProtoForwardDeleteReq>,
    ) -> Result<Response<ProtoAckResult>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_reply = self.handle_forward_delete(rpc_request).await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_reply);

        Ok(Response::new(rpc_reply))
    }
}
