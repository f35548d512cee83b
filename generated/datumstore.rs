#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoPeer {
    #[prost(string, tag = "1")]
    pub address: ::prost::alloc::string::String,
    #[prost(uint64, tag = "2")]
    pub term: u64,
    #[prost(enumeration = "ProtoPeerState", tag = "3")]
    pub state: i32,
    /// Empty if no vote.
    #[prost(string, tag = "4")]
    pub vote_for: ::prost::alloc::string::String,
    #[prost(int64, tag = "5")]
    pub leader_due_ms: i64,
    #[prost(int64, tag = "6")]
    pub heartbeat_due_ms: i64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoDatum {
    #[prost(string, tag = "1")]
    pub key: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub value: ::prost::alloc::string::String,
    #[prost(uint64, tag = "3")]
    pub timestamp: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoBeatReq {
    /// JSON encoded beat, gzip'd if `compressed`.
    #[prost(bytes = "vec", tag = "1")]
    pub payload: ::prost::alloc::vec::Vec<u8>,
    #[prost(bool, tag = "2")]
    pub compressed: bool,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoPublishReq {
    #[prost(message, optional, tag = "1")]
    pub datum: ::core::option::Option<ProtoDatum>,
    #[prost(message, optional, tag = "2")]
    pub source: ::core::option::Option<ProtoPeer>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoDeleteReq {
    #[prost(string, tag = "1")]
    pub key: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub source: ::core::option::Option<ProtoPeer>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoGetDatumsReq {
    #[prost(string, repeated, tag = "1")]
    pub keys: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoGetDatumsResult {
    #[prost(message, repeated, tag = "1")]
    pub datums: ::prost::alloc::vec::Vec<ProtoDatum>,
}
/// Empty
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoGetPeerReq {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoForwardPublishReq {
    #[prost(string, tag = "1")]
    pub key: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub value: ::prost::alloc::string::String,
    #[prost(bool, tag = "3")]
    pub locked: bool,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoForwardDeleteReq {
    #[prost(string, tag = "1")]
    pub key: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoPeerResult {
    #[prost(oneof = "proto_peer_result::Result", tags = "1, 2")]
    pub result: ::core::option::Option<proto_peer_result::Result>,
}
/// Nested message and enum types in `ProtoPeerResult`.
pub mod proto_peer_result {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Result {
        #[prost(message, tag = "1")]
        Ok(super::ProtoPeer),
        #[prost(message, tag = "2")]
        Err(super::ProtoRejection),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoAckResult {
    #[prost(oneof = "proto_ack_result::Result", tags = "1, 2")]
    pub result: ::core::option::Option<proto_ack_result::Result>,
}
/// Nested message and enum types in `ProtoAckResult`.
pub mod proto_ack_result {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Result {
        #[prost(message, tag = "1")]
        Ok(super::ProtoAck),
        #[prost(message, tag = "2")]
        Err(super::ProtoRejection),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoAck {
    /// Timestamp of the applied datum. 0 for deletes.
    #[prost(uint64, tag = "1")]
    pub timestamp: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoRejection {
    #[prost(oneof = "proto_rejection::Err", tags = "1, 2, 3, 4, 5, 6, 7, 8")]
    pub err: ::core::option::Option<proto_rejection::Err>,
}
/// Nested message and enum types in `ProtoRejection`.
pub mod proto_rejection {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Err {
        #[prost(message, tag = "1")]
        UnknownPeer(super::ProtoUnknownPeer),
        #[prost(message, tag = "2")]
        NotInitialized(super::ProtoNotInitialized),
        #[prost(message, tag = "3")]
        NotLeader(super::ProtoNotLeader),
        #[prost(message, tag = "4")]
        StaleTerm(super::ProtoStaleTerm),
        #[prost(message, tag = "5")]
        InvalidInput(super::ProtoInvalidInput),
        #[prost(message, tag = "6")]
        NoLeader(super::ProtoNoLeader),
        #[prost(message, tag = "7")]
        QuorumTimeout(super::ProtoQuorumTimeout),
        #[prost(message, tag = "8")]
        ServerFault(super::ProtoServerFault),
    }
}
/// Empty
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoUnknownPeer {}
/// Empty
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoNotInitialized {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoNotLeader {
    /// Empty if the rejecting node doesn't know who the leader is.
    #[prost(string, tag = "1")]
    pub leader: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoStaleTerm {
    #[prost(uint64, tag = "1")]
    pub current_term: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoInvalidInput {
    #[prost(string, tag = "1")]
    pub message: ::prost::alloc::string::String,
}
/// Empty
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoNoLeader {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoQuorumTimeout {
    #[prost(uint32, tag = "1")]
    pub acked: u32,
    #[prost(uint32, tag = "2")]
    pub required: u32,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoServerFault {
    #[prost(string, tag = "1")]
    pub message: ::prost::alloc::string::String,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ProtoPeerState {
    Follower = 0,
    Candidate = 1,
    Leader = 2,
}
#[doc = r" Generated client implementations."]
pub mod grpc_datum_consensus_client {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    #[doc = " Peer-to-peer surface of the replicated datum store. Every node serves all of these."]
    pub struct GrpcDatumConsensusClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl GrpcDatumConsensusClient<tonic::transport::Channel> {
        #[doc = r" Attempt to create a new client by connecting to a given endpoint."]
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: std::convert::TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }
    impl<T> GrpcDatumConsensusClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::ResponseBody: Body + HttpBody + Send + 'static,
        T::Error: Into<StdError>,
        <T::ResponseBody as HttpBody>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = tonic::client::Grpc::with_interceptor(inner, interceptor);
            Self { inner }
        }
        #[doc = " Candidate asks a peer for its vote. Reply is the voter's (possibly updated) descriptor."]
        pub async fn vote(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoPeer>,
        ) -> Result<tonic::Response<super::ProtoPeerResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/datumstore.GrpcDatumConsensus/Vote");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Leader keep-alive, optionally carrying a digest of every datum."]
        pub async fn beat(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoBeatReq>,
        ) -> Result<tonic::Response<super::ProtoPeerResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/datumstore.GrpcDatumConsensus/Beat");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Leader pushes a freshly written datum."]
        pub async fn publish_datum(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoPublishReq>,
        ) -> Result<tonic::Response<super::ProtoAckResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path =
                http::uri::PathAndQuery::from_static("/datumstore.GrpcDatumConsensus/PublishDatum");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Leader pushes a deletion."]
        pub async fn delete_datum(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoDeleteReq>,
        ) -> Result<tonic::Response<super::ProtoAckResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path =
                http::uri::PathAndQuery::from_static("/datumstore.GrpcDatumConsensus/DeleteDatum");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Follower pulls full values for stale/missing keys found while diffing a beat digest."]
        pub async fn get_datums(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoGetDatumsReq>,
        ) -> Result<tonic::Response<super::ProtoGetDatumsResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path =
                http::uri::PathAndQuery::from_static("/datumstore.GrpcDatumConsensus/GetDatums");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Fetch the serving node's own descriptor."]
        pub async fn get_peer(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoGetPeerReq>,
        ) -> Result<tonic::Response<super::ProtoPeerResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path =
                http::uri::PathAndQuery::from_static("/datumstore.GrpcDatumConsensus/GetPeer");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Non-leader forwards a client write to the leader."]
        pub async fn forward_publish(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoForwardPublishReq>,
        ) -> Result<tonic::Response<super::ProtoAckResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(
                "/datumstore.GrpcDatumConsensus/ForwardPublish",
            );
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn forward_delete(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoForwardDeleteReq>,
        ) -> Result<tonic::Response<super::ProtoAckResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(
                "/datumstore.GrpcDatumConsensus/ForwardDelete",
            );
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
    impl<T: Clone> Clone for GrpcDatumConsensusClient<T> {
        fn clone(&self) -> Self {
            Self {
                inner: self.inner.clone(),
            }
        }
    }
    impl<T> std::fmt::Debug for GrpcDatumConsensusClient<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "GrpcDatumConsensusClient {{ ... }}")
        }
    }
}
#[doc = r" Generated server implementations."]
pub mod grpc_datum_consensus_server {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    #[doc = "Generated trait containing gRPC methods that should be implemented for use with GrpcDatumConsensusServer."]
    #[async_trait]
    pub trait GrpcDatumConsensus: Send + Sync + 'static {
        #[doc = " Candidate asks a peer for its vote. Reply is the voter's (possibly updated) descriptor."]
        async fn vote(
            &self,
            request: tonic::Request<super::ProtoPeer>,
        ) -> Result<tonic::Response<super::ProtoPeerResult>, tonic::Status>;
        #[doc = " Leader keep-alive, optionally carrying a digest of every datum."]
        async fn beat(
            &self,
            request: tonic::Request<super::ProtoBeatReq>,
        ) -> Result<tonic::Response<super::ProtoPeerResult>, tonic::Status>;
        #[doc = " Leader pushes a freshly written datum."]
        async fn publish_datum(
            &self,
            request: tonic::Request<super::ProtoPublishReq>,
        ) -> Result<tonic::Response<super::ProtoAckResult>, tonic::Status>;
        #[doc = " Leader pushes a deletion."]
        async fn delete_datum(
            &self,
            request: tonic::Request<super::ProtoDeleteReq>,
        ) -> Result<tonic::Response<super::ProtoAckResult>, tonic::Status>;
        #[doc = " Follower pulls full values for stale/missing keys found while diffing a beat digest."]
        async fn get_datums(
            &self,
            request: tonic::Request<super::ProtoGetDatumsReq>,
        ) -> Result<tonic::Response<super::ProtoGetDatumsResult>, tonic::Status>;
        #[doc = " Fetch the serving node's own descriptor."]
        async fn get_peer(
            &self,
            request: tonic::Request<super::ProtoGetPeerReq>,
        ) -> Result<tonic::Response<super::ProtoPeerResult>, tonic::Status>;
        #[doc = " Non-leader forwards a client write to the leader."]
        async fn forward_publish(
            &self,
            request: tonic::Request<super::ProtoForwardPublishReq>,
        ) -> Result<tonic::Response<super::ProtoAckResult>, tonic::Status>;
        async fn forward_delete(
            &self,
            request: tonic::Request<super::ProtoForwardDeleteReq>,
        ) -> Result<tonic::Response<super::ProtoAckResult>, tonic::Status>;
    }
    #[doc = " Peer-to-peer surface of the replicated datum store. Every node serves all of these."]
    #[derive(Debug)]
    pub struct GrpcDatumConsensusServer<T: GrpcDatumConsensus> {
        inner: _Inner<T>,
    }
    struct _Inner<T>(Arc<T>, Option<tonic::Interceptor>);
    impl<T: GrpcDatumConsensus> GrpcDatumConsensusServer<T> {
        pub fn new(inner: T) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, None);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, Some(interceptor.into()));
            Self { inner }
        }
    }
    impl<T, B> Service<http::Request<B>> for GrpcDatumConsensusServer<T>
    where
        T: GrpcDatumConsensus,
        B: HttpBody + Send + Sync + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = Never;
        type Future = BoxFuture<Self::Response, Self::Error>;
        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            let inner = self.inner.clone();
            match req.uri().path() {
                "/datumstore.GrpcDatumConsensus/Vote" => {
                    #[allow(non_camel_case_types)]
                    struct VoteSvc<T: GrpcDatumConsensus>(pub Arc<T>);
                    impl<T: GrpcDatumConsensus> tonic::server::UnaryService<super::ProtoPeer> for VoteSvc<T> {
                        type Response = super::ProtoPeerResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoPeer>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).vote(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = VoteSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/datumstore.GrpcDatumConsensus/Beat" => {
                    #[allow(non_camel_case_types)]
                    struct BeatSvc<T: GrpcDatumConsensus>(pub Arc<T>);
                    impl<T: GrpcDatumConsensus> tonic::server::UnaryService<super::ProtoBeatReq> for BeatSvc<T> {
                        type Response = super::ProtoPeerResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoBeatReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).beat(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = BeatSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/datumstore.GrpcDatumConsensus/PublishDatum" => {
                    #[allow(non_camel_case_types)]
                    struct PublishDatumSvc<T: GrpcDatumConsensus>(pub Arc<T>);
                    impl<T: GrpcDatumConsensus> tonic::server::UnaryService<super::ProtoPublishReq>
                        for PublishDatumSvc<T>
                    {
                        type Response = super::ProtoAckResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoPublishReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).publish_datum(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = PublishDatumSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/datumstore.GrpcDatumConsensus/DeleteDatum" => {
                    #[allow(non_camel_case_types)]
                    struct DeleteDatumSvc<T: GrpcDatumConsensus>(pub Arc<T>);
                    impl<T: GrpcDatumConsensus> tonic::server::UnaryService<super::ProtoDeleteReq>
                        for DeleteDatumSvc<T>
                    {
                        type Response = super::ProtoAckResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoDeleteReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).delete_datum(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = DeleteDatumSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/datumstore.GrpcDatumConsensus/GetDatums" => {
                    #[allow(non_camel_case_types)]
                    struct GetDatumsSvc<T: GrpcDatumConsensus>(pub Arc<T>);
                    impl<T: GrpcDatumConsensus>
                        tonic::server::UnaryService<super::ProtoGetDatumsReq> for GetDatumsSvc<T>
                    {
                        type Response = super::ProtoGetDatumsResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoGetDatumsReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).get_datums(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = GetDatumsSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/datumstore.GrpcDatumConsensus/GetPeer" => {
                    #[allow(non_camel_case_types)]
                    struct GetPeerSvc<T: GrpcDatumConsensus>(pub Arc<T>);
                    impl<T: GrpcDatumConsensus> tonic::server::UnaryService<super::ProtoGetPeerReq> for GetPeerSvc<T> {
                        type Response = super::ProtoPeerResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoGetPeerReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).get_peer(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = GetPeerSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/datumstore.GrpcDatumConsensus/ForwardPublish" => {
                    #[allow(non_camel_case_types)]
                    struct ForwardPublishSvc<T: GrpcDatumConsensus>(pub Arc<T>);
                    impl<T: GrpcDatumConsensus>
                        tonic::server::UnaryService<super::ProtoForwardPublishReq>
                        for ForwardPublishSvc<T>
                    {
                        type Response = super::ProtoAckResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoForwardPublishReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).forward_publish(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = ForwardPublishSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/datumstore.GrpcDatumConsensus/ForwardDelete" => {
                    #[allow(non_camel_case_types)]
                    struct ForwardDeleteSvc<T: GrpcDatumConsensus>(pub Arc<T>);
                    impl<T: GrpcDatumConsensus>
                        tonic::server::UnaryService<super::ProtoForwardDeleteReq>
                        for ForwardDeleteSvc<T>
                    {
                        type Response = super::ProtoAckResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoForwardDeleteReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).forward_delete(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = ForwardDeleteSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", "12")
                        .header("content-type", "application/grpc")
                        .body(tonic::body::BoxBody::empty())
                        .unwrap())
                }),
            }
        }
    }
    impl<T: GrpcDatumConsensus> Clone for GrpcDatumConsensusServer<T> {
        fn clone(&self) -> Self {
            let inner = self.inner.clone();
            Self { inner }
        }
    }
    impl<T: GrpcDatumConsensus> Clone for _Inner<T> {
        fn clone(&self) -> Self {
            Self(self.0.clone(), self.1.clone())
        }
    }
    impl<T: std::fmt::Debug> std::fmt::Debug for _Inner<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }
    impl<T: GrpcDatumConsensus> tonic::transport::NamedService for GrpcDatumConsensusServer<T> {
        const NAME: &'static str = "datumstore.GrpcDatumConsensus";
    }
}
