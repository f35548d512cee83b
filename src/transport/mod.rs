mod api;
mod grpc;
#[cfg(test)]
mod local;
mod wire;

pub(crate) use api::ForwardedPublish;
pub(crate) use api::PeerTransport;
pub(crate) use api::TransportError;
pub(crate) use grpc::GrpcTransport;
pub(crate) use wire::ack_result_to_proto;
pub(crate) use wire::datum_to_proto;
pub(crate) use wire::delete_request_from_proto;
pub(crate) use wire::peer_from_proto;
pub(crate) use wire::peer_result_to_proto;
pub(crate) use wire::publish_request_from_proto;
#[cfg(test)]
pub(crate) use local::LocalNetwork;
