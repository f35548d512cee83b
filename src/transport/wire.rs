//! Conversions between engine types and generated protobuf messages. Shared by the gRPC client
//! (`GrpcTransport`) and the gRPC server (`RpcServer`).
use crate::consensus::{Datum, DeleteRequest, Peer, PeerState, PublishRequest, Rejection, Term};
use crate::grpc::{
    proto_ack_result, proto_peer_result, proto_rejection, ProtoAck, ProtoAckResult, ProtoDatum, ProtoDeleteReq,
    ProtoInvalidInput, ProtoNoLeader, ProtoNotInitialized, ProtoNotLeader, ProtoPeer, ProtoPeerResult,
    ProtoPeerState, ProtoPublishReq, ProtoQuorumTimeout, ProtoRejection, ProtoServerFault, ProtoStaleTerm,
    ProtoUnknownPeer,
};
use std::convert::TryFrom;

pub(crate) fn peer_to_proto(peer: &Peer) -> ProtoPeer {
    let state = match peer.state {
        PeerState::Follower => ProtoPeerState::Follower,
        PeerState::Candidate => ProtoPeerState::Candidate,
        PeerState::Leader => ProtoPeerState::Leader,
    };

    ProtoPeer {
        address: peer.address.clone(),
        term: peer.term.as_u64(),
        state: state as i32,
        vote_for: peer.vote_for.clone().unwrap_or_default(),
        leader_due_ms: peer.leader_due_ms,
        heartbeat_due_ms: peer.heartbeat_due_ms,
    }
}

pub(crate) fn peer_from_proto(proto: ProtoPeer) -> Result<Peer, Rejection> {
    if proto.address.is_empty() {
        return Err(Rejection::InvalidInput("Peer address is empty".to_string()));
    }
    let state = match ProtoPeerState::from_i32(proto.state) {
        Some(ProtoPeerState::Follower) => PeerState::Follower,
        Some(ProtoPeerState::Candidate) => PeerState::Candidate,
        Some(ProtoPeerState::Leader) => PeerState::Leader,
        None => return Err(Rejection::InvalidInput(format!("Unknown peer state {}", proto.state))),
    };
    let vote_for = match proto.vote_for.as_str() {
        "" => None,
        _ => Some(proto.vote_for),
    };

    Ok(Peer {
        address: proto.address,
        term: Term::new(proto.term),
        state,
        vote_for,
        leader_due_ms: proto.leader_due_ms,
        heartbeat_due_ms: proto.heartbeat_due_ms,
    })
}

fn required_peer(proto: Option<ProtoPeer>) -> Result<Peer, Rejection> {
    proto
        .ok_or_else(|| Rejection::InvalidInput("Missing source peer".to_string()))
        .and_then(peer_from_proto)
}

pub(crate) fn datum_to_proto(datum: Datum) -> ProtoDatum {
    ProtoDatum {
        key: datum.key,
        value: datum.value,
        timestamp: datum.timestamp,
    }
}

pub(crate) fn datum_from_proto(proto: ProtoDatum) -> Datum {
    Datum {
        key: proto.key,
        value: proto.value,
        timestamp: proto.timestamp,
    }
}

pub(crate) fn publish_request_to_proto(request: PublishRequest) -> ProtoPublishReq {
    ProtoPublishReq {
        source: Some(peer_to_proto(&request.source)),
        datum: Some(datum_to_proto(request.datum)),
    }
}

pub(crate) fn publish_request_from_proto(proto: ProtoPublishReq) -> Result<PublishRequest, Rejection> {
    let datum = proto
        .datum
        .map(datum_from_proto)
        .ok_or_else(|| Rejection::InvalidInput("Missing datum".to_string()))?;

    Ok(PublishRequest {
        datum,
        source: required_peer(proto.source)?,
    })
}

pub(crate) fn delete_request_to_proto(request: DeleteRequest) -> ProtoDeleteReq {
    ProtoDeleteReq {
        key: request.key,
        source: Some(peer_to_proto(&request.source)),
    }
}

pub(crate) fn delete_request_from_proto(proto: ProtoDeleteReq) -> Result<DeleteRequest, Rejection> {
    Ok(DeleteRequest {
        key: proto.key,
        source: required_peer(proto.source)?,
    })
}

pub(crate) fn rejection_to_proto(rejection: Rejection) -> ProtoRejection {
    let err = match rejection {
        Rejection::UnknownPeer => proto_rejection::Err::UnknownPeer(ProtoUnknownPeer {
            // Empty
        }),
        Rejection::NotInitialized => proto_rejection::Err::NotInitialized(ProtoNotInitialized {
            // Empty
        }),
        Rejection::NotLeader { leader } => proto_rejection::Err::NotLeader(ProtoNotLeader {
            leader: leader.unwrap_or_default(),
        }),
        Rejection::StaleTerm { current_term } => proto_rejection::Err::StaleTerm(ProtoStaleTerm {
            current_term: current_term.as_u64(),
        }),
        Rejection::InvalidInput(message) => proto_rejection::Err::InvalidInput(ProtoInvalidInput { message }),
        Rejection::NoLeader => proto_rejection::Err::NoLeader(ProtoNoLeader {
            // Empty
        }),
        Rejection::QuorumTimeout { acked, required } => proto_rejection::Err::QuorumTimeout(ProtoQuorumTimeout {
            acked: u32::try_from(acked).unwrap_or(u32::MAX),
            required: u32::try_from(required).unwrap_or(u32::MAX),
        }),
        Rejection::ServerFault(message) => proto_rejection::Err::ServerFault(ProtoServerFault { message }),
    };

    ProtoRejection { err: Some(err) }
}

pub(crate) fn rejection_from_proto(proto: ProtoRejection) -> Rejection {
    match proto.err {
        Some(proto_rejection::Err::UnknownPeer(_)) => Rejection::UnknownPeer,
        Some(proto_rejection::Err::NotInitialized(_)) => Rejection::NotInitialized,
        Some(proto_rejection::Err::NotLeader(not_leader)) => Rejection::NotLeader {
            leader: match not_leader.leader.as_str() {
                "" => None,
                _ => Some(not_leader.leader),
            },
        },
        Some(proto_rejection::Err::StaleTerm(stale)) => Rejection::StaleTerm {
            current_term: Term::new(stale.current_term),
        },
        Some(proto_rejection::Err::InvalidInput(invalid)) => Rejection::InvalidInput(invalid.message),
        Some(proto_rejection::Err::NoLeader(_)) => Rejection::NoLeader,
        Some(proto_rejection::Err::QuorumTimeout(timeout)) => Rejection::QuorumTimeout {
            acked: timeout.acked as usize,
            required: timeout.required as usize,
        },
        Some(proto_rejection::Err::ServerFault(fault)) => Rejection::ServerFault(fault.message),
        None => Rejection::ServerFault("Server replied with an empty rejection".to_string()),
    }
}

pub(crate) fn peer_result_to_proto(result: Result<Peer, Rejection>) -> ProtoPeerResult {
    let result = match result {
        Ok(peer) => proto_peer_result::Result::Ok(peer_to_proto(&peer)),
        Err(rejection) => proto_peer_result::Result::Err(rejection_to_proto(rejection)),
    };

    ProtoPeerResult { result: Some(result) }
}

pub(crate) fn peer_result_from_proto(proto: ProtoPeerResult) -> Result<Peer, Rejection> {
    match proto.result {
        Some(proto_peer_result::Result::Ok(peer)) => peer_from_proto(peer),
        Some(proto_peer_result::Result::Err(rejection)) => Err(rejection_from_proto(rejection)),
        None => Err(Rejection::ServerFault("Server replied with an empty result".to_string())),
    }
}

/// Acks carry the applied timestamp. Deletes ack with 0.
pub(crate) fn ack_result_to_proto(result: Result<u64, Rejection>) -> ProtoAckResult {
    let result = match result {
        Ok(timestamp) => proto_ack_result::Result::Ok(ProtoAck { timestamp }),
        Err(rejection) => proto_ack_result::Result::Err(rejection_to_proto(rejection)),
    };

    ProtoAckResult { result: Some(result) }
}

pub(crate) fn ack_result_from_proto(proto: ProtoAckResult) -> Result<u64, Rejection> {
    match proto.result {
        Some(proto_ack_result::Result::Ok(ack)) => Ok(ack.timestamp),
        Some(proto_ack_result::Result::Err(rejection)) => Err(rejection_from_proto(rejection)),
        None => Err(Rejection::ServerFault("Server replied with an empty result".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> Peer {
        Peer {
            address: "10.0.0.2:8848".into(),
            term: Term::new(12),
            state: PeerState::Candidate,
            vote_for: Some("10.0.0.2:8848".into()),
            leader_due_ms: 15_000,
            heartbeat_due_ms: 3_200,
        }
    }

    #[test]
    fn peer_without_vote_uses_empty_string() {
        let mut peer = candidate();
        peer.vote_for = None;

        let proto = peer_to_proto(&peer);

        assert_eq!(proto.vote_for, "");
        assert_eq!(peer_from_proto(proto).unwrap(), peer);
        assert_eq!(peer_from_proto(peer_to_proto(&candidate())).unwrap(), candidate());
    }

    #[test]
    fn unknown_peer_state_is_invalid_input() {
        let mut proto = peer_to_proto(&candidate());
        proto.state = 42;

        assert!(matches!(peer_from_proto(proto), Err(Rejection::InvalidInput(_))));
    }

    #[test]
    fn publish_without_source_is_invalid_input() {
        let proto = ProtoPublishReq {
            datum: Some(ProtoDatum {
                key: "k".into(),
                value: "v".into(),
                timestamp: 1,
            }),
            source: None,
        };

        assert!(matches!(
            publish_request_from_proto(proto),
            Err(Rejection::InvalidInput(_))
        ));
    }

    #[test]
    fn rejections_survive_the_wire() {
        let rejections = vec![
            Rejection::UnknownPeer,
            Rejection::NotInitialized,
            Rejection::NotLeader { leader: None },
            Rejection::NotLeader {
                leader: Some("10.0.0.1:8848".into()),
            },
            Rejection::StaleTerm {
                current_term: Term::new(300),
            },
            Rejection::NoLeader,
            Rejection::QuorumTimeout { acked: 1, required: 2 },
            Rejection::ServerFault("disk full".into()),
        ];
        for rejection in rejections {
            let proto = ack_result_to_proto(Err(rejection.clone()));
            assert_eq!(ack_result_from_proto(proto), Err(rejection));
        }
    }

    #[test]
    fn empty_result_is_a_server_fault() {
        assert!(matches!(
            peer_result_from_proto(ProtoPeerResult { result: None }),
            Err(Rejection::ServerFault(_))
        ));
    }
}
