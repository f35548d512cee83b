mod beat;
mod datum;
mod engine;
mod engine_api;
mod keys;
mod peers;
mod state_change_listener;
mod term;
mod timeouts;

pub(crate) use beat::EncodedBeat;
pub use datum::Datum;
pub(crate) use datum::DatumStore;
pub(crate) use engine::ConsensusEngine;
pub(crate) use engine::ConsensusEngineConfig;
pub(crate) use engine::EngineOptions;
pub(crate) use engine_api::DeleteRequest;
pub(crate) use engine_api::LocalWriteError;
pub(crate) use engine_api::PublishInput;
pub(crate) use engine_api::PublishOutput;
pub(crate) use engine_api::PublishRequest;
pub(crate) use engine_api::Rejection;
pub(crate) use peers::Peer;
pub(crate) use peers::PeerSet;
pub use peers::PeerState;
pub(crate) use state_change_listener::new as election_state_channel;
pub(crate) use state_change_listener::ElectionStateChangeListener;
pub use state_change_listener::ElectionStateSnapshot;
pub(crate) use term::Term;
pub(crate) use timeouts::Timeouts;
