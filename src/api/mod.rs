//! This mod is meant to hold most of the code for the library's client-facing API.
mod client;
mod options;
mod replicated_store;
mod types;
mod wiring;

pub use client::DatumStoreClient;
pub use options::ConsensusOptions;
pub use types::PeerInfo;
pub use types::ReplicaExited;
pub use types::WriteError;
pub use wiring::try_create_datum_store;
pub use wiring::DatumStoreConfig;
pub use wiring::DatumStoreCreationError;

// So the RPC server and the in-process test network can serve forwarded writes.
pub(crate) use replicated_store::ReplicatedStore;
