mod actor;
mod api;
mod consensus;
mod notifier;
mod persistence;
mod proxy;
mod scheduler;
mod server;
mod transport;
mod grpc {
    include!("../generated/datumstore.rs");
}

pub use api::try_create_datum_store;
pub use api::ConsensusOptions;
pub use api::DatumStoreClient;
pub use api::DatumStoreConfig;
pub use api::DatumStoreCreationError;
pub use api::PeerInfo;
pub use api::ReplicaExited;
pub use api::WriteError;
pub use consensus::Datum;
pub use consensus::ElectionStateSnapshot;
pub use consensus::PeerState;
pub use notifier::DatumListener;
pub use notifier::ListenerError;
pub use notifier::ListenerId;
pub use scheduler::MemberSource;
pub use scheduler::StaticMembers;

// Learning 1: `create::{root_mod}` should not have any code. Just `mod` and `pub use` statements.
// Learning 2: All `mod` statements, anywhere, should not be `pub`. Only export `pub` via individual
//             use statements.
//
// This keeps the `crate::{root_mod}` root_mod only responsible for exporting types to the rest of
// crate, and allows me to organize my root_mod impl however I want.
