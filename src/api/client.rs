use crate::actor::ActorClient;
use crate::api::replicated_store::ReplicatedStore;
use crate::api::types::{PeerInfo, ReplicaExited, WriteError};
use crate::consensus::{Datum, DatumStore, ElectionStateChangeListener, ElectionStateSnapshot};
use crate::notifier::{DatumListener, ListenerId, Notifier};
use crate::scheduler::TickerHandle;
use std::sync::Arc;

/// DatumStoreClient is the application's handle to the local replica. Dropping it shuts the
/// replica down: ticks stop, the actor exits and the RPC server closes.
pub struct DatumStoreClient {
    pub(crate) local_address: String,
    pub(crate) actor_client: ActorClient,
    pub(crate) store: Arc<ReplicatedStore>,
    pub(crate) datums: DatumStore,
    pub(crate) notifier: Notifier,
    pub(crate) election_state: ElectionStateChangeListener,
    pub(crate) _ticker: Option<TickerHandle>,
}

impl DatumStoreClient {
    /// Write `value` under `key`. On a non-leader the write is relayed to the leader. Returns once
    /// the leader has applied it; followers receive it asynchronously.
    pub async fn publish(&self, key: impl Into<String>, value: impl Into<String>) -> Result<u64, WriteError> {
        self.store.publish(key.into(), value.into(), false).await
    }

    /// Like `publish`, but also waits until a majority of the cluster applied the value. On
    /// `WriteError::QuorumTimeout` the value is still applied on the leader.
    pub async fn publish_locked(&self, key: impl Into<String>, value: impl Into<String>) -> Result<u64, WriteError> {
        self.store.publish(key.into(), value.into(), true).await
    }

    pub async fn delete(&self, key: impl Into<String>) -> Result<(), WriteError> {
        self.store.delete(key.into()).await
    }

    /// Local read. May lag the leader.
    pub fn get_datum(&self, key: &str) -> Option<Datum> {
        self.datums.get(key)
    }

    pub fn is_leader(&self) -> bool {
        self.election_state() == ElectionStateSnapshot::Leader
    }

    /// Address of the leader as this node sees it.
    pub fn leader(&self) -> Option<String> {
        match self.election_state() {
            ElectionStateSnapshot::Leader => Some(self.local_address.clone()),
            ElectionStateSnapshot::Follower(leader) => Some(leader),
            ElectionStateSnapshot::Candidate | ElectionStateSnapshot::FollowerNoLeader => None,
        }
    }

    pub fn election_state(&self) -> ElectionStateSnapshot {
        self.election_state.current()
    }

    /// Waits for the next leadership change. Intermediate states between two calls are
    /// collapsed into the most recent one. Returns `None` once the replica has exited.
    pub async fn next_election_state(&mut self) -> Option<ElectionStateSnapshot> {
        self.election_state.next().await
    }

    pub async fn local_peer(&self) -> Result<PeerInfo, ReplicaExited> {
        let peer = self.actor_client.get_peer().await?;
        Ok(PeerInfo::from(peer))
    }

    pub fn listen(&self, listener: Arc<dyn DatumListener>) -> ListenerId {
        self.notifier.listen(listener)
    }

    /// Returns false if `id` wasn't registered.
    pub fn unlisten(&self, id: ListenerId) -> bool {
        self.notifier.unlisten(id)
    }

    /// Replace the member list. The local node is always kept.
    pub async fn update_members(&self, addresses: Vec<String>) -> Result<(), ReplicaExited> {
        Ok(self.actor_client.update_members(addresses).await?)
    }

    /// Toggle beat-only mode: beats carry no digest and anti-entropy is skipped.
    pub async fn set_beat_only(&self, beat_only: bool) -> Result<(), ReplicaExited> {
        Ok(self.actor_client.set_beat_only(beat_only).await?)
    }
}
