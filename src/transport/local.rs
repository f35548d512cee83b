//! In-process network for cluster tests. Calls go straight to the target node's actor; a node can
//! be cut off to simulate a partition.
use crate::actor::WeakActorClient;
use crate::api::ReplicatedStore;
use crate::consensus::{Datum, DatumStore, DeleteRequest, EncodedBeat, Peer, PublishRequest, Rejection};
use crate::transport::{ForwardedPublish, PeerTransport, TransportError};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, Weak};

#[derive(Clone)]
struct LocalEndpoint {
    actor: WeakActorClient,
    datums: DatumStore,
    store: Weak<ReplicatedStore>,
}

#[derive(Default)]
pub(crate) struct LocalNetwork {
    nodes: Mutex<HashMap<String, LocalEndpoint>>,
    isolated: Mutex<HashSet<String>>,
}

impl LocalNetwork {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(LocalNetwork::default())
    }

    pub(crate) fn register(
        &self,
        address: &str,
        actor: WeakActorClient,
        datums: DatumStore,
        store: &Arc<ReplicatedStore>,
    ) {
        let endpoint = LocalEndpoint {
            actor,
            datums,
            store: Arc::downgrade(store),
        };
        self.nodes.lock().unwrap().insert(address.to_string(), endpoint);
    }

    /// All traffic to and from `address` fails until `heal` is called.
    pub(crate) fn isolate(&self, address: &str) {
        self.isolated.lock().unwrap().insert(address.to_string());
    }

    pub(crate) fn heal(&self, address: &str) {
        self.isolated.lock().unwrap().remove(address);
    }

    pub(crate) fn transport(self: &Arc<Self>, from: &str) -> Arc<dyn PeerTransport> {
        Arc::new(LocalTransport {
            from: from.to_string(),
            network: self.clone(),
        })
    }

    fn route(&self, from: &str, target: &str) -> Result<LocalEndpoint, TransportError> {
        {
            let isolated = self.isolated.lock().unwrap();
            if isolated.contains(from) || isolated.contains(target) {
                return Err(TransportError::unreachable(target, "partitioned"));
            }
        }

        self.nodes
            .lock()
            .unwrap()
            .get(target)
            .cloned()
            .ok_or_else(|| TransportError::unreachable(target, "no such node"))
    }
}

struct LocalTransport {
    from: String,
    network: Arc<LocalNetwork>,
}

impl LocalTransport {
    fn route(&self, target: &str) -> Result<LocalEndpoint, TransportError> {
        self.network.route(&self.from, target)
    }
}

fn down(target: &str) -> TransportError {
    TransportError::unreachable(target, "node is down")
}

#[async_trait::async_trait]
impl PeerTransport for LocalTransport {
    async fn request_vote(&self, target: &str, candidate: Peer) -> Result<Peer, TransportError> {
        let actor = self.route(target)?.actor.upgrade().ok_or_else(|| down(target))?;
        Ok(actor.received_vote(candidate).await?)
    }

    async fn send_beat(&self, target: &str, beat: EncodedBeat) -> Result<Peer, TransportError> {
        let actor = self.route(target)?.actor.upgrade().ok_or_else(|| down(target))?;
        Ok(actor.received_beat(beat).await?)
    }

    async fn publish(&self, target: &str, request: PublishRequest) -> Result<u64, TransportError> {
        let actor = self.route(target)?.actor.upgrade().ok_or_else(|| down(target))?;
        Ok(actor.received_publish(request).await?)
    }

    async fn delete(&self, target: &str, request: DeleteRequest) -> Result<(), TransportError> {
        let actor = self.route(target)?.actor.upgrade().ok_or_else(|| down(target))?;
        Ok(actor.received_delete(request).await?)
    }

    async fn get_datums(&self, target: &str, keys: Vec<String>) -> Result<Vec<Datum>, TransportError> {
        Ok(self.route(target)?.datums.get_many(&keys))
    }

    async fn get_peer(&self, target: &str) -> Result<Peer, TransportError> {
        let actor = self.route(target)?.actor.upgrade().ok_or_else(|| down(target))?;
        actor.get_peer().await.map_err(|_| down(target))
    }

    async fn forward_publish(&self, target: &str, request: ForwardedPublish) -> Result<u64, TransportError> {
        let store = self.route(target)?.store.upgrade().ok_or_else(|| down(target))?;
        store
            .publish_forwarded(request.key, request.value, request.locked)
            .await
            .map_err(|e| TransportError::Rejected(Rejection::from(e)))
    }

    async fn forward_delete(&self, target: &str, key: String) -> Result<(), TransportError> {
        let store = self.route(target)?.store.upgrade().ok_or_else(|| down(target))?;
        store
            .delete_forwarded(key)
            .await
            .map_err(|e| TransportError::Rejected(Rejection::from(e)))
    }
}
