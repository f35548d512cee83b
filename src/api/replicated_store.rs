use crate::actor::WeakActorClient;
use crate::api::types::WriteError;
use crate::consensus::{LocalWriteError, PublishInput};
use crate::proxy::LeaderProxy;
use crate::transport::ForwardedPublish;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Copy, Clone, Debug, PartialEq)]
enum Origin {
    /// Called by the application on this node.
    Client,
    /// Relayed here by another node's proxy. Never forwarded again.
    Forwarded,
}

/// ReplicatedStore is the write path shared by the client API and the forwarding RPCs. Writes are
/// applied by the local actor if it's leader, otherwise relayed to the leader.
pub(crate) struct ReplicatedStore {
    logger: slog::Logger,
    actor_client: WeakActorClient,
    proxy: LeaderProxy,
    publish_timeout: Duration,
    // Serializes local writes, including the quorum wait of locked publishes.
    write_lock: Mutex<()>,
}

impl ReplicatedStore {
    pub(crate) fn new(
        logger: slog::Logger,
        actor_client: WeakActorClient,
        proxy: LeaderProxy,
        publish_timeout: Duration,
    ) -> Self {
        ReplicatedStore {
            logger,
            actor_client,
            proxy,
            publish_timeout,
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the timestamp assigned to the new value.
    pub(crate) async fn publish(&self, key: String, value: String, locked: bool) -> Result<u64, WriteError> {
        self.do_publish(key, value, locked, Origin::Client).await
    }

    pub(crate) async fn publish_forwarded(&self, key: String, value: String, locked: bool) -> Result<u64, WriteError> {
        self.do_publish(key, value, locked, Origin::Forwarded).await
    }

    pub(crate) async fn delete(&self, key: String) -> Result<(), WriteError> {
        self.do_delete(key, Origin::Client).await
    }

    pub(crate) async fn delete_forwarded(&self, key: String) -> Result<(), WriteError> {
        self.do_delete(key, Origin::Forwarded).await
    }

    async fn do_publish(&self, key: String, value: String, locked: bool, origin: Origin) -> Result<u64, WriteError> {
        let actor_client = self.actor_client.upgrade().ok_or(WriteError::ReplicaExited)?;
        let input = PublishInput {
            key: key.clone(),
            value: value.clone(),
            locked,
        };

        let guard = self.write_lock.lock().await;
        match actor_client.publish(input).await {
            Ok(output) => {
                if let Some(quorum) = output.quorum {
                    if let Err(rejection) = quorum.wait(self.publish_timeout).await {
                        slog::warn!(
                            self.logger,
                            "Locked publish of {} at {} didn't reach quorum: {}",
                            key,
                            output.timestamp,
                            rejection
                        );
                        return Err(rejection.into());
                    }
                }
                Ok(output.timestamp)
            }
            Err(LocalWriteError::NotLeader { leader }) if origin == Origin::Client => {
                drop(guard);
                let request = ForwardedPublish { key, value, locked };
                Ok(self.proxy.forward_publish(leader, request).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn do_delete(&self, key: String, origin: Origin) -> Result<(), WriteError> {
        let actor_client = self.actor_client.upgrade().ok_or(WriteError::ReplicaExited)?;

        let guard = self.write_lock.lock().await;
        match actor_client.delete(key.clone()).await {
            Ok(()) => Ok(()),
            Err(LocalWriteError::NotLeader { leader }) if origin == Origin::Client => {
                drop(guard);
                Ok(self.proxy.forward_delete(leader, key).await?)
            }
            Err(e) => Err(e.into()),
        }
    }
}
