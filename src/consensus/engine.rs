use crate::actor::WeakActorClient;
use crate::consensus::beat::{self, Beat, EncodedBeat};
use crate::consensus::datum::{Datum, DatumStore, DigestEntry};
use crate::consensus::engine_api::{
    DeleteRequest, LocalWriteError, PublishInput, PublishOutput, PublishRequest, QuorumWaiter, Rejection,
};
use crate::consensus::keys;
use crate::consensus::peers::{Peer, PeerSet, PeerState};
use crate::consensus::state_change_listener::{ElectionStateChangeNotifier, ElectionStateSnapshot};
use crate::consensus::term::Term;
use crate::notifier::{Action, Notifier};
use crate::persistence::{DatumPersistence, PersistenceError};
use crate::transport::{PeerTransport, TransportError};
use std::collections::HashSet;
use std::future::Future;
use std::mem;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Engine tunables that come from the validated options.
#[derive(Clone, Debug)]
pub(crate) struct EngineOptions {
    pub(crate) fetch_batch_size: usize,
    pub(crate) beat_compression_threshold: usize,
    pub(crate) beat_only: bool,
}

pub(crate) struct ConsensusEngineConfig<P: DatumPersistence> {
    pub(crate) logger: slog::Logger,
    pub(crate) peers: PeerSet,
    pub(crate) datums: DatumStore,
    pub(crate) persistence: P,
    pub(crate) notifier: Notifier,
    pub(crate) transport: Arc<dyn PeerTransport>,
    pub(crate) actor_client: WeakActorClient,
    pub(crate) state_notifier: ElectionStateChangeNotifier,
    pub(crate) options: EngineOptions,
}

/// ConsensusEngine owns the local peer registry and is the only writer of the datum map. Every
/// method runs on the actor task and never awaits; RPCs are spawned and their outcomes come
/// back as actor events.
pub(crate) struct ConsensusEngine<P: DatumPersistence> {
    logger: slog::Logger,
    peers: PeerSet,
    datums: DatumStore,
    persistence: P,
    notifier: Notifier,
    transport: Arc<dyn PeerTransport>,
    actor_client: WeakActorClient,
    state_notifier: ElectionStateChangeNotifier,
    options: EngineOptions,
    initialized: bool,
}

impl<P: DatumPersistence> ConsensusEngine<P> {
    pub(crate) fn new(config: ConsensusEngineConfig<P>) -> Self {
        ConsensusEngine {
            logger: config.logger,
            peers: config.peers,
            datums: config.datums,
            persistence: config.persistence,
            notifier: config.notifier,
            transport: config.transport,
            actor_client: config.actor_client,
            state_notifier: config.state_notifier,
            options: config.options,
            initialized: false,
        }
    }

    /// Reload persisted datums and term. Loaded datums go through the notifier like any other
    /// applied write. Until this succeeds, inbound peer RPCs are rejected.
    pub(crate) fn load(&mut self) -> Result<(), PersistenceError> {
        let datums = self.persistence.load_datums()?;
        let count = datums.len();
        for datum in datums {
            let key = datum.key.clone();
            self.datums.insert(datum);
            self.notifier.add_task(&key, Action::Change);
        }

        if let Some(term) = self.persistence.load_term()? {
            self.peers.set_term(term);
        }
        self.initialized = true;

        slog::info!(
            self.logger,
            "Loaded {} datums at term {:?}. Members: {:?}, sites: {:?}",
            count,
            self.peers.term(),
            self.peers.remote_addresses(),
            self.peers.sites()
        );
        Ok(())
    }

    pub(crate) fn local_peer(&self) -> Peer {
        self.peers.local().clone()
    }

    pub(crate) fn publish_election_state(&self) {
        let snapshot = if self.peers.is_local_leader() {
            ElectionStateSnapshot::Leader
        } else if self.peers.local().state == PeerState::Candidate {
            ElectionStateSnapshot::Candidate
        } else {
            match self.peers.leader_address() {
                Some(leader) => ElectionStateSnapshot::Follower(leader.to_string()),
                None => ElectionStateSnapshot::FollowerNoLeader,
            }
        };
        self.state_notifier.notify_new_state(snapshot);
    }

    // ------- Election --------

    pub(crate) fn election_tick(&mut self, elapsed_ms: i64) {
        if !self.initialized {
            return;
        }
        if self.peers.is_standalone() {
            self.peers.ensure_standalone_leader();
            return;
        }

        let local = self.peers.local_mut();
        local.leader_due_ms -= elapsed_ms;
        if local.leader_due_ms > 0 {
            return;
        }

        self.peers.reset_leader_due();
        self.peers.reset_heartbeat_due();
        self.send_vote();
    }

    fn send_vote(&mut self) {
        self.peers.reset();
        self.peers.step_down(PeerState::Candidate);
        let local = self.peers.local_mut();
        local.term.incr();
        local.vote_for = Some(local.address.clone());
        self.persist_term();

        let candidate = self.peers.local().clone();
        slog::info!(self.logger, "Leader timed out. Starting election for term {:?}", candidate.term);

        for target in self.peers.remote_addresses() {
            let transport = self.transport.clone();
            let actor = self.actor_client.clone();
            let logger = self.logger.new(slog::o!("rpc" => "vote", "peer" => target.clone()));
            let candidate = candidate.clone();
            spawn(async move {
                match transport.request_vote(&target, candidate).await {
                    Ok(voter) => {
                        let _ = actor.vote_reply_from_peer(voter).await;
                    }
                    Err(e) => report_rpc_failure(&logger, &actor, target, e).await,
                }
            });
        }
    }

    pub(crate) fn received_vote(&mut self, remote: Peer) -> Result<Peer, Rejection> {
        if !self.initialized {
            return Err(Rejection::NotInitialized);
        }
        if !self.peers.contains(&remote.address) {
            slog::warn!(self.logger, "Vote request from unknown peer {}", remote.address);
            return Err(Rejection::UnknownPeer);
        }

        if remote.term <= self.peers.term() {
            let local = self.peers.local_mut();
            if local.vote_for.is_none() {
                local.vote_for = Some(local.address.clone());
            }
            return Ok(self.peers.local().clone());
        }

        slog::info!(
            self.logger,
            "Voting for {} at term {:?} (was term {:?})",
            remote.address,
            remote.term,
            self.peers.term()
        );
        self.peers.reset_leader_due();
        self.peers.step_down(PeerState::Follower);
        self.peers.local_mut().vote_for = Some(remote.address.clone());
        self.peers.set_term(remote.term);
        self.persist_term();

        Ok(self.peers.local().clone())
    }

    pub(crate) fn vote_reply_from_peer(&mut self, voter: Peer) {
        self.peers.decide_leader(voter);
    }

    // ------- Heartbeat --------

    pub(crate) fn heartbeat_tick(&mut self, elapsed_ms: i64) {
        if !self.initialized {
            return;
        }

        self.peers.age_beat_leases(elapsed_ms);
        let local = self.peers.local_mut();
        local.heartbeat_due_ms -= elapsed_ms;
        if local.heartbeat_due_ms > 0 {
            return;
        }

        self.peers.reset_heartbeat_due();
        self.send_beat();
    }

    fn send_beat(&mut self) {
        if self.peers.is_standalone() {
            self.peers.reset_leader_due();
            return;
        }
        if self.peers.local().state != PeerState::Leader || !self.peers.is_local_leader() {
            return;
        }
        if !self.peers.has_quorum_lease() {
            slog::warn!(
                self.logger,
                "No beat acks from a majority within the leader timeout. Stepping down at term {:?}",
                self.peers.term()
            );
            self.peers.step_down(PeerState::Follower);
            self.peers.reset_leader_due();
            self.publish_election_state();
            return;
        }

        self.peers.reset_leader_due();
        let digest = if self.options.beat_only {
            None
        } else {
            Some(self.datums.digest())
        };
        let beat = Beat {
            peer: self.peers.local().clone(),
            digest,
        };
        let encoded = match beat::encode(&beat, self.options.beat_compression_threshold) {
            Ok(encoded) => encoded,
            Err(e) => {
                slog::error!(self.logger, "Failed to encode beat: {}", e);
                return;
            }
        };
        slog::debug!(
            self.logger,
            "Sending beat: {} bytes, compressed: {}",
            encoded.payload.len(),
            encoded.compressed
        );

        for target in self.peers.remote_addresses() {
            let transport = self.transport.clone();
            let actor = self.actor_client.clone();
            let logger = self.logger.new(slog::o!("rpc" => "beat", "peer" => target.clone()));
            let encoded = encoded.clone();
            spawn(async move {
                match transport.send_beat(&target, encoded).await {
                    Ok(follower) => {
                        let _ = actor.beat_reply_from_peer(follower).await;
                    }
                    Err(e) => report_rpc_failure(&logger, &actor, target, e).await,
                }
            });
        }
    }

    pub(crate) fn beat_reply_from_peer(&mut self, follower: Peer) {
        self.peers.record_beat_ack(&follower.address);
        self.peers.update(follower);
    }

    pub(crate) fn received_beat(&mut self, encoded: EncodedBeat) -> Result<Peer, Rejection> {
        if !self.initialized {
            return Err(Rejection::NotInitialized);
        }
        let beat = beat::decode(&encoded).map_err(|e| Rejection::InvalidInput(format!("Undecodable beat: {}", e)))?;
        let remote = beat.peer;

        if !self.peers.contains(&remote.address) {
            slog::warn!(self.logger, "Beat from unknown peer {}", remote.address);
            return Err(Rejection::UnknownPeer);
        }
        if remote.state != PeerState::Leader {
            slog::warn!(self.logger, "Beat from {} which is in state {:?}", remote.address, remote.state);
            return Err(Rejection::NotLeader {
                leader: self.peers.leader_address().map(str::to_string),
            });
        }
        if self.peers.term() > remote.term {
            slog::warn!(
                self.logger,
                "Beat from {} with stale term {:?}. Local term is {:?}",
                remote.address,
                remote.term,
                self.peers.term()
            );
            return Err(Rejection::StaleTerm {
                current_term: self.peers.term(),
            });
        }

        if self.peers.local().state != PeerState::Follower {
            slog::info!(
                self.logger,
                "Beat from {}. Becoming follower (was {:?})",
                remote.address,
                self.peers.local().state
            );
            self.peers.step_down(PeerState::Follower);
            self.peers.local_mut().vote_for = Some(remote.address.clone());
        }

        self.peers.reset_leader_due();
        self.peers.reset_heartbeat_due();
        for stale_leader in self.peers.make_leader(remote.clone()) {
            self.refresh_peer(stale_leader);
        }

        match beat.digest {
            Some(digest) if !self.options.beat_only => self.reconcile_digest(&remote, digest),
            _ => {}
        }

        Ok(self.peers.local().clone())
    }

    /// Ask a peer for its own descriptor. If it's unreachable, its mirror falls back to follower.
    fn refresh_peer(&self, target: String) {
        let transport = self.transport.clone();
        let actor = self.actor_client.clone();
        let logger = self.logger.new(slog::o!("rpc" => "get_peer", "peer" => target.clone()));
        spawn(async move {
            match transport.get_peer(&target).await {
                Ok(peer) => {
                    let _ = actor.peer_refreshed(peer).await;
                }
                Err(e) => {
                    slog::warn!(logger, "Failed to refresh peer: {}", e);
                    let _ = actor.peer_unreachable(target).await;
                }
            }
        });
    }

    pub(crate) fn peer_refreshed(&mut self, peer: Peer) {
        self.peers.update(peer);
    }

    pub(crate) fn peer_unreachable(&mut self, address: &str) {
        self.peers.mark_unreachable(address);
    }

    pub(crate) fn higher_term_observed(&mut self, from: &str, term: Term) {
        if term <= self.peers.term() || self.peers.local().state != PeerState::Leader {
            return;
        }

        slog::info!(
            self.logger,
            "Peer {} is at term {:?}, ahead of our {:?}. Stepping down.",
            from,
            term,
            self.peers.term()
        );
        self.peers.step_down(PeerState::Follower);
        self.peers.set_term(term);
        self.peers.reset_leader_due();
        self.persist_term();
    }

    // ------- Anti-entropy --------

    fn reconcile_digest(&mut self, leader: &Peer, digest: Vec<DigestEntry>) {
        let mut unseen: HashSet<String> = self.datums.keys().into_iter().collect();
        let mut batch = Vec::new();

        for entry in digest {
            let key = keys::detail_key(&entry.key);
            unseen.remove(&key);

            let stale = match self.datums.timestamp(&key) {
                Some(local_timestamp) => local_timestamp < entry.timestamp,
                None => true,
            };
            if stale {
                batch.push(key);
                if batch.len() >= self.options.fetch_batch_size {
                    self.fetch_datums(leader.clone(), mem::take(&mut batch));
                }
            }
        }
        if !batch.is_empty() {
            self.fetch_datums(leader.clone(), batch);
        }

        for key in unseen {
            slog::info!(self.logger, "Key {} is gone from leader {}. Deleting.", key, leader.address);
            if let Err(e) = self.apply_delete(&key) {
                slog::error!(self.logger, "Failed to delete {} during anti-entropy: {}", key, e);
            }
        }
    }

    fn fetch_datums(&self, leader: Peer, keys: Vec<String>) {
        let transport = self.transport.clone();
        let actor = self.actor_client.clone();
        let logger = self.logger.new(slog::o!("rpc" => "get_datums", "peer" => leader.address.clone()));
        slog::debug!(logger, "Fetching {} stale keys", keys.len());
        spawn(async move {
            match transport.get_datums(&leader.address, keys).await {
                Ok(datums) => {
                    let _ = actor.datums_fetched(leader, datums).await;
                }
                Err(e) => slog::warn!(logger, "Failed to fetch datums: {}", e),
            }
        });
    }

    pub(crate) fn datums_fetched(&mut self, source: Peer, datums: Vec<Datum>) {
        if !self.peers.is_leader(&source.address) || source.term < self.peers.term() {
            slog::warn!(
                self.logger,
                "Dropping {} datums fetched from {}. It is no longer a current leader.",
                datums.len(),
                source.address
            );
            return;
        }

        for datum in datums {
            if let Some(local_timestamp) = self.datums.timestamp(&datum.key) {
                if local_timestamp >= datum.timestamp {
                    continue;
                }
            }
            let key = datum.key.clone();
            if let Err(e) = self.apply_from_leader(datum, &source) {
                slog::error!(self.logger, "Failed to apply fetched datum {}: {}", key, e);
            }
        }
    }

    // ------- Writes --------

    pub(crate) fn publish(&mut self, input: PublishInput) -> Result<PublishOutput, LocalWriteError> {
        if input.key.is_empty() {
            return Err(LocalWriteError::InvalidInput("Key must not be empty".to_string()));
        }
        if input.value.trim().is_empty() {
            return Err(LocalWriteError::InvalidInput("Value must not be blank".to_string()));
        }
        if !self.peers.is_local_leader() {
            return Err(LocalWriteError::NotLeader {
                leader: self.peers.leader_address().map(str::to_string),
            });
        }

        let timestamp = self.datums.timestamp(&input.key).map_or(1, |current| current + 1);
        let datum = Datum {
            key: input.key,
            value: input.value,
            timestamp,
        };

        // Term first: a failure past this point leaves nothing applied.
        let term = self.peers.term_after_write();
        self.persistence.update_term(term)?;
        self.persistence.write(&datum)?;
        self.peers.set_term(term);
        self.datums.insert(datum.clone());
        self.peers.reset_leader_due();
        self.notifier.add_task(&datum.key, Action::Change);

        let quorum = self.broadcast_publish(datum, input.locked);

        Ok(PublishOutput { timestamp, quorum })
    }

    fn broadcast_publish(&self, datum: Datum, locked: bool) -> Option<QuorumWaiter> {
        let targets = self.peers.remote_addresses();
        let request = PublishRequest {
            datum,
            source: self.peers.local().clone(),
        };

        let (ack_sender, waiter) = if locked {
            let (tx, rx) = mpsc::channel(targets.len().max(1));
            let required = self.peers.majority_count() - 1;
            (Some(tx), Some(QuorumWaiter::new(rx, required)))
        } else {
            (None, None)
        };

        for target in targets {
            let transport = self.transport.clone();
            let actor = self.actor_client.clone();
            let logger = self.logger.new(slog::o!("rpc" => "publish", "peer" => target.clone()));
            let request = request.clone();
            let ack_sender = ack_sender.clone();
            spawn(async move {
                match transport.publish(&target, request).await {
                    Ok(_) => {
                        if let Some(ack_sender) = ack_sender {
                            let _ = ack_sender.send(()).await;
                        }
                    }
                    Err(e) => report_rpc_failure(&logger, &actor, target, e).await,
                }
            });
        }

        waiter
    }

    pub(crate) fn received_publish(&mut self, request: PublishRequest) -> Result<u64, Rejection> {
        if !self.initialized {
            return Err(Rejection::NotInitialized);
        }
        if request.datum.value.trim().is_empty() {
            return Err(Rejection::InvalidInput("Value must not be blank".to_string()));
        }
        self.validate_leader_source(&request.source)?;

        if let Some(local_timestamp) = self.datums.timestamp(&request.datum.key) {
            if local_timestamp >= request.datum.timestamp {
                slog::debug!(
                    self.logger,
                    "Ignoring publish of {} at {}. Already at {}",
                    request.datum.key,
                    request.datum.timestamp,
                    local_timestamp
                );
                self.peers.reset_leader_due();
                return Ok(local_timestamp);
            }
        }

        let timestamp = request.datum.timestamp;
        self.apply_from_leader(request.datum, &request.source).map_err(|e| {
            slog::error!(self.logger, "Failed to apply published datum: {}", e);
            Rejection::ServerFault(e.to_string())
        })?;

        Ok(timestamp)
    }

    pub(crate) fn delete(&mut self, key: String) -> Result<(), LocalWriteError> {
        if key.is_empty() {
            return Err(LocalWriteError::InvalidInput("Key must not be empty".to_string()));
        }
        if !self.peers.is_local_leader() {
            return Err(LocalWriteError::NotLeader {
                leader: self.peers.leader_address().map(str::to_string),
            });
        }

        self.apply_delete(&key)?;

        let request = DeleteRequest {
            key,
            source: self.peers.local().clone(),
        };
        for target in self.peers.remote_addresses() {
            let transport = self.transport.clone();
            let actor = self.actor_client.clone();
            let logger = self.logger.new(slog::o!("rpc" => "delete", "peer" => target.clone()));
            let request = request.clone();
            spawn(async move {
                if let Err(e) = transport.delete(&target, request).await {
                    report_rpc_failure(&logger, &actor, target, e).await;
                }
            });
        }

        Ok(())
    }

    pub(crate) fn received_delete(&mut self, request: DeleteRequest) -> Result<(), Rejection> {
        if !self.initialized {
            return Err(Rejection::NotInitialized);
        }
        self.validate_leader_source(&request.source)?;

        self.apply_delete(&request.key).map_err(|e| {
            slog::error!(self.logger, "Failed to apply delete of {}: {}", request.key, e);
            Rejection::ServerFault(e.to_string())
        })?;
        self.peers.reset_leader_due();
        self.peers.ratchet_term_toward(request.source.term);
        self.persist_term();

        Ok(())
    }

    // ------- Membership & modes --------

    pub(crate) fn update_members(&mut self, addresses: Vec<String>) {
        if self.peers.reconcile(&addresses) {
            slog::info!(self.logger, "Membership is now {:?}", self.peers.remote_addresses());
        }
    }

    pub(crate) fn set_beat_only(&mut self, beat_only: bool) {
        if self.options.beat_only != beat_only {
            slog::info!(self.logger, "Beat-only mode: {}", beat_only);
            self.options.beat_only = beat_only;
        }
    }

    // ------- Helpers --------

    fn validate_leader_source(&self, source: &Peer) -> Result<(), Rejection> {
        if !self.peers.contains(&source.address) {
            slog::warn!(self.logger, "Write from unknown peer {}", source.address);
            return Err(Rejection::UnknownPeer);
        }
        if !self.peers.is_leader(&source.address) {
            slog::warn!(
                self.logger,
                "Write from {} which isn't leader. Leader is {:?}",
                source.address,
                self.peers.leader_address()
            );
            return Err(Rejection::NotLeader {
                leader: self.peers.leader_address().map(str::to_string),
            });
        }
        if source.term < self.peers.term() {
            slog::warn!(
                self.logger,
                "Write from {} with stale term {:?}. Local term is {:?}",
                source.address,
                source.term,
                self.peers.term()
            );
            return Err(Rejection::StaleTerm {
                current_term: self.peers.term(),
            });
        }

        Ok(())
    }

    /// Follower apply: ratcheted term, then the datum on disk, then memory and notification.
    fn apply_from_leader(&mut self, datum: Datum, source: &Peer) -> Result<(), PersistenceError> {
        self.persistence.update_term(self.peers.ratcheted_term(source.term))?;
        self.persistence.write(&datum)?;
        let key = datum.key.clone();
        self.datums.insert(datum);
        self.notifier.add_task(&key, Action::Change);

        self.peers.reset_leader_due();
        self.peers.ratchet_term_toward(source.term);
        Ok(())
    }

    fn apply_delete(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.persistence.delete(key)?;
        if self.datums.remove(key).is_some() {
            self.notifier.add_task(key, Action::Delete);
        }
        Ok(())
    }

    fn persist_term(&mut self) {
        if let Err(e) = self.persistence.update_term(self.peers.term()) {
            slog::error!(self.logger, "Failed to persist term {:?}: {}", self.peers.term(), e);
        }
    }
}

fn spawn<F: Future<Output = ()> + Send + 'static>(future: F) {
    tokio::task::spawn(future);
}

async fn report_rpc_failure(logger: &slog::Logger, actor: &WeakActorClient, target: String, error: TransportError) {
    match error {
        TransportError::Rejected(Rejection::StaleTerm { current_term }) => {
            slog::warn!(logger, "Rejected: peer is at term {:?}", current_term);
            let _ = actor.higher_term_observed(target, current_term).await;
        }
        TransportError::Rejected(rejection) => {
            slog::warn!(logger, "Rejected: {}", rejection);
        }
        TransportError::Unreachable { message, .. } => {
            slog::warn!(logger, "Unreachable: {}", message);
            let _ = actor.peer_unreachable(target).await;
        }
    }
}
