use crate::consensus::{
    ConsensusEngine, Datum, DeleteRequest, EncodedBeat, LocalWriteError, Peer, PublishInput, PublishOutput,
    PublishRequest, Rejection, Term,
};
use crate::persistence::DatumPersistence;
use crate::server::RpcServerShutdownHandle;
use std::error::Error;
use std::fmt::Debug;
use tokio::sync::{mpsc, oneshot};

// v1 Design choice: Disk interaction is synchronous, inside the event handler. Writes are tiny
//                   (one small JSON record), so a separate disk actor isn't worth it yet.
#[derive(Debug)]
pub(crate) enum Event {
    // Leader: apply locally, broadcast to followers.
    // Others: reject with NotLeader (the API layer forwards).
    Publish(PublishInput, Callback<PublishOutput, LocalWriteError>),
    Delete(String, Callback<(), LocalWriteError>),

    // Inbound peer RPCs.
    ReceivedVote(Peer, Callback<Peer, Rejection>),
    ReceivedBeat(EncodedBeat, Callback<Peer, Rejection>),
    ReceivedPublish(PublishRequest, Callback<u64, Rejection>),
    ReceivedDelete(DeleteRequest, Callback<(), Rejection>),
    GetPeer(oneshot::Sender<Peer>),

    // Outcomes of RPCs we spawned.
    VoteReplyFromPeer(Peer),
    BeatReplyFromPeer(Peer),
    PeerRefreshed(Peer),
    PeerUnreachable(String),
    HigherTermObserved { from: String, term: Term },
    DatumsFetched { source: Peer, datums: Vec<Datum> },

    // Scheduler.
    ElectionTick { elapsed_ms: i64 },
    HeartbeatTick { elapsed_ms: i64 },
    UpdateMembers(Vec<String>),
    SetBeatOnly(bool),
}

#[derive(Debug)]
pub(crate) struct Callback<O: Debug, E: Error>(oneshot::Sender<Result<O, E>>);

impl<O: Debug, E: Error> Callback<O, E> {
    pub(crate) fn send(self, message: Result<O, E>) {
        let _ = self.0.send(message);
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Replica actor has exited")]
pub(crate) struct ActorExited;

impl From<ActorExited> for Rejection {
    fn from(_: ActorExited) -> Self {
        Rejection::ServerFault("Replica actor has exited".to_string())
    }
}

impl From<ActorExited> for LocalWriteError {
    fn from(_: ActorExited) -> Self {
        LocalWriteError::ActorExited
    }
}

/// Strong handle to the actor queue. The actor runs for as long as one of these exists.
#[derive(Clone)]
pub(crate) struct ActorClient {
    sender: mpsc::Sender<Event>,
}

impl ActorClient {
    pub(crate) fn new(buffer_size: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(buffer_size);
        (ActorClient { sender: tx }, rx)
    }

    pub(crate) fn weak(&self) -> WeakActorClient {
        WeakActorClient {
            sender: self.sender.downgrade(),
        }
    }

    pub(crate) async fn publish(&self, input: PublishInput) -> Result<PublishOutput, LocalWriteError> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Publish(input, Callback(tx))).await?;

        rx.await.unwrap_or(Err(LocalWriteError::ActorExited))
    }

    pub(crate) async fn delete(&self, key: String) -> Result<(), LocalWriteError> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Delete(key, Callback(tx))).await?;

        rx.await.unwrap_or(Err(LocalWriteError::ActorExited))
    }

    pub(crate) async fn received_vote(&self, candidate: Peer) -> Result<Peer, Rejection> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::ReceivedVote(candidate, Callback(tx))).await?;

        rx.await.unwrap_or_else(|_| Err(ActorExited.into()))
    }

    pub(crate) async fn received_beat(&self, beat: EncodedBeat) -> Result<Peer, Rejection> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::ReceivedBeat(beat, Callback(tx))).await?;

        rx.await.unwrap_or_else(|_| Err(ActorExited.into()))
    }

    pub(crate) async fn received_publish(&self, request: PublishRequest) -> Result<u64, Rejection> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::ReceivedPublish(request, Callback(tx))).await?;

        rx.await.unwrap_or_else(|_| Err(ActorExited.into()))
    }

    pub(crate) async fn received_delete(&self, request: DeleteRequest) -> Result<(), Rejection> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::ReceivedDelete(request, Callback(tx))).await?;

        rx.await.unwrap_or_else(|_| Err(ActorExited.into()))
    }

    pub(crate) async fn get_peer(&self) -> Result<Peer, ActorExited> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::GetPeer(tx)).await?;

        rx.await.map_err(|_| ActorExited)
    }

    pub(crate) async fn update_members(&self, addresses: Vec<String>) -> Result<(), ActorExited> {
        self.send(Event::UpdateMembers(addresses)).await
    }

    pub(crate) async fn set_beat_only(&self, beat_only: bool) -> Result<(), ActorExited> {
        self.send(Event::SetBeatOnly(beat_only)).await
    }

    async fn send(&self, event: Event) -> Result<(), ActorExited> {
        self.sender.send(event).await.map_err(|_| ActorExited)
    }
}

/// Doesn't keep the actor alive. Used by everything the actor (indirectly) owns: spawned RPC
/// tasks, timers, the RPC server.
#[derive(Clone)]
pub(crate) struct WeakActorClient {
    sender: mpsc::WeakSender<Event>,
}

impl WeakActorClient {
    pub(crate) fn upgrade(&self) -> Option<ActorClient> {
        self.sender.upgrade().map(|sender| ActorClient { sender })
    }

    pub(crate) async fn vote_reply_from_peer(&self, peer: Peer) -> Result<(), ActorExited> {
        self.send(Event::VoteReplyFromPeer(peer)).await
    }

    pub(crate) async fn beat_reply_from_peer(&self, peer: Peer) -> Result<(), ActorExited> {
        self.send(Event::BeatReplyFromPeer(peer)).await
    }

    pub(crate) async fn peer_refreshed(&self, peer: Peer) -> Result<(), ActorExited> {
        self.send(Event::PeerRefreshed(peer)).await
    }

    pub(crate) async fn peer_unreachable(&self, address: String) -> Result<(), ActorExited> {
        self.send(Event::PeerUnreachable(address)).await
    }

    pub(crate) async fn higher_term_observed(&self, from: String, term: Term) -> Result<(), ActorExited> {
        self.send(Event::HigherTermObserved { from, term }).await
    }

    pub(crate) async fn datums_fetched(&self, source: Peer, datums: Vec<Datum>) -> Result<(), ActorExited> {
        self.send(Event::DatumsFetched { source, datums }).await
    }

    pub(crate) async fn election_tick(&self, elapsed_ms: i64) -> Result<(), ActorExited> {
        self.send(Event::ElectionTick { elapsed_ms }).await
    }

    pub(crate) async fn heartbeat_tick(&self, elapsed_ms: i64) -> Result<(), ActorExited> {
        self.send(Event::HeartbeatTick { elapsed_ms }).await
    }

    pub(crate) async fn update_members(&self, addresses: Vec<String>) -> Result<(), ActorExited> {
        self.send(Event::UpdateMembers(addresses)).await
    }

    async fn send(&self, event: Event) -> Result<(), ActorExited> {
        let sender = self.sender.upgrade().ok_or(ActorExited)?;
        sender.send(event).await.map_err(|_| ActorExited)
    }
}

/// ReplicaActor is the consensus engine in actor model.
pub(crate) struct ReplicaActor<P: DatumPersistence> {
    logger: slog::Logger,
    receiver: mpsc::Receiver<Event>,
    engine: ConsensusEngine<P>,
    // Server stops when the actor exits.
    _server_shutdown: Option<RpcServerShutdownHandle>,
}

impl<P: DatumPersistence> ReplicaActor<P> {
    pub(crate) fn new(
        logger: slog::Logger,
        receiver: mpsc::Receiver<Event>,
        engine: ConsensusEngine<P>,
        server_shutdown: Option<RpcServerShutdownHandle>,
    ) -> Self {
        ReplicaActor {
            logger,
            receiver,
            engine,
            _server_shutdown: server_shutdown,
        }
    }

    pub(crate) async fn run_event_loop(mut self) {
        while let Some(event) = self.receiver.recv().await {
            self.handle_event(event);
            self.engine.publish_election_state();
        }
        slog::info!(self.logger, "Replica actor exiting");
    }

    // This must NOT be async. Any long running work must be spawned on another task and come back
    // to this actor as an event.
    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Publish(input, callback) => callback.send(self.engine.publish(input)),
            Event::Delete(key, callback) => callback.send(self.engine.delete(key)),
            Event::ReceivedVote(candidate, callback) => callback.send(self.engine.received_vote(candidate)),
            Event::ReceivedBeat(beat, callback) => callback.send(self.engine.received_beat(beat)),
            Event::ReceivedPublish(request, callback) => callback.send(self.engine.received_publish(request)),
            Event::ReceivedDelete(request, callback) => callback.send(self.engine.received_delete(request)),
            Event::GetPeer(reply) => {
                let _ = reply.send(self.engine.local_peer());
            }
            Event::VoteReplyFromPeer(peer) => self.engine.vote_reply_from_peer(peer),
            Event::BeatReplyFromPeer(peer) => self.engine.beat_reply_from_peer(peer),
            Event::PeerRefreshed(peer) => self.engine.peer_refreshed(peer),
            Event::PeerUnreachable(address) => self.engine.peer_unreachable(&address),
            Event::HigherTermObserved { from, term } => self.engine.higher_term_observed(&from, term),
            Event::DatumsFetched { source, datums } => self.engine.datums_fetched(source, datums),
            Event::ElectionTick { elapsed_ms } => self.engine.election_tick(elapsed_ms),
            Event::HeartbeatTick { elapsed_ms } => self.engine.heartbeat_tick(elapsed_ms),
            Event::UpdateMembers(addresses) => self.engine.update_members(addresses),
            Event::SetBeatOnly(beat_only) => self.engine.set_beat_only(beat_only),
        }
    }
}
