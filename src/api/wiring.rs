use crate::actor::{ActorClient, ReplicaActor};
use crate::api::client::DatumStoreClient;
use crate::api::options::{ConsensusOptions, ConsensusOptionsValidated};
use crate::api::replicated_store::ReplicatedStore;
use crate::consensus::{
    election_state_channel, ConsensusEngine, ConsensusEngineConfig, DatumStore, ElectionStateChangeListener,
    ElectionStateSnapshot, PeerSet,
};
use crate::notifier::{self, DatumListener, Notifier};
use crate::persistence::{DatumPersistence, FileDatumPersistence};
use crate::proxy::LeaderProxy;
use crate::scheduler::{MemberSource, TickerHandle};
use crate::server::{self, RpcServer, RpcServerShutdownHandle};
use crate::transport::{GrpcTransport, PeerTransport};
use std::convert::TryFrom;
use std::error::Error;
use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

pub struct DatumStoreConfig {
    /// `host:port`. Peers reach this node at this address, and the RPC server binds to it.
    pub my_address: String,
    pub cluster_members: Vec<String>,
    // A directory where we can create files and sub-directories to persist datums and the term.
    pub data_directory: PathBuf,
    pub info_logger: slog::Logger,
    pub options: ConsensusOptions,
    /// Polled every tick to refresh the member list. Without one, membership only changes through
    /// `DatumStoreClient::update_members`.
    pub member_source: Option<Arc<dyn MemberSource>>,
    /// Known site identifiers. Informational only.
    pub sites: Vec<String>,
    /// Registered before persisted datums are loaded, so they see a change event for every
    /// datum on disk.
    pub listeners: Vec<Arc<dyn DatumListener>>,
}

#[derive(Debug, thiserror::Error)]
pub enum DatumStoreCreationError {
    #[error("Illegal options for configuring client: {0}")]
    IllegalClientOptions(String),
    #[error("Invalid local address {address:?}")]
    InvalidAddress {
        address: String,
        #[source]
        source: AddrParseError,
    },
    // We will need to relax this later when adding membership changes.
    #[error("my address not in cluster config")]
    MeNotInCluster,
    #[error("Failed to load persisted state")]
    Persistence(#[source] Box<dyn Error + Send + Sync>),
}

pub async fn try_create_datum_store(config: DatumStoreConfig) -> Result<DatumStoreClient, DatumStoreCreationError> {
    let options = ConsensusOptionsValidated::try_from(config.options)
        .map_err(|e| DatumStoreCreationError::IllegalClientOptions(e.to_string()))?;

    if !config.cluster_members.contains(&config.my_address) {
        return Err(DatumStoreCreationError::MeNotInCluster);
    }
    let my_server_addr: SocketAddr = match config.my_address.parse() {
        Ok(addr) => addr,
        Err(e) => {
            return Err(DatumStoreCreationError::InvalidAddress {
                address: config.my_address,
                source: e,
            })
        }
    };

    let root_logger = config.info_logger.new(slog::o!("node" => config.my_address.clone()));

    let persistence = FileDatumPersistence::open(root_logger.clone(), &config.data_directory)
        .map_err(|e| DatumStoreCreationError::Persistence(e.into()))?;
    let transport = Arc::new(GrpcTransport::new(root_logger.clone(), options.rpc_timeout));

    let (server_shutdown_handle, server_shutdown_signal) = server::shutdown_signal();

    let node = create_node(NodeConfig {
        logger: root_logger.clone(),
        my_address: config.my_address,
        cluster_members: config.cluster_members,
        sites: config.sites,
        listeners: config.listeners,
        options: options.clone(),
        persistence,
        transport,
        server_shutdown: Some(server_shutdown_handle),
    })?;

    let rpc_server = RpcServer::new(
        root_logger.clone(),
        node.actor_client.weak(),
        node.datums.clone(),
        node.store.clone(),
    );
    tokio::spawn(rpc_server.run(my_server_addr, server_shutdown_signal));

    let ticker = TickerHandle::spawn(
        root_logger,
        options.tick_period,
        node.actor_client.weak(),
        config.member_source,
    );

    Ok(node.into_client(Some(ticker)))
}

/// Everything a node needs except the RPC server and the ticker. Cluster tests wire nodes
/// together in-process with this and drive ticks by hand.
pub(crate) struct NodeConfig<P: DatumPersistence> {
    pub(crate) logger: slog::Logger,
    pub(crate) my_address: String,
    pub(crate) cluster_members: Vec<String>,
    pub(crate) sites: Vec<String>,
    pub(crate) listeners: Vec<Arc<dyn DatumListener>>,
    pub(crate) options: ConsensusOptionsValidated,
    pub(crate) persistence: P,
    pub(crate) transport: Arc<dyn PeerTransport>,
    pub(crate) server_shutdown: Option<RpcServerShutdownHandle>,
}

pub(crate) struct Node {
    pub(crate) my_address: String,
    pub(crate) actor_client: ActorClient,
    pub(crate) store: Arc<ReplicatedStore>,
    pub(crate) datums: DatumStore,
    pub(crate) notifier: Notifier,
    pub(crate) election_state: ElectionStateChangeListener,
}

impl Node {
    pub(crate) fn into_client(self, ticker: Option<TickerHandle>) -> DatumStoreClient {
        DatumStoreClient {
            local_address: self.my_address,
            actor_client: self.actor_client,
            store: self.store,
            datums: self.datums,
            notifier: self.notifier,
            election_state: self.election_state,
            _ticker: ticker,
        }
    }
}

pub(crate) fn create_node<P: DatumPersistence>(config: NodeConfig<P>) -> Result<Node, DatumStoreCreationError> {
    let logger = config.logger;
    let options = config.options;

    let (actor_client, actor_queue_rx) = ActorClient::new(64);

    let datums = DatumStore::new();
    let (notifier, notifier_task) = notifier::create(logger.clone(), options.notifier_queue_capacity, datums.clone());
    for listener in config.listeners {
        notifier.listen(listener);
    }

    let mut peers = PeerSet::new(
        logger.clone(),
        config.my_address.clone(),
        &config.cluster_members,
        options.timeouts(),
    );
    peers.add_sites(config.sites);

    let (state_notifier, election_state) = election_state_channel(ElectionStateSnapshot::FollowerNoLeader);

    let mut engine = ConsensusEngine::new(ConsensusEngineConfig {
        logger: logger.clone(),
        peers,
        datums: datums.clone(),
        persistence: config.persistence,
        notifier: notifier.clone(),
        transport: config.transport.clone(),
        actor_client: actor_client.weak(),
        state_notifier,
        options: options.engine_options(),
    });
    engine
        .load()
        .map_err(|e| DatumStoreCreationError::Persistence(e.into()))?;
    engine.publish_election_state();

    tokio::spawn(notifier_task.run());

    let replica_actor = ReplicaActor::new(logger.clone(), actor_queue_rx, engine, config.server_shutdown);
    tokio::spawn(replica_actor.run_event_loop());

    let proxy = LeaderProxy::new(logger.clone(), config.my_address.clone(), config.transport);
    let store = Arc::new(ReplicatedStore::new(
        logger,
        actor_client.weak(),
        proxy,
        options.publish_timeout,
    ));

    Ok(Node {
        my_address: config.my_address,
        actor_client,
        store,
        datums,
        notifier,
        election_state,
    })
}
