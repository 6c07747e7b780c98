use crate::api::options::RegistryOptionsValidated;
use crate::api::registry::Registry;
use crate::registry::{LivenessTimeouts, MemberState, MemberStore, ReplicaId, StoreConfig};
use crate::replication::{AntiEntropyTimer, ForwarderConfig, GrpcPeerConnector, PeerInfo, PeerTracker};
use crate::server::RpcServer;
use crate::timers::{Clock, LivenessTimer, RealClock};
use crate::RegistryOptions;
use std::convert::TryFrom;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub struct RegistryConfig {
    pub my_replica_id: String,
    /// Address the registry serves both client and replica RPCs on.
    pub rpc_addr: SocketAddr,
    /// Initial peers. More can be added through `Registry::join()`.
    pub peers: Vec<PeerInfo>,
    /// The replica's own member record. Its id is replaced by `my_replica_id`.
    pub local_member: MemberState,
    pub info_logger: slog::Logger,
    pub options: RegistryOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryCreationError {
    #[error("Replica ID must be non-empty")]
    EmptyReplicaId,
    #[error("Invalid peer: {0}")]
    InvalidPeer(String),
    #[error("Illegal options for configuring registry: {0}")]
    IllegalOptions(String),
    #[error("Failed to bind RPC server address")]
    Bind(#[source] io::Error),
}

pub async fn try_create_registry(config: RegistryConfig) -> Result<Registry, RegistryCreationError> {
    if config.my_replica_id.is_empty() {
        return Err(RegistryCreationError::EmptyReplicaId);
    }
    for peer in config.peers.iter() {
        if peer.id.as_str().is_empty() {
            return Err(RegistryCreationError::InvalidPeer(format!(
                "Peer at {} has an empty ID",
                peer.rpc_addr
            )));
        }
    }

    let options = RegistryOptionsValidated::try_from(config.options)
        .map_err(|e| RegistryCreationError::IllegalOptions(e.to_string()))?;

    let listener = TcpListener::bind(config.rpc_addr)
        .await
        .map_err(RegistryCreationError::Bind)?;
    let local_addr = listener.local_addr().map_err(RegistryCreationError::Bind)?;

    let local_id = ReplicaId::new(config.my_replica_id);
    let root_logger = config.info_logger.new(slog::o!("ReplicaId" => local_id.to_string()));
    let clock = RealClock;
    let cancel = CancellationToken::new();

    let store_config = StoreConfig {
        timeouts: LivenessTimeouts::new(
            options.heartbeat_timeout,
            options.reconnect_timeout,
            options.tombstone_timeout,
        ),
        digest_size: options.digest_size,
    };
    let store = Arc::new(MemberStore::new(
        root_logger.clone(),
        local_id.clone(),
        config.local_member,
        store_config,
        clock.now_ms(),
    ));

    let forwarder_config = ForwarderConfig {
        queue_size: options.forwarder_queue_size,
        initial_backoff: options.forwarder_initial_backoff,
        max_backoff: options.forwarder_max_backoff,
    };
    let connector = GrpcPeerConnector::new(root_logger.clone(), local_id.clone(), options.rpc_timeout);
    let peers = Arc::new(PeerTracker::new(
        root_logger.clone(),
        store.clone(),
        connector,
        forwarder_config,
        cancel.clone(),
    ));
    for peer in config.peers {
        peers.join(peer);
    }

    LivenessTimer::spawn(store.clone(), options.liveness_check_interval, cancel.clone());
    AntiEntropyTimer::spawn(
        root_logger.clone(),
        store.clone(),
        peers.clone(),
        options.anti_entropy_interval,
        cancel.clone(),
    );

    let server = RpcServer::new(
        root_logger.clone(),
        store.clone(),
        options.subscriber_queue_size,
        cancel.clone(),
    );
    tokio::spawn(server.run(listener));
    slog::info!(root_logger, "Registry replica started on {}", local_addr);

    Ok(Registry::new(root_logger, store, peers, clock, local_addr, cancel))
}
