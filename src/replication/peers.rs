use crate::registry::{MemberStore, ReplicaId};
use crate::replication::forwarder::{spawn_forwarder, ForwarderConfig, ForwarderHandle};
use crate::replication::replication_api::{PeerConnector, PeerInfo};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

struct PeerEntry<T> {
    info: PeerInfo,
    _forwarder: ForwarderHandle,
    digest_transport: Arc<tokio::sync::Mutex<T>>,
}

/// Tracks the cluster's peer replicas. Every peer gets its own forwarder and a transport for
/// anti-entropy rounds. Fed by whatever membership substrate the process uses, through
/// `join()` / `leave()`.
pub(crate) struct PeerTracker<P: PeerConnector> {
    logger: slog::Logger,
    store: Arc<MemberStore>,
    connector: P,
    forwarder_config: ForwarderConfig,
    cancel: CancellationToken,
    peers: Mutex<HashMap<ReplicaId, PeerEntry<P::Transport>>>,
}

impl<P: PeerConnector> PeerTracker<P> {
    pub(crate) fn new(
        logger: slog::Logger,
        store: Arc<MemberStore>,
        connector: P,
        forwarder_config: ForwarderConfig,
        cancel: CancellationToken,
    ) -> Self {
        PeerTracker {
            logger,
            store,
            connector,
            forwarder_config,
            cancel,
            peers: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ReplicaId, PeerEntry<P::Transport>>> {
        self.peers.lock().expect("PeerTracker mutex guard poison")
    }

    /// Returns false if the peer was already known at the same address.
    pub(crate) fn join(&self, peer: PeerInfo) -> bool {
        if &peer.id == self.store.local_id() {
            return false;
        }

        let mut peers = self.lock();
        if let Some(existing) = peers.get(&peer.id) {
            if existing.info == peer {
                return false;
            }
        }

        let logger = self.logger.new(slog::o!("Peer" => peer.id.to_string()));
        slog::info!(logger, "Peer joined at {}", peer.rpc_addr);
        let forwarder = spawn_forwarder(
            logger,
            &self.store,
            self.connector.connect(&peer),
            self.forwarder_config,
            self.cancel.child_token(),
        );
        let entry = PeerEntry {
            info: peer.clone(),
            _forwarder: forwarder,
            digest_transport: Arc::new(tokio::sync::Mutex::new(self.connector.connect(&peer))),
        };
        // Replacing an entry stops the old forwarder.
        peers.insert(peer.id.clone(), entry);
        drop(peers);

        self.store.peer_joined(&peer.id);
        true
    }

    /// Returns false if the peer wasn't known.
    pub(crate) fn leave(&self, peer_id: &ReplicaId, now: i64) -> bool {
        let removed = self.lock().remove(peer_id);
        // Takeover applies even to peers we never saw join.
        self.store.peer_departed(peer_id, now);

        match removed {
            Some(_) => {
                slog::info!(self.logger, "Peer {:?} left", peer_id);
                true
            }
            None => false,
        }
    }

    pub(crate) fn peers(&self) -> Vec<PeerInfo> {
        let mut peers: Vec<PeerInfo> = self.lock().values().map(|entry| entry.info.clone()).collect();
        peers.sort_by(|a, b| a.id.cmp(&b.id));
        peers
    }

    pub(crate) fn digest_targets(&self) -> Vec<(ReplicaId, Arc<tokio::sync::Mutex<P::Transport>>)> {
        let mut targets: Vec<_> = self
            .lock()
            .iter()
            .map(|(id, entry)| (id.clone(), entry.digest_transport.clone()))
            .collect();
        targets.sort_by(|a, b| a.0.cmp(&b.0));
        targets
    }
}
