use crate::registry::{KnownVersions, MemberStore, ReplicaId, Subscription, UpdateCallback, VersionedMember};
use crate::replication::{GrpcPeerConnector, PeerInfo, PeerTracker};
use crate::timers::{Clock, RealClock};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Handle to a running registry replica. Dropping it stops every background task of the replica
/// and its RPC server.
pub struct Registry {
    logger: slog::Logger,
    store: Arc<MemberStore>,
    peers: Arc<PeerTracker<GrpcPeerConnector>>,
    clock: RealClock,
    local_addr: SocketAddr,
    _shutdown: DropGuard,
}

impl Registry {
    pub(super) fn new(
        logger: slog::Logger,
        store: Arc<MemberStore>,
        peers: Arc<PeerTracker<GrpcPeerConnector>>,
        clock: RealClock,
        local_addr: SocketAddr,
        cancel: CancellationToken,
    ) -> Self {
        Registry {
            logger,
            store,
            peers,
            clock,
            local_addr,
            _shutdown: cancel.drop_guard(),
        }
    }

    pub fn local_id(&self) -> &ReplicaId {
        self.store.local_id()
    }

    /// The address the RPC server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Called by the membership substrate when a replica joins the cluster. Returns false if the
    /// peer was already known at the same address.
    pub fn join(&self, peer: PeerInfo) -> bool {
        self.peers.join(peer)
    }

    /// Called by the membership substrate when a replica leaves the cluster. The members it owns
    /// are taken over once it has been gone for longer than the heartbeat timeout.
    pub fn leave(&self, peer_id: &ReplicaId) -> bool {
        self.peers.leave(peer_id, self.clock.now_ms())
    }

    pub fn peers(&self) -> Vec<PeerInfo> {
        self.peers.peers()
    }

    /// Replicas that left the cluster but still own members here.
    pub fn departed_peers(&self) -> Vec<ReplicaId> {
        let mut departed: Vec<ReplicaId> = self.store.departed_peer_ids().into_iter().collect();
        departed.sort();
        departed
    }

    pub fn member(&self, id: &str) -> Option<VersionedMember> {
        self.store.lookup(id)
    }

    /// All members, including those DOWN and LEFT, sorted by id.
    pub fn members(&self) -> Vec<VersionedMember> {
        self.store.list()
    }

    /// Members currently UP.
    pub fn live_members(&self) -> Vec<VersionedMember> {
        self.store.list_up()
    }

    /// Members this replica owns, including its own.
    pub fn owned_members(&self) -> Vec<VersionedMember> {
        self.store.list_owned()
    }

    /// In-process subscription. `callback` runs under the store's lock, so it must only enqueue.
    pub fn subscribe(&self, known: &KnownVersions, owner_only: bool, callback: UpdateCallback) -> Subscription {
        self.store.subscribe(known, owner_only, callback)
    }

    pub fn shutdown(self) {
        slog::info!(self.logger, "Shutting down");
        // Dropping the guard cancels every task.
    }
}
