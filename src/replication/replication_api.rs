use crate::registry::{Digest, ReplicaId, VersionedMember};
use std::net::SocketAddr;
use tonic::Status;

/// A peer replica of the registry cluster.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PeerInfo {
    pub id: ReplicaId,
    pub rpc_addr: SocketAddr,
}

/// The two replica-to-replica calls. `Status` is kept as the error type so callers can tell
/// deterministic rejections (`FailedPrecondition`, `InvalidArgument`) from transient failures.
#[async_trait::async_trait]
pub(crate) trait PeerTransport: Send + 'static {
    async fn send_update(&mut self, member: &VersionedMember) -> Result<(), Status>;
    async fn exchange_digest(&mut self, digest: &Digest) -> Result<Vec<VersionedMember>, Status>;
}

pub(crate) trait PeerConnector: Send + Sync + 'static {
    type Transport: PeerTransport;

    /// Must not block. Connecting happens on first use of the transport.
    fn connect(&self, peer: &PeerInfo) -> Self::Transport;
}

pub(crate) fn is_deterministic_rejection(status: &Status) -> bool {
    matches!(
        status.code(),
        tonic::Code::FailedPrecondition | tonic::Code::InvalidArgument
    )
}
