use crate::grpc::grpc_replica_client::GrpcReplicaClient;
use crate::grpc::{ProtoDigestRequest, ProtoMember, ProtoUpdateRequest};
use crate::registry::{Digest, ReplicaId, VersionedMember};
use crate::replication::replication_api::{PeerConnector, PeerInfo, PeerTransport};
use crate::server::convert;
use std::error::Error;
use std::net::SocketAddr;
use tokio::time::Duration;
use tonic::codegen::http::uri;
use tonic::transport::{Channel, Endpoint};
use tonic::Status;

pub(crate) struct GrpcPeerConnector {
    logger: slog::Logger,
    local_id: ReplicaId,
    rpc_timeout: Duration,
}

impl GrpcPeerConnector {
    pub(crate) fn new(logger: slog::Logger, local_id: ReplicaId, rpc_timeout: Duration) -> Self {
        GrpcPeerConnector {
            logger,
            local_id,
            rpc_timeout,
        }
    }
}

impl PeerConnector for GrpcPeerConnector {
    type Transport = PeerClient;

    fn connect(&self, peer: &PeerInfo) -> PeerClient {
        PeerClient {
            logger: self.logger.new(slog::o!("Peer" => peer.id.to_string())),
            local_id: self.local_id.clone(),
            addr: peer.rpc_addr,
            rpc_timeout: self.rpc_timeout,
            client: None,
        }
    }
}

/// Client of a peer's `GrpcReplica` service. Connects lazily, and reconnects on the next call
/// after a transport failure.
pub(crate) struct PeerClient {
    logger: slog::Logger,
    local_id: ReplicaId,
    addr: SocketAddr,
    rpc_timeout: Duration,
    client: Option<GrpcReplicaClient<Channel>>,
}

impl PeerClient {
    async fn connected(&mut self) -> Result<&mut GrpcReplicaClient<Channel>, Status> {
        if self.client.is_none() {
            let connection = Self::connect(self.addr, self.rpc_timeout).await.map_err(|e| {
                slog::debug!(self.logger, "Failed to connect to {}: {:?}", self.addr, e);
                Status::unavailable(format!("{:?}", e))
            })?;
            self.client = Some(GrpcReplicaClient::new(connection));
        }

        match self.client.as_mut() {
            Some(client) => Ok(client),
            None => Err(Status::unavailable("Not connected")),
        }
    }

    async fn connect(addr: SocketAddr, rpc_timeout: Duration) -> Result<Channel, ConnectError> {
        let url = format!("http://{}", addr);
        let endpoint = Endpoint::from_shared(url)?.timeout(rpc_timeout);

        match tokio::time::timeout(rpc_timeout, endpoint.connect()).await {
            Ok(connection) => Ok(connection?),
            Err(_) => Err(ConnectError::Timeout),
        }
    }

    fn on_result<T>(&mut self, result: &Result<T, Status>) {
        if let Err(status) = result {
            if status.code() == tonic::Code::Unavailable || status.code() == tonic::Code::Unknown {
                // Force a fresh connection next time.
                self.client = None;
            }
        }
    }
}

#[async_trait::async_trait]
impl PeerTransport for PeerClient {
    async fn send_update(&mut self, member: &VersionedMember) -> Result<(), Status> {
        let rpc_request = ProtoUpdateRequest {
            member: Some(ProtoMember::from(member.clone())),
            source_node_id: self.local_id.as_str().to_string(),
        };

        slog::debug!(self.logger, "ClientWire - {:?}", rpc_request);
        let client = self.connected().await?;
        let result = client.update(rpc_request).await.map(|_| ());
        slog::debug!(self.logger, "ClientWire - {:?}", result);

        self.on_result(&result);
        result
    }

    async fn exchange_digest(&mut self, digest: &Digest) -> Result<Vec<VersionedMember>, Status> {
        let rpc_request = ProtoDigestRequest {
            entries: convert::digest_to_proto(digest),
            source_node_id: self.local_id.as_str().to_string(),
        };

        slog::debug!(self.logger, "ClientWire - Digest with {} entries", rpc_request.entries.len());
        let client = self.connected().await?;
        let result = client.digest(rpc_request).await;
        self.on_result(&result);

        let rpc_reply = result?.into_inner();
        slog::debug!(self.logger, "ClientWire - Delta with {} members", rpc_reply.delta.len());

        Ok(convert::members_from_proto(rpc_reply.delta)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("Invalid peer URI: {0}")]
    InvalidUri(uri::InvalidUri),
    #[error("Failed to connect: {0}")]
    ConnectFailure(Box<dyn Error + Send + Sync>),
    #[error("Timed out connecting")]
    Timeout,
}

impl From<uri::InvalidUri> for ConnectError {
    fn from(e: uri::InvalidUri) -> Self {
        ConnectError::InvalidUri(e)
    }
}

impl From<tonic::transport::Error> for ConnectError {
    fn from(e: tonic::transport::Error) -> Self {
        ConnectError::ConnectFailure(e.into())
    }
}
