use crate::grpc::grpc_registry_client::GrpcRegistryClient;
use crate::grpc::{
    ProtoClientAck, ProtoClientErrorCode, ProtoClientUpdate, ProtoClientUpdateType, ProtoMember, ProtoMemberRequest,
    ProtoMembersRequest, ProtoMemberState, ProtoMetadata, ProtoSubscribeRequest, ProtoVersion,
};
use crate::registry::{KnownVersions, MemberState, VersionedMember};
use crate::replication::ConnectError;
use crate::server::ProtoConvertError;
use std::collections::HashMap;
use std::convert::TryFrom;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status, Streaming};

/// Why the registry rejected a client update.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RejectionCode {
    InvalidUpdate,
    AlreadyRegistered,
    NotRegistered,
    ClockRegress,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("RPC failed: {0}")]
    Rpc(#[from] Status),
    #[error("Update {seq_id} rejected with {code:?}: {message}")]
    Rejected {
        seq_id: u64,
        code: RejectionCode,
        message: String,
    },
    #[error("Malformed response: {0}")]
    Malformed(#[from] ProtoConvertError),
    #[error("Registry closed the stream")]
    StreamClosed,
}

/// Application side client of a registry replica.
pub struct RegistryClient {
    logger: slog::Logger,
    inner: GrpcRegistryClient<Channel>,
}

impl RegistryClient {
    pub async fn connect(logger: slog::Logger, addr: SocketAddr) -> Result<Self, ConnectError> {
        let url = format!("http://{}", addr);
        slog::info!(logger, "Connecting to {} ...", url);
        let endpoint = Endpoint::from_shared(url)?;

        let connection = endpoint.connect().await?;

        Ok(RegistryClient {
            logger,
            inner: GrpcRegistryClient::new(connection),
        })
    }

    /// Opens a registration stream for `member`. The member stays UP as long as the returned
    /// session keeps heartbeating.
    pub async fn register(&mut self, client_id: &str, member: MemberState) -> Result<RegisterSession, ClientError> {
        let (updates, updates_rx) = mpsc::channel(16);
        let mut session = RegisterSession {
            logger: self.logger.new(slog::o!("ClientId" => client_id.to_string())),
            client_id: client_id.to_string(),
            member_id: member.id.clone(),
            updates,
            acks: None,
            next_seq_id: 1,
        };

        let (seq_id, first) = session.next_update(ProtoClientUpdateType::Register);
        let first = ProtoClientUpdate {
            member: Some(ProtoMemberState::from(member)),
            ..first
        };
        slog::debug!(session.logger, "ClientWire - {:?}", first);
        session.updates.send(first).await.map_err(|_| ClientError::StreamClosed)?;

        let response = self.inner.register(ReceiverStream::new(updates_rx)).await?;
        session.acks = Some(response.into_inner());
        session.await_ack(seq_id).await?;

        Ok(session)
    }

    pub async fn member(&mut self, id: &str) -> Result<Option<VersionedMember>, ClientError> {
        let rpc_request = ProtoMemberRequest { id: id.to_string() };

        slog::debug!(self.logger, "ClientWire - {:?}", rpc_request);
        let result = self.inner.member(rpc_request).await;
        slog::debug!(self.logger, "ClientWire - {:?}", result);

        match result {
            Ok(response) => match response.into_inner().member {
                Some(member) => Ok(Some(VersionedMember::try_from(member)?)),
                None => Err(ProtoConvertError::MissingField("member").into()),
            },
            Err(status) if status.code() == Code::NotFound => Ok(None),
            Err(status) => Err(status.into()),
        }
    }

    pub async fn members(&mut self) -> Result<Vec<VersionedMember>, ClientError> {
        let response = self.inner.members(ProtoMembersRequest {}).await?;

        response
            .into_inner()
            .members
            .into_iter()
            .map(|m| VersionedMember::try_from(m).map_err(ClientError::from))
            .collect()
    }

    /// Streams the members missing from `known`, then every update as it happens.
    pub async fn subscribe(&mut self, known: &KnownVersions, owner_only: bool) -> Result<MemberStream, ClientError> {
        let known_members: HashMap<String, ProtoVersion> = known
            .iter()
            .map(|(id, version)| (id.clone(), ProtoVersion::from(version.clone())))
            .collect();
        let rpc_request = ProtoSubscribeRequest {
            known_members,
            owner_only,
        };

        slog::debug!(self.logger, "ClientWire - Subscribe with {} known", rpc_request.known_members.len());
        let response = self.inner.subscribe(rpc_request).await?;

        Ok(MemberStream {
            inner: response.into_inner(),
        })
    }
}

/// A member's registration stream.
pub struct RegisterSession {
    logger: slog::Logger,
    client_id: String,
    member_id: String,
    updates: mpsc::Sender<ProtoClientUpdate>,
    acks: Option<Streaming<ProtoClientAck>>,
    next_seq_id: u64,
}

impl RegisterSession {
    pub fn member_id(&self) -> &str {
        &self.member_id
    }

    pub async fn heartbeat(&mut self) -> Result<(), ClientError> {
        let (seq_id, update) = self.next_update(ProtoClientUpdateType::Heartbeat);
        self.send(seq_id, update).await
    }

    /// Merges `patch` into the member's metadata.
    pub async fn update_metadata(&mut self, patch: HashMap<String, String>) -> Result<(), ClientError> {
        let (seq_id, update) = self.next_update(ProtoClientUpdateType::UpdateMetadata);
        let update = ProtoClientUpdate {
            member_id: self.member_id.clone(),
            metadata: Some(ProtoMetadata { entries: patch }),
            ..update
        };
        self.send(seq_id, update).await
    }

    /// Marks the member LEFT and closes the stream.
    pub async fn unregister(mut self) -> Result<(), ClientError> {
        let (seq_id, update) = self.next_update(ProtoClientUpdateType::Unregister);
        self.send(seq_id, update).await
    }

    fn next_update(&mut self, update_type: ProtoClientUpdateType) -> (u64, ProtoClientUpdate) {
        let seq_id = self.next_seq_id;
        self.next_seq_id += 1;

        let update = ProtoClientUpdate {
            update_type: update_type as i32,
            client_id: self.client_id.clone(),
            seq_id,
            ..ProtoClientUpdate::default()
        };
        (seq_id, update)
    }

    async fn send(&mut self, seq_id: u64, update: ProtoClientUpdate) -> Result<(), ClientError> {
        slog::debug!(self.logger, "ClientWire - {:?}", update);
        self.updates.send(update).await.map_err(|_| ClientError::StreamClosed)?;
        self.await_ack(seq_id).await
    }

    async fn await_ack(&mut self, seq_id: u64) -> Result<(), ClientError> {
        let acks = self.acks.as_mut().ok_or(ClientError::StreamClosed)?;
        loop {
            let ack = match acks.message().await? {
                Some(ack) => ack,
                None => return Err(ClientError::StreamClosed),
            };
            slog::debug!(self.logger, "ClientWire - {:?}", ack);

            if ack.seq_id != seq_id {
                continue;
            }

            return match rejection_code(ack.error) {
                None => Ok(()),
                Some(code) => Err(ClientError::Rejected {
                    seq_id,
                    code,
                    message: ack.message,
                }),
            };
        }
    }
}

fn rejection_code(error: i32) -> Option<RejectionCode> {
    match ProtoClientErrorCode::from_i32(error) {
        Some(ProtoClientErrorCode::NoError) => None,
        Some(ProtoClientErrorCode::InvalidUpdate) => Some(RejectionCode::InvalidUpdate),
        Some(ProtoClientErrorCode::AlreadyRegistered) => Some(RejectionCode::AlreadyRegistered),
        Some(ProtoClientErrorCode::NotRegistered) => Some(RejectionCode::NotRegistered),
        Some(ProtoClientErrorCode::ClockRegress) => Some(RejectionCode::ClockRegress),
        Some(ProtoClientErrorCode::Internal) | None => Some(RejectionCode::Internal),
    }
}

/// Members streamed by a subscription.
pub struct MemberStream {
    inner: Streaming<ProtoMember>,
}

impl MemberStream {
    /// Returns `None` once the registry ends the stream.
    pub async fn next(&mut self) -> Result<Option<VersionedMember>, ClientError> {
        match self.inner.message().await? {
            Some(member) => Ok(Some(VersionedMember::try_from(member)?)),
            None => Ok(None),
        }
    }
}
