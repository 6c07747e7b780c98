use crate::grpc::{
    ProtoClientErrorCode, ProtoClientUpdate, ProtoClientUpdateType, ProtoLiveness, ProtoLocality, ProtoMember,
    ProtoMemberState, ProtoMetadata, ProtoVersion, ProtoVersionTimestamp,
};
use crate::registry::{
    Digest, KnownVersions, Liveness, LocalUpdateError, Locality, MemberState, RemoteUpdateError, ReplicaId, Version,
    VersionTimestamp, VersionedMember,
};
use std::collections::HashMap;
use std::convert::TryFrom;
use tonic::Status;

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum ProtoConvertError {
    #[error("Missing field '{0}'")]
    MissingField(&'static str),

    #[error("Unknown {field} value {value}")]
    UnknownEnumValue { field: &'static str, value: i32 },
}

impl From<ProtoConvertError> for Status {
    fn from(e: ProtoConvertError) -> Self {
        Status::invalid_argument(e.to_string())
    }
}

// ------- Member model --------

impl From<VersionTimestamp> for ProtoVersionTimestamp {
    fn from(ts: VersionTimestamp) -> Self {
        ProtoVersionTimestamp {
            timestamp: ts.timestamp,
            counter: ts.counter,
        }
    }
}

impl From<ProtoVersionTimestamp> for VersionTimestamp {
    fn from(proto: ProtoVersionTimestamp) -> Self {
        VersionTimestamp::new(proto.timestamp, proto.counter)
    }
}

impl From<Version> for ProtoVersion {
    fn from(version: Version) -> Self {
        ProtoVersion {
            owner_id: version.owner_id.into_inner(),
            timestamp: Some(version.timestamp.into()),
        }
    }
}

impl TryFrom<ProtoVersion> for Version {
    type Error = ProtoConvertError;

    fn try_from(proto: ProtoVersion) -> Result<Self, Self::Error> {
        let timestamp = proto
            .timestamp
            .ok_or(ProtoConvertError::MissingField("version.timestamp"))?;

        Ok(Version {
            owner_id: ReplicaId::new(proto.owner_id),
            timestamp: timestamp.into(),
        })
    }
}

impl From<Liveness> for ProtoLiveness {
    fn from(liveness: Liveness) -> Self {
        match liveness {
            Liveness::Up => ProtoLiveness::Up,
            Liveness::Down => ProtoLiveness::Down,
            Liveness::Left => ProtoLiveness::Left,
        }
    }
}

fn liveness_from_proto(value: i32) -> Result<Liveness, ProtoConvertError> {
    match ProtoLiveness::from_i32(value) {
        Some(ProtoLiveness::Up) => Ok(Liveness::Up),
        Some(ProtoLiveness::Down) => Ok(Liveness::Down),
        Some(ProtoLiveness::Left) => Ok(Liveness::Left),
        None => Err(ProtoConvertError::UnknownEnumValue {
            field: "liveness",
            value,
        }),
    }
}

impl From<MemberState> for ProtoMemberState {
    fn from(state: MemberState) -> Self {
        ProtoMemberState {
            id: state.id,
            service: state.service,
            status: state.status,
            locality: Some(ProtoLocality {
                region: state.locality.region,
                availability_zone: state.locality.availability_zone,
            }),
            started: state.started,
            revision: state.revision,
            metadata: Some(ProtoMetadata {
                entries: state.metadata,
            }),
        }
    }
}

/// Lenient: a missing locality or metadata decodes as empty. Client intake checks for presence
/// itself before converting.
impl From<ProtoMemberState> for MemberState {
    fn from(proto: ProtoMemberState) -> Self {
        let locality = proto
            .locality
            .map(|l| Locality {
                region: l.region,
                availability_zone: l.availability_zone,
            })
            .unwrap_or_default();

        MemberState {
            id: proto.id,
            service: proto.service,
            status: proto.status,
            locality,
            started: proto.started,
            revision: proto.revision,
            metadata: proto.metadata.map(|m| m.entries).unwrap_or_default(),
        }
    }
}

impl From<VersionedMember> for ProtoMember {
    fn from(member: VersionedMember) -> Self {
        ProtoMember {
            state: Some(member.state.into()),
            liveness: ProtoLiveness::from(member.liveness) as i32,
            version: Some(member.version.into()),
            expiry: member.expiry,
        }
    }
}

impl TryFrom<ProtoMember> for VersionedMember {
    type Error = ProtoConvertError;

    fn try_from(proto: ProtoMember) -> Result<Self, Self::Error> {
        let state = proto.state.ok_or(ProtoConvertError::MissingField("state"))?;
        let version = proto.version.ok_or(ProtoConvertError::MissingField("version"))?;
        if state.id.is_empty() {
            return Err(ProtoConvertError::MissingField("state.id"));
        }

        Ok(VersionedMember {
            state: state.into(),
            liveness: liveness_from_proto(proto.liveness)?,
            version: Version::try_from(version)?,
            expiry: proto.expiry,
        })
    }
}

// ------- Replica RPCs --------

pub(crate) fn digest_to_proto(digest: &Digest) -> HashMap<String, ProtoVersionTimestamp> {
    digest
        .entries
        .iter()
        .map(|(id, ts)| (id.clone(), ProtoVersionTimestamp::from(*ts)))
        .collect()
}

pub(crate) fn digest_from_proto(entries: HashMap<String, ProtoVersionTimestamp>) -> Digest {
    Digest::from_entries(entries.into_iter().map(|(id, ts)| (id, ts.into())).collect())
}

pub(crate) fn members_from_proto(protos: Vec<ProtoMember>) -> Result<Vec<VersionedMember>, ProtoConvertError> {
    protos.into_iter().map(VersionedMember::try_from).collect()
}

pub(crate) fn known_versions_from_proto(
    known: HashMap<String, ProtoVersion>,
) -> Result<KnownVersions, ProtoConvertError> {
    known
        .into_iter()
        .map(|(id, version)| Ok((id, Version::try_from(version)?)))
        .collect()
}

/// Deterministic rejections. The forwarder drops updates rejected this way instead of retrying.
pub(crate) fn remote_update_error_to_status(e: RemoteUpdateError) -> Status {
    Status::failed_precondition(e.to_string())
}

// ------- Client stream --------

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum ClientUpdate {
    Register {
        client_id: String,
        state: MemberState,
    },
    /// Heartbeat carrying the member's state.
    Heartbeat {
        client_id: String,
        state: MemberState,
    },
    /// Bare heartbeat for every member of the client.
    ClientHeartbeat {
        client_id: String,
    },
    Unregister {
        client_id: String,
    },
    UpdateMetadata {
        client_id: String,
        member_id: String,
        patch: HashMap<String, String>,
    },
}

impl ClientUpdate {
    pub(crate) fn client_id(&self) -> &str {
        match self {
            ClientUpdate::Register { client_id, .. }
            | ClientUpdate::Heartbeat { client_id, .. }
            | ClientUpdate::ClientHeartbeat { client_id }
            | ClientUpdate::Unregister { client_id }
            | ClientUpdate::UpdateMetadata { client_id, .. } => client_id,
        }
    }
}

/// Validates a client message and returns its seq id alongside the update. The seq id is returned
/// on its own in the error case so it can still be acked.
pub(crate) fn client_update_from_proto(proto: ProtoClientUpdate) -> (u64, Result<ClientUpdate, LocalUpdateError>) {
    let seq_id = proto.seq_id;
    (seq_id, parse_client_update(proto))
}

fn parse_client_update(proto: ProtoClientUpdate) -> Result<ClientUpdate, LocalUpdateError> {
    let invalid = |msg: &str| LocalUpdateError::InvalidUpdate(msg.to_string());

    if proto.client_id.is_empty() {
        return Err(invalid("missing client id"));
    }
    let client_id = proto.client_id;

    match ProtoClientUpdateType::from_i32(proto.update_type) {
        Some(ProtoClientUpdateType::Register) => {
            let member = proto.member.ok_or_else(|| invalid("missing member"))?;
            if member.id.is_empty() {
                return Err(invalid("missing member id"));
            }
            if member.metadata.is_none() {
                return Err(invalid("missing member metadata"));
            }

            Ok(ClientUpdate::Register {
                client_id,
                state: member.into(),
            })
        }
        Some(ProtoClientUpdateType::Heartbeat) => match proto.member {
            Some(member) if !member.id.is_empty() => Ok(ClientUpdate::Heartbeat {
                client_id,
                state: member.into(),
            }),
            _ => Ok(ClientUpdate::ClientHeartbeat { client_id }),
        },
        Some(ProtoClientUpdateType::Unregister) => Ok(ClientUpdate::Unregister { client_id }),
        Some(ProtoClientUpdateType::UpdateMetadata) => {
            if proto.member_id.is_empty() {
                return Err(invalid("missing member id"));
            }
            let patch = proto.metadata.ok_or_else(|| invalid("missing metadata"))?;

            Ok(ClientUpdate::UpdateMetadata {
                client_id,
                member_id: proto.member_id,
                patch: patch.entries,
            })
        }
        None => Err(invalid("unknown update type")),
    }
}

pub(crate) fn ack_error_code(e: &LocalUpdateError) -> ProtoClientErrorCode {
    match e {
        LocalUpdateError::InvalidUpdate(_) => ProtoClientErrorCode::InvalidUpdate,
        LocalUpdateError::AlreadyRegistered { .. } => ProtoClientErrorCode::AlreadyRegistered,
        LocalUpdateError::NotRegistered(_) => ProtoClientErrorCode::NotRegistered,
        LocalUpdateError::ClockRegress { .. } => ProtoClientErrorCode::ClockRegress,
        LocalUpdateError::LocalMemberImmutable => ProtoClientErrorCode::InvalidUpdate,
    }
}
