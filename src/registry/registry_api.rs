use crate::registry::member::{Version, VersionTimestamp, VersionedMember};
use std::collections::HashMap;
use tokio::time::Duration;

/// Subscriber's view of the registry: member id to the last version it has seen.
pub type KnownVersions = HashMap<String, Version>;

/// Timeouts of the liveness state machine, in the millisecond domain the store works in.
#[derive(Copy, Clone, Debug)]
pub(crate) struct LivenessTimeouts {
    pub(crate) heartbeat_timeout: i64,
    pub(crate) reconnect_timeout: i64,
    pub(crate) tombstone_timeout: i64,
}

impl LivenessTimeouts {
    pub(crate) fn new(heartbeat_timeout: Duration, reconnect_timeout: Duration, tombstone_timeout: Duration) -> Self {
        LivenessTimeouts {
            heartbeat_timeout: heartbeat_timeout.as_millis() as i64,
            reconnect_timeout: reconnect_timeout.as_millis() as i64,
            tombstone_timeout: tombstone_timeout.as_millis() as i64,
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct StoreConfig {
    pub(crate) timeouts: LivenessTimeouts,
    /// Max number of entries in an anti-entropy digest, and the budget of a delta response.
    pub(crate) digest_size: usize,
}

/// Errors from updates minted by this replica (client intake and failure detector).
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum LocalUpdateError {
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    #[error("Member {member_id:?} is registered by a different client")]
    AlreadyRegistered { member_id: String },

    #[error("Member {0:?} is not registered")]
    NotRegistered(String),

    // Next heartbeat will retry with a fresh timestamp.
    #[error("Clock regress for {member_id:?}: minted {minted:?} but existing version is {existing:?}")]
    ClockRegress {
        member_id: String,
        minted: VersionTimestamp,
        existing: VersionTimestamp,
    },

    #[error("The local replica's own member can't be updated")]
    LocalMemberImmutable,
}

/// Errors from updates received from peer replicas. All of them are deterministic; re-sending the
/// same update will be rejected again.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum RemoteUpdateError {
    #[error("Peer tried to overwrite the local replica's own member")]
    LocalMemberImmutable,

    #[error("Peer claims we own {member_id:?}")]
    CrossOwnerClaim { member_id: String },

    #[error("Version {received:?} for {member_id:?} is not newer than {existing:?}")]
    OutdatedVersion {
        member_id: String,
        existing: VersionTimestamp,
        received: VersionTimestamp,
    },
}

/// Digest advertised to a peer during anti-entropy.
#[derive(Clone, Debug, Default)]
pub struct Digest {
    pub entries: HashMap<String, VersionTimestamp>,
    // Ids we asked for without holding a record, with the number of times they were asked before.
    pub(crate) placeholders: HashMap<String, u32>,
}

impl Digest {
    pub fn from_entries(entries: HashMap<String, VersionTimestamp>) -> Self {
        Digest {
            entries,
            placeholders: HashMap::new(),
        }
    }
}

#[derive(Debug, Default, Eq, PartialEq)]
pub struct DeltaOutcome {
    pub applied: usize,
    pub rejected: usize,
    pub requeued: usize,
}

/// Outcome of a subscriber callback. `Lagging` removes the subscriber from the store.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Delivery {
    Delivered,
    Lagging,
}

/// Invoked synchronously, with the store lock held, for every update the subscriber is interested
/// in. Must not block and must not call back into the store.
pub type UpdateCallback = Box<dyn FnMut(&VersionedMember) -> Delivery + Send>;
