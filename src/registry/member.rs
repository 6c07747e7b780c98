use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// ReplicaId identifies a registry replica. It doubles as the owner id of a member's version.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Default)]
pub struct ReplicaId(String);

impl ReplicaId {
    pub fn new(id: impl Into<String>) -> Self {
        ReplicaId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Locality {
    pub region: String,
    pub availability_zone: String,
}

/// MemberState is the application published part of a member. The registry treats every field
/// other than `id` as opaque.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MemberState {
    pub id: String,
    pub service: String,
    pub status: String,
    pub locality: Locality,
    /// Millisecond timestamp of when the member process started.
    pub started: i64,
    pub revision: String,
    pub metadata: HashMap<String, String>,
}

impl MemberState {
    /// A bare state carrying nothing but the member's id. Used for tombstones of members we no
    /// longer hold a record for.
    pub(crate) fn tombstone(id: String) -> Self {
        MemberState {
            id,
            ..MemberState::default()
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Liveness {
    Up,
    Down,
    Left,
}

/// VersionTimestamp orders versions. It is compared lexicographically: first by `timestamp`,
/// then by `counter`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VersionTimestamp {
    pub timestamp: i64,
    pub counter: u64,
}

impl VersionTimestamp {
    pub fn new(timestamp: i64, counter: u64) -> Self {
        VersionTimestamp { timestamp, counter }
    }

    /// The placeholder used in digests to ask for a member we don't have.
    pub fn zero() -> Self {
        VersionTimestamp::default()
    }

    /// The version that immediately follows `self` on the same timestamp.
    pub(crate) fn bump_counter(&self) -> Self {
        VersionTimestamp {
            timestamp: self.timestamp,
            counter: self.counter + 1,
        }
    }
}

/// Version of a member record. Only the owner mints versions.
///
/// The owner takes no part in ordering. Two versions from different owners with the same
/// timestamp compare equal, in which case whichever record a replica already holds wins.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Version {
    pub owner_id: ReplicaId,
    pub timestamp: VersionTimestamp,
}

impl Version {
    pub fn new(owner_id: ReplicaId, timestamp: i64, counter: u64) -> Self {
        Version {
            owner_id,
            timestamp: VersionTimestamp::new(timestamp, counter),
        }
    }

    pub fn compare(&self, other: &Version) -> Ordering {
        self.timestamp.cmp(&other.timestamp)
    }

    /// Strictly greater. Ties go to `other`, i.e. the left-hand side of the comparison
    /// `other >= self` that the write paths perform.
    pub fn is_newer_than(&self, other: &Version) -> bool {
        self.compare(other) == Ordering::Greater
    }

    pub fn is_owned_by(&self, replica_id: &ReplicaId) -> bool {
        &self.owner_id == replica_id
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VersionedMember {
    pub state: MemberState,
    pub liveness: Liveness,
    pub version: Version,
    /// Millisecond timestamp when the current liveness state expires. 0 if not applicable.
    pub expiry: i64,
}

impl VersionedMember {
    pub fn id(&self) -> &str {
        &self.state.id
    }

    pub fn owner(&self) -> &ReplicaId {
        &self.version.owner_id
    }

    pub fn is_up(&self) -> bool {
        self.liveness == Liveness::Up
    }
}
