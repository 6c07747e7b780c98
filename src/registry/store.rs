use crate::registry::member::{Liveness, MemberState, ReplicaId, Version, VersionTimestamp, VersionedMember};
use crate::registry::registry_api::{LocalUpdateError, RemoteUpdateError, StoreConfig};
use crate::registry::subscribers::Subscribers;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// MemberStore is the replica's view of the registry. Everything is guarded by a single mutex, and
/// every mutation funnels through one of two write paths:
///
/// - `apply_local()` for updates this replica mints as the owner.
/// - `apply_remote()` for updates minted by a peer replica.
///
/// Every operation takes `now` (UTC millis) from the caller. The store never reads the clock.
pub struct MemberStore {
    pub(super) logger: slog::Logger,
    pub(super) local_id: ReplicaId,
    pub(super) config: StoreConfig,
    inner: Mutex<StoreState>,
}

pub(super) struct StoreState {
    pub(super) members: HashMap<String, VersionedMember>,
    // Only for members we own.
    pub(super) last_seen: HashMap<String, i64>,
    // Member id to the client id that registered it. Only for members we own.
    pub(super) clients: HashMap<String, String>,
    // Only while the departed peer still owns members in this store.
    pub(super) departed_peers: HashMap<ReplicaId, i64>,
    // Member id to the number of times it was already asked for without being satisfied.
    pub(super) priority_digest_ids: HashMap<String, u32>,
    pub(super) subscribers: Subscribers,
    last_minted: VersionTimestamp,
}

impl StoreState {
    /// Strictly monotonic, even if the wall clock goes backwards.
    fn next_version(&mut self, now: i64) -> VersionTimestamp {
        let next = if now <= self.last_minted.timestamp {
            self.last_minted.bump_counter()
        } else {
            VersionTimestamp::new(now, 0)
        };
        self.last_minted = next;

        next
    }

    pub(super) fn remove_member(&mut self, id: &str) -> Option<VersionedMember> {
        self.last_seen.remove(id);
        self.clients.remove(id);
        self.members.remove(id)
    }

    fn member_ids_of_client(&self, client_id: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .clients
            .iter()
            .filter(|(_, bound_client_id)| bound_client_id.as_str() == client_id)
            .map(|(member_id, _)| member_id.clone())
            .collect();
        ids.sort();
        ids
    }
}

impl MemberStore {
    /// Creates a store holding only the local replica's own member. `local_member.id` is forced to
    /// `local_id`.
    pub(crate) fn new(
        logger: slog::Logger,
        local_id: ReplicaId,
        mut local_member: MemberState,
        config: StoreConfig,
        now: i64,
    ) -> Self {
        let mut state = StoreState {
            members: HashMap::new(),
            last_seen: HashMap::new(),
            clients: HashMap::new(),
            departed_peers: HashMap::new(),
            priority_digest_ids: HashMap::new(),
            subscribers: Subscribers::new(),
            last_minted: VersionTimestamp::zero(),
        };

        local_member.id = local_id.as_str().to_string();
        let version = Version {
            owner_id: local_id.clone(),
            timestamp: state.next_version(now),
        };
        state.members.insert(
            local_member.id.clone(),
            VersionedMember {
                state: local_member,
                liveness: Liveness::Up,
                version,
                expiry: 0,
            },
        );

        MemberStore {
            logger,
            local_id,
            config,
            inner: Mutex::new(state),
        }
    }

    pub fn local_id(&self) -> &ReplicaId {
        &self.local_id
    }

    pub(crate) fn logger(&self) -> &slog::Logger {
        &self.logger
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.inner.lock().expect("MemberStore mutex guard poison")
    }

    // ------- Write paths --------

    pub(super) fn apply_local(
        &self,
        inner: &mut StoreState,
        state: MemberState,
        liveness: Liveness,
        expiry: i64,
        now: i64,
    ) -> Result<VersionedMember, LocalUpdateError> {
        if state.id == self.local_id.as_str() {
            return Err(LocalUpdateError::LocalMemberImmutable);
        }

        let minted = inner.next_version(now);
        if let Some(existing) = inner.members.get(&state.id) {
            if existing.version.timestamp >= minted {
                slog::warn!(
                    self.logger,
                    "Clock regress. Dropping update for {:?}: minted {:?}, existing {:?}",
                    state.id,
                    minted,
                    existing.version
                );
                return Err(LocalUpdateError::ClockRegress {
                    member_id: state.id,
                    minted,
                    existing: existing.version.timestamp,
                });
            }
        }

        let member = VersionedMember {
            state,
            liveness,
            version: Version {
                owner_id: self.local_id.clone(),
                timestamp: minted,
            },
            expiry,
        };
        slog::debug!(self.logger, "Applying local update: {:?}", member);

        inner.last_seen.insert(member.state.id.clone(), now);
        inner.members.insert(member.state.id.clone(), member.clone());
        inner.subscribers.publish(&self.logger, &member, true);

        Ok(member)
    }

    pub(super) fn apply_remote_locked(
        &self,
        inner: &mut StoreState,
        member: VersionedMember,
    ) -> Result<(), RemoteUpdateError> {
        if member.state.id == self.local_id.as_str() {
            slog::warn!(self.logger, "Rejecting remote update of the local member: {:?}", member);
            return Err(RemoteUpdateError::LocalMemberImmutable);
        }

        if member.version.is_owned_by(&self.local_id) {
            slog::warn!(
                self.logger,
                "Rejecting remote update claiming we own it but we don't: {:?}",
                member
            );
            return Err(RemoteUpdateError::CrossOwnerClaim {
                member_id: member.state.id,
            });
        }

        if let Some(existing) = inner.members.get(&member.state.id) {
            if !member.version.is_newer_than(&existing.version) {
                return Err(RemoteUpdateError::OutdatedVersion {
                    member_id: member.state.id,
                    existing: existing.version.timestamp,
                    received: member.version.timestamp,
                });
            }
        }
        slog::debug!(self.logger, "Applying remote update: {:?}", member);

        // We don't own it (anymore).
        inner.last_seen.remove(&member.state.id);
        inner.clients.remove(&member.state.id);
        inner.subscribers.publish(&self.logger, &member, false);
        inner.members.insert(member.state.id.clone(), member);

        Ok(())
    }

    // ------- Operations --------

    /// Registers (or re-registers) a member on behalf of `client_id`. Re-registering bumps the
    /// version and revives a DOWN or LEFT member.
    pub fn register(
        &self,
        client_id: &str,
        state: MemberState,
        now: i64,
    ) -> Result<VersionedMember, LocalUpdateError> {
        if client_id.is_empty() {
            return Err(LocalUpdateError::InvalidUpdate("missing client id".into()));
        }
        if state.id.is_empty() {
            return Err(LocalUpdateError::InvalidUpdate("missing member id".into()));
        }

        let mut inner = self.lock();
        self.register_locked(&mut inner, client_id, state, now)
    }

    fn register_locked(
        &self,
        inner: &mut StoreState,
        client_id: &str,
        state: MemberState,
        now: i64,
    ) -> Result<VersionedMember, LocalUpdateError> {
        if let Some(existing) = inner.members.get(&state.id) {
            let bound_client_id = inner.clients.get(&state.id);
            if existing.version.is_owned_by(&self.local_id)
                && existing.is_up()
                && bound_client_id.map(|bound| bound != client_id).unwrap_or(false)
            {
                return Err(LocalUpdateError::AlreadyRegistered { member_id: state.id });
            }
        }

        let member_id = state.id.clone();
        let member = self.apply_local(inner, state, Liveness::Up, 0, now)?;
        inner.clients.insert(member_id, client_id.to_string());

        Ok(member)
    }

    /// Heartbeat carrying the member's full state. If we own the member, it's UP and bound to
    /// `client_id`, only its last seen time moves. Otherwise it's a re-register.
    pub fn heartbeat(&self, client_id: &str, state: MemberState, now: i64) -> Result<(), LocalUpdateError> {
        if client_id.is_empty() {
            return Err(LocalUpdateError::InvalidUpdate("missing client id".into()));
        }
        if state.id.is_empty() {
            return Err(LocalUpdateError::InvalidUpdate("missing member id".into()));
        }

        let mut inner = self.lock();
        let is_owned_and_up = inner
            .members
            .get(&state.id)
            .map(|m| m.version.is_owned_by(&self.local_id) && m.is_up())
            .unwrap_or(false);
        let is_bound = inner.clients.get(&state.id).map(|bound| bound == client_id).unwrap_or(false);

        if is_owned_and_up && is_bound {
            inner.last_seen.insert(state.id, now);
            return Ok(());
        }

        self.register_locked(&mut inner, client_id, state, now).map(|_| ())
    }

    /// Bare heartbeat from a client. Touches every member the client registered, and revives any
    /// that are DOWN with a fresh version so subscribers observe the revival.
    pub fn heartbeat_client(&self, client_id: &str, now: i64) -> Result<(), LocalUpdateError> {
        let mut inner = self.lock();
        let member_ids = inner.member_ids_of_client(client_id);

        let mut touched = 0;
        let mut first_error = None;
        for member_id in member_ids {
            let member = match inner.members.get(&member_id) {
                Some(m) if m.version.is_owned_by(&self.local_id) => m.clone(),
                _ => continue,
            };

            match member.liveness {
                Liveness::Up => {
                    inner.last_seen.insert(member_id, now);
                    touched += 1;
                }
                Liveness::Down => {
                    slog::info!(self.logger, "Heartbeat revived {:?}", member_id);
                    match self.apply_local(&mut inner, member.state, Liveness::Up, 0, now) {
                        Ok(_) => touched += 1,
                        Err(e) => {
                            slog::warn!(self.logger, "Failed to revive {:?}: {}", member_id, e);
                            first_error.get_or_insert(e);
                        }
                    }
                }
                // Client has to re-register.
                Liveness::Left => {}
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }
        if touched == 0 {
            return Err(LocalUpdateError::NotRegistered(client_id.to_string()));
        }

        Ok(())
    }

    /// Merges `patch` into the member's metadata and publishes the result as a new version. Only
    /// the client the member is registered by may patch it, and only while we own it.
    pub fn update_metadata(
        &self,
        client_id: &str,
        member_id: &str,
        patch: HashMap<String, String>,
        now: i64,
    ) -> Result<VersionedMember, LocalUpdateError> {
        let mut inner = self.lock();
        let existing = match inner.members.get(member_id) {
            Some(m) if m.version.is_owned_by(&self.local_id) => m.clone(),
            _ => return Err(LocalUpdateError::NotRegistered(member_id.to_string())),
        };
        if inner.clients.get(member_id).map(|bound| bound != client_id).unwrap_or(true) {
            return Err(LocalUpdateError::NotRegistered(member_id.to_string()));
        }

        let mut state = existing.state;
        state.metadata.extend(patch);

        self.apply_local(&mut inner, state, existing.liveness, existing.expiry, now)
    }

    /// Marks the member as LEFT. The tombstone is kept until `now + tombstone_timeout`.
    pub fn unregister(&self, member_id: &str, now: i64) -> Result<VersionedMember, LocalUpdateError> {
        let mut inner = self.lock();
        self.unregister_locked(&mut inner, member_id, now)
    }

    /// Unregisters every member registered by `client_id`.
    pub fn unregister_client(&self, client_id: &str, now: i64) -> Result<Vec<VersionedMember>, LocalUpdateError> {
        let mut inner = self.lock();
        let member_ids = inner.member_ids_of_client(client_id);
        if member_ids.is_empty() {
            return Err(LocalUpdateError::NotRegistered(client_id.to_string()));
        }

        let mut unregistered = Vec::with_capacity(member_ids.len());
        let mut first_error = None;
        for member_id in member_ids {
            match self.unregister_locked(&mut inner, &member_id, now) {
                Ok(member) => unregistered.push(member),
                Err(e) => {
                    slog::warn!(self.logger, "Failed to unregister {:?}: {}", member_id, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(unregistered),
        }
    }

    fn unregister_locked(
        &self,
        inner: &mut StoreState,
        member_id: &str,
        now: i64,
    ) -> Result<VersionedMember, LocalUpdateError> {
        let state = match inner.members.get(member_id) {
            Some(m) => m.state.clone(),
            None => return Err(LocalUpdateError::NotRegistered(member_id.to_string())),
        };

        let expiry = now + self.config.timeouts.tombstone_timeout;
        let member = self.apply_local(inner, state, Liveness::Left, expiry, now)?;
        inner.clients.remove(member_id);
        slog::info!(self.logger, "Unregistered {:?}", member_id);

        Ok(member)
    }

    pub fn apply_remote(&self, member: VersionedMember) -> Result<(), RemoteUpdateError> {
        let mut inner = self.lock();
        self.apply_remote_locked(&mut inner, member)
    }

    // ------- Membership substrate --------

    pub fn peer_joined(&self, peer_id: &ReplicaId) {
        let mut inner = self.lock();
        if inner.departed_peers.remove(peer_id).is_some() {
            slog::info!(self.logger, "Peer {:?} rejoined", peer_id);
        }
    }

    /// Records that `peer_id` left the cluster at `now`. Its members become eligible for takeover
    /// once the departure is older than the heartbeat timeout.
    pub fn peer_departed(&self, peer_id: &ReplicaId, now: i64) {
        if peer_id == &self.local_id {
            return;
        }

        let mut inner = self.lock();
        let owns_members = inner.members.values().any(|m| m.version.is_owned_by(peer_id));
        if owns_members {
            inner.departed_peers.entry(peer_id.clone()).or_insert(now);
            slog::info!(self.logger, "Peer {:?} departed at {}", peer_id, now);
        }
    }

    // ------- Reads --------

    pub fn lookup(&self, member_id: &str) -> Option<VersionedMember> {
        self.lock().members.get(member_id).cloned()
    }

    /// All members, sorted by id.
    pub fn list(&self) -> Vec<VersionedMember> {
        self.list_filtered(|_| true)
    }

    pub fn list_owned(&self) -> Vec<VersionedMember> {
        self.list_filtered(|m| m.version.is_owned_by(&self.local_id))
    }

    pub fn list_up(&self) -> Vec<VersionedMember> {
        self.list_filtered(|m| m.is_up())
    }

    fn list_filtered<F>(&self, predicate: F) -> Vec<VersionedMember>
    where
        F: Fn(&VersionedMember) -> bool,
    {
        let inner = self.lock();
        let mut members: Vec<VersionedMember> = inner.members.values().filter(|m| predicate(m)).cloned().collect();
        members.sort_by(|a, b| a.state.id.cmp(&b.state.id));
        members
    }

    pub(crate) fn departed_peer_ids(&self) -> HashSet<ReplicaId> {
        self.lock().departed_peers.keys().cloned().collect()
    }
}


#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use super::*;

    #[test]
    fn local_member_exists_and_is_immutable() {
        let store = new_store("local");

        let local = store.lookup("local").expect("local member");
        assert_eq!(local.liveness, Liveness::Up);
        assert_eq!(local.version, Version::new(ReplicaId::new("local"), 0, 0));

        assert_eq!(
            store.register("c1", member_state("local"), 100),
            Err(LocalUpdateError::LocalMemberImmutable)
        );
    }

    #[test]
    fn register_mints_owned_version() {
        let store = new_store("local");

        let member = store.register("c1", member_state("my-member"), 100).unwrap();

        assert_eq!(member.liveness, Liveness::Up);
        assert_eq!(member.version, Version::new(ReplicaId::new("local"), 100, 0));
        assert_eq!(member.expiry, 0);
        assert_eq!(store.lookup("my-member"), Some(member));
    }

    #[test]
    fn register_validates_input() {
        let store = new_store("local");

        assert!(matches!(
            store.register("", member_state("m"), 100),
            Err(LocalUpdateError::InvalidUpdate(_))
        ));
        assert!(matches!(
            store.register("c1", member_state(""), 100),
            Err(LocalUpdateError::InvalidUpdate(_))
        ));
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn register_under_different_client_is_rejected() {
        let store = new_store("local");
        store.register("c1", member_state("m"), 100).unwrap();

        assert_eq!(
            store.register("c2", member_state("m"), 200),
            Err(LocalUpdateError::AlreadyRegistered { member_id: "m".into() })
        );
        assert_eq!(store.lookup("m").unwrap().version.timestamp, VersionTimestamp::new(100, 0));

        // Same client re-registering is fine.
        let member = store.register("c1", member_state("m"), 200).unwrap();
        assert_eq!(member.version.timestamp, VersionTimestamp::new(200, 0));
    }

    #[test]
    fn minting_at_same_time_bumps_counter() {
        let store = new_store("local");

        let v1 = store.register("c1", member_state("a"), 100).unwrap().version;
        let v2 = store.register("c1", member_state("b"), 100).unwrap().version;
        let v3 = store.register("c1", member_state("a"), 100).unwrap().version;
        // Clock went backwards.
        let v4 = store.register("c1", member_state("a"), 50).unwrap().version;

        assert_eq!(v1.timestamp, VersionTimestamp::new(100, 0));
        assert_eq!(v2.timestamp, VersionTimestamp::new(100, 1));
        assert_eq!(v3.timestamp, VersionTimestamp::new(100, 2));
        assert_eq!(v4.timestamp, VersionTimestamp::new(100, 3));
    }

    #[test]
    fn clock_regress_against_newer_remote_version() {
        let store = new_store("local");
        store.apply_remote(remote_member("m", "peer", 5_000, 0)).unwrap();

        let result = store.register("c1", member_state("m"), 1_000);

        assert!(matches!(result, Err(LocalUpdateError::ClockRegress { .. })));
        assert_eq!(store.lookup("m").unwrap().owner(), &ReplicaId::new("peer"));
    }

    #[test]
    fn heartbeat_of_owned_up_member_does_not_bump_version() {
        let store = new_store("local");
        let registered = store.register("c1", member_state("m"), 100).unwrap();

        store.heartbeat("c1", member_state("m"), 200).unwrap();
        store.heartbeat_client("c1", 300).unwrap();

        assert_eq!(store.lookup("m").unwrap(), registered);
        assert_eq!(store.lock().last_seen.get("m"), Some(&300));
    }

    #[test]
    fn heartbeat_of_unknown_member_registers_it() {
        let store = new_store("local");

        store.heartbeat("c1", member_state("m"), 200).unwrap();

        let member = store.lookup("m").unwrap();
        assert_eq!(member.liveness, Liveness::Up);
        assert_eq!(member.version.timestamp, VersionTimestamp::new(200, 0));
    }

    #[test]
    fn heartbeat_registration_binds_client() {
        let store = new_store("local");
        store.register("c1", member_state("a"), 100).unwrap();
        store.heartbeat("c1", member_state("b"), 200).unwrap();

        let left = store.unregister_client("c1", 1_000).unwrap();

        assert_eq!(left.iter().map(|m| m.id()).collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(store.lookup("b").unwrap().liveness, Liveness::Left);
    }

    #[test]
    fn heartbeat_from_other_client_is_rejected() {
        let store = new_store("local");
        store.register("c1", member_state("m"), 100).unwrap();

        assert_eq!(
            store.heartbeat("c2", member_state("m"), 400),
            Err(LocalUpdateError::AlreadyRegistered { member_id: "m".into() })
        );

        // Didn't keep c1's member alive.
        assert_eq!(store.lock().last_seen.get("m"), Some(&100));
        store.update_liveness(700);
        assert_eq!(store.lookup("m").unwrap().liveness, Liveness::Down);
    }

    #[test]
    fn client_heartbeat_revives_down_member() {
        let store = new_store("local");
        store.register("c1", member_state("m"), 100).unwrap();
        store.update_liveness(1_000);
        assert_eq!(store.lookup("m").unwrap().liveness, Liveness::Down);

        store.heartbeat_client("c1", 1_200).unwrap();

        let member = store.lookup("m").unwrap();
        assert_eq!(member.liveness, Liveness::Up);
        assert_eq!(member.expiry, 0);
        assert_eq!(member.version.timestamp, VersionTimestamp::new(1_200, 0));
    }

    #[test]
    fn client_heartbeat_without_registration_fails() {
        let store = new_store("local");

        assert_eq!(
            store.heartbeat_client("c1", 100),
            Err(LocalUpdateError::NotRegistered("c1".into()))
        );
    }

    #[test]
    fn update_metadata_merges_patch() {
        let store = new_store("local");
        store.register("c1", member_state("m"), 100).unwrap();

        let mut patch = HashMap::new();
        patch.insert("weight".to_string(), "10".to_string());
        patch.insert("protocol".to_string(), "http".to_string());
        let member = store.update_metadata("c1", "m", patch, 200).unwrap();

        assert_eq!(member.state.metadata.len(), 2);
        assert_eq!(member.state.metadata["weight"], "10");
        assert_eq!(member.state.metadata["protocol"], "http");
        assert_eq!(member.version.timestamp, VersionTimestamp::new(200, 0));
        assert_eq!(
            store.update_metadata("c1", "unknown", HashMap::new(), 300),
            Err(LocalUpdateError::NotRegistered("unknown".into()))
        );
    }

    #[test]
    fn update_metadata_of_remote_member_is_rejected() {
        let store = new_store("local");
        let remote = remote_member("m", "peer", 100, 0);
        store.apply_remote(remote.clone()).unwrap();

        let mut patch = HashMap::new();
        patch.insert("weight".to_string(), "10".to_string());

        assert_eq!(
            store.update_metadata("c1", "m", patch, 200),
            Err(LocalUpdateError::NotRegistered("m".into()))
        );
        assert_eq!(store.lookup("m").unwrap(), remote);
    }

    #[test]
    fn update_metadata_from_other_client_is_rejected() {
        let store = new_store("local");
        let registered = store.register("c1", member_state("m"), 100).unwrap();

        let mut patch = HashMap::new();
        patch.insert("weight".to_string(), "10".to_string());

        assert_eq!(
            store.update_metadata("c2", "m", patch, 200),
            Err(LocalUpdateError::NotRegistered("m".into()))
        );
        assert_eq!(store.lookup("m").unwrap(), registered);
    }

    #[test]
    fn unregister_client_continues_past_failure() {
        let store = new_store("local");
        store.register("c1", member_state("a"), 100).unwrap();
        store.register("c1", member_state("b"), 100).unwrap();
        // A version ahead of the clock makes the next mint for "a" regress.
        store.lock().members.get_mut("a").unwrap().version.timestamp = VersionTimestamp::new(50_000, 0);

        let result = store.unregister_client("c1", 1_000);

        assert!(matches!(result, Err(LocalUpdateError::ClockRegress { .. })));
        assert_eq!(store.lookup("a").unwrap().liveness, Liveness::Up);
        assert_eq!(store.lookup("b").unwrap().liveness, Liveness::Left);
    }

    #[test]
    fn client_heartbeat_continues_past_failure() {
        let store = new_store("local");
        store.register("c1", member_state("a"), 100).unwrap();
        store.register("c1", member_state("b"), 100).unwrap();
        store.update_liveness(1_000);
        store.lock().members.get_mut("a").unwrap().version.timestamp = VersionTimestamp::new(50_000, 0);

        let result = store.heartbeat_client("c1", 1_200);

        assert!(matches!(result, Err(LocalUpdateError::ClockRegress { .. })));
        assert_eq!(store.lookup("a").unwrap().liveness, Liveness::Down);
        assert_eq!(store.lookup("b").unwrap().liveness, Liveness::Up);
    }

    #[test]
    fn unregister_then_tombstone_expires() {
        let store = new_store("local");
        store.register("c1", member_state("m"), 100).unwrap();

        let member = store.unregister("m", 1_000).unwrap();
        assert_eq!(member.liveness, Liveness::Left);
        assert_eq!(member.expiry, 51_000);

        store.update_liveness(51_000);
        assert!(store.lookup("m").is_some(), "Tombstone removed before expiry");

        store.update_liveness(60_000);
        assert_eq!(store.lookup("m"), None);
    }

    #[test]
    fn unregister_client_leaves_every_member() {
        let store = new_store("local");
        store.register("c1", member_state("a"), 100).unwrap();
        store.register("c1", member_state("b"), 100).unwrap();
        store.register("c2", member_state("c"), 100).unwrap();

        let left = store.unregister_client("c1", 1_000).unwrap();

        assert_eq!(left.len(), 2);
        assert_eq!(store.lookup("a").unwrap().liveness, Liveness::Left);
        assert_eq!(store.lookup("b").unwrap().liveness, Liveness::Left);
        assert_eq!(store.lookup("c").unwrap().liveness, Liveness::Up);
        assert!(store.unregister_client("c1", 1_000).is_err());
    }

    #[test]
    fn remote_update_never_overwrites_self() {
        let store = new_store("local");
        let before = store.list();

        let result = store.apply_remote(remote_member("local", "peer", 10_000, 0));

        assert_eq!(result, Err(RemoteUpdateError::LocalMemberImmutable));
        assert_eq!(store.list(), before);
    }

    #[test]
    fn remote_update_claiming_local_ownership_is_dropped() {
        let store = new_store("local");

        let result = store.apply_remote(remote_member("m", "local", 10_000, 0));

        assert_eq!(result, Err(RemoteUpdateError::CrossOwnerClaim { member_id: "m".into() }));
        assert_eq!(store.lookup("m"), None);
    }

    #[test]
    fn remote_update_requires_newer_version() {
        let store = new_store("local");
        store.apply_remote(remote_member("m", "a", 100, 1)).unwrap();

        // Equal timestamp from another owner: the record we hold wins.
        assert!(matches!(
            store.apply_remote(remote_member("m", "b", 100, 1)),
            Err(RemoteUpdateError::OutdatedVersion { .. })
        ));
        assert!(matches!(
            store.apply_remote(remote_member("m", "a", 99, 5)),
            Err(RemoteUpdateError::OutdatedVersion { .. })
        ));
        store.apply_remote(remote_member("m", "b", 100, 2)).unwrap();

        assert_eq!(store.lookup("m").unwrap().version, Version::new(ReplicaId::new("b"), 100, 2));
    }

    #[test]
    fn remote_update_takes_ownership_away() {
        let store = new_store("local");
        store.register("c1", member_state("m"), 100).unwrap();

        store.apply_remote(remote_member("m", "peer", 200, 0)).unwrap();

        assert!(store.list_owned().iter().all(|m| m.id() != "m"));
        assert!(!store.lock().last_seen.contains_key("m"));
        assert_eq!(
            store.heartbeat_client("c1", 300),
            Err(LocalUpdateError::NotRegistered("c1".into()))
        );
    }

    #[test]
    fn list_views() {
        let store = new_store("local");
        store.register("c1", member_state("a"), 100).unwrap();
        store.register("c1", member_state("b"), 100).unwrap();
        store.unregister("b", 200).unwrap();
        store.apply_remote(remote_member("c", "peer", 100, 0)).unwrap();

        let ids = |members: Vec<VersionedMember>| members.into_iter().map(|m| m.state.id).collect::<Vec<_>>();
        assert_eq!(ids(store.list()), vec!["a", "b", "c", "local"]);
        assert_eq!(ids(store.list_owned()), vec!["a", "b", "local"]);
        assert_eq!(ids(store.list_up()), vec!["a", "c", "local"]);
    }

    #[test]
    fn departed_peer_tracked_only_while_owning_members() {
        let store = new_store("local");
        store.apply_remote(remote_member("m", "peer-1", 100, 0)).unwrap();

        store.peer_departed(&ReplicaId::new("peer-1"), 1_000);
        store.peer_departed(&ReplicaId::new("peer-2"), 1_000);
        store.peer_departed(&ReplicaId::new("local"), 1_000);
        assert_eq!(store.departed_peer_ids().len(), 1);

        store.peer_joined(&ReplicaId::new("peer-1"));
        assert!(store.departed_peer_ids().is_empty());
    }
}
