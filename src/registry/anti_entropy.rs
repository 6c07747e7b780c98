use crate::registry::member::{VersionTimestamp, VersionedMember};
use crate::registry::registry_api::{DeltaOutcome, Digest};
use crate::registry::store::MemberStore;
use rand::seq::IteratorRandom;
use rand::Rng;
use std::collections::HashMap;

/// Placeholder ids nobody satisfies are asked for this many times, then forgotten.
pub(crate) const MAX_PRIORITY_ATTEMPTS: u32 = 3;

impl MemberStore {
    /// Builds the digest advertised to a peer: the priority ids first, then a random sample of the
    /// remaining members up to `digest_size` entries. Priority ids we hold no record for are sent
    /// as zero placeholders.
    pub fn build_digest<R: Rng + ?Sized>(&self, rng: &mut R) -> Digest {
        let digest_size = self.config.digest_size;
        let mut inner = self.lock();

        let mut entries = HashMap::with_capacity(digest_size);
        let mut placeholders = HashMap::new();
        let priority: Vec<(String, u32)> = inner.priority_digest_ids.drain().collect();
        for (id, attempts) in priority.into_iter().take(digest_size) {
            match inner.members.get(&id) {
                Some(member) => {
                    entries.insert(id, member.version.timestamp);
                }
                None => {
                    entries.insert(id.clone(), VersionTimestamp::zero());
                    placeholders.insert(id, attempts);
                }
            }
        }

        let remaining = digest_size.saturating_sub(entries.len());
        let sample = inner
            .members
            .values()
            .filter(|m| !entries.contains_key(m.id()))
            .choose_multiple(rng, remaining);
        for member in sample {
            entries.insert(member.state.id.clone(), member.version.timestamp);
        }

        Digest { entries, placeholders }
    }

    /// Answers a peer's digest with every member we hold a newer version of, then fills the rest of
    /// the budget with random members the digest didn't mention. Ids the peer is ahead on, or that
    /// only the peer has, are asked for in our next digest.
    pub fn handle_digest<R: Rng + ?Sized>(&self, digest: &Digest, rng: &mut R) -> Vec<VersionedMember> {
        let digest_size = self.config.digest_size;
        let mut inner = self.lock();

        let mut delta = Vec::new();
        let mut behind = Vec::new();
        for (id, timestamp) in digest.entries.iter() {
            match inner.members.get(id) {
                Some(member) => {
                    if member.version.timestamp > *timestamp {
                        delta.push(member.clone());
                    } else if member.version.timestamp < *timestamp {
                        behind.push(id.clone());
                    }
                }
                None => {
                    // Peer doesn't have it either.
                    if *timestamp != VersionTimestamp::zero() {
                        behind.push(id.clone());
                    }
                }
            }
        }

        for id in behind {
            if inner.priority_digest_ids.len() >= digest_size {
                break;
            }
            inner.priority_digest_ids.entry(id).or_insert(0);
        }

        let remaining = digest_size.saturating_sub(delta.len());
        let fill = inner
            .members
            .values()
            .filter(|m| !digest.entries.contains_key(m.id()))
            .choose_multiple(rng, remaining);
        delta.extend(fill.into_iter().cloned());

        delta
    }

    /// Applies a peer's response to our digest. Unsatisfied placeholders are requeued until they
    /// run out of attempts.
    pub fn apply_delta(&self, digest: &Digest, delta: Vec<VersionedMember>) -> DeltaOutcome {
        let digest_size = self.config.digest_size;
        let mut inner = self.lock();
        let mut outcome = DeltaOutcome::default();

        for member in delta {
            match self.apply_remote_locked(&mut inner, member) {
                Ok(()) => outcome.applied += 1,
                Err(_) => outcome.rejected += 1,
            }
        }

        for (id, attempts) in digest.placeholders.iter() {
            if inner.members.contains_key(id) {
                continue;
            }
            if attempts + 1 >= MAX_PRIORITY_ATTEMPTS {
                slog::debug!(self.logger, "Giving up on {:?} after {} attempts", id, attempts + 1);
                continue;
            }
            if inner.priority_digest_ids.len() >= digest_size {
                break;
            }

            inner.priority_digest_ids.insert(id.clone(), attempts + 1);
            outcome.requeued += 1;
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::member::{MemberState, ReplicaId};
    use crate::registry::store::test_utils::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// One digest/delta exchange where `from` pulls from `to`.
    fn exchange(from: &MemberStore, to: &MemberStore, rng: &mut StdRng) -> DeltaOutcome {
        let digest = from.build_digest(rng);
        let delta = to.handle_digest(&digest, rng);
        from.apply_delta(&digest, delta)
    }

    #[test]
    fn anti_entropy_convergence() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = new_store("a");
        let b = new_store("b");
        for i in 0..25 {
            a.register("c1", member_state(&format!("member-a-{:02}", i)), rng.gen_range(1..1_000))
                .unwrap();
            b.register("c1", member_state(&format!("member-b-{:02}", i)), rng.gen_range(1..1_000))
                .unwrap();
        }

        exchange(&a, &b, &mut rng);
        exchange(&b, &a, &mut rng);

        let a_members = a.list();
        assert_eq!(a_members.len(), 52);
        assert_eq!(a_members, b.list());
    }

    #[test]
    fn newest_version_wins() {
        let mut rng = StdRng::seed_from_u64(11);
        let a = new_store("a");
        let b = new_store("b");
        a.apply_remote(remote_member("m", "c", 100, 0)).unwrap();
        b.apply_remote(remote_member("m", "d", 100, 3)).unwrap();
        a.apply_remote(remote_member("n", "c", 500, 0)).unwrap();
        b.apply_remote(remote_member("n", "d", 200, 0)).unwrap();

        for _ in 0..2 {
            exchange(&a, &b, &mut rng);
            exchange(&b, &a, &mut rng);
        }

        assert_eq!(a.list(), b.list());
        assert_eq!(a.lookup("m").unwrap().version.timestamp, VersionTimestamp::new(100, 3));
        assert_eq!(a.lookup("n").unwrap().version.timestamp, VersionTimestamp::new(500, 0));
    }

    #[test]
    fn behind_ids_are_prioritized() {
        let mut rng = StdRng::seed_from_u64(3);
        let store = new_store("a");
        store.apply_remote(remote_member("m", "c", 100, 0)).unwrap();

        let mut entries = HashMap::new();
        entries.insert("m".to_string(), VersionTimestamp::new(200, 0));
        entries.insert("only-on-peer".to_string(), VersionTimestamp::new(50, 0));
        entries.insert("nobody".to_string(), VersionTimestamp::zero());
        let delta = store.handle_digest(&Digest::from_entries(entries), &mut rng);

        // Only the local member is absent from the digest.
        assert_eq!(delta.len(), 1);
        assert_eq!(delta[0].id(), "a");

        let digest = store.build_digest(&mut rng);
        assert_eq!(digest.entries["m"], VersionTimestamp::new(100, 0));
        assert_eq!(digest.entries["only-on-peer"], VersionTimestamp::zero());
        assert!(!digest.entries.contains_key("nobody"));
        assert_eq!(digest.placeholders.len(), 1);
        assert!(store.lock().priority_digest_ids.is_empty());
    }

    #[test]
    fn placeholder_retries_are_bounded() {
        let mut rng = StdRng::seed_from_u64(5);
        let store = new_store("a");
        store.lock().priority_digest_ids.insert("ghost".to_string(), 0);

        let mut rounds = 0;
        loop {
            let digest = store.build_digest(&mut rng);
            if !digest.entries.contains_key("ghost") {
                break;
            }
            rounds += 1;
            store.apply_delta(&digest, Vec::new());
        }

        assert_eq!(rounds, MAX_PRIORITY_ATTEMPTS);
    }

    #[test]
    fn satisfied_placeholder_is_not_requeued() {
        let mut rng = StdRng::seed_from_u64(5);
        let store = new_store("a");
        store.lock().priority_digest_ids.insert("m".to_string(), 0);
        let digest = store.build_digest(&mut rng);

        let outcome = store.apply_delta(&digest, vec![remote_member("m", "b", 100, 0)]);

        assert_eq!(
            outcome,
            DeltaOutcome {
                applied: 1,
                rejected: 0,
                requeued: 0
            }
        );
        assert!(store.lock().priority_digest_ids.is_empty());
    }

    #[test]
    fn digest_is_capped() {
        let mut rng = StdRng::seed_from_u64(9);
        let store = new_store("a");
        for i in 0..100 {
            store.register("c1", member_state(&format!("m-{}", i)), 100).unwrap();
        }

        let digest = store.build_digest(&mut rng);
        assert_eq!(digest.entries.len(), 64);

        let delta = store.handle_digest(&Digest::default(), &mut rng);
        assert_eq!(delta.len(), 64);
    }

    #[test]
    fn delta_never_overwrites_self() {
        let mut rng = StdRng::seed_from_u64(1);
        let store = new_store("a");
        let mut imposter = remote_member("a", "b", 10_000, 0);
        imposter.state = MemberState {
            id: "a".into(),
            service: "imposter".into(),
            ..MemberState::default()
        };
        let digest = store.build_digest(&mut rng);

        let outcome = store.apply_delta(&digest, vec![imposter]);

        assert_eq!(outcome.rejected, 1);
        assert_eq!(store.lookup("a").unwrap().owner(), &ReplicaId::new("a"));
    }
}
