use crate::registry::member::{Liveness, MemberState, Version, VersionTimestamp, VersionedMember};
use crate::registry::registry_api::{Delivery, KnownVersions, UpdateCallback};
use crate::registry::store::MemberStore;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

struct Subscriber {
    owner_only: bool,
    callback: UpdateCallback,
}

/// The set of registered callbacks. Lives inside the store's state, so publishing happens under
/// the store lock and subscribers observe updates in commit order.
pub(super) struct Subscribers {
    next_id: u64,
    subscribers: BTreeMap<u64, Subscriber>,
}

impl Subscribers {
    pub(super) fn new() -> Self {
        Subscribers {
            next_id: 0,
            subscribers: BTreeMap::new(),
        }
    }

    fn insert(&mut self, owner_only: bool, callback: UpdateCallback) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.insert(id, Subscriber { owner_only, callback });
        id
    }

    fn remove(&mut self, id: u64) -> bool {
        self.subscribers.remove(&id).is_some()
    }

    pub(super) fn publish(&mut self, logger: &slog::Logger, member: &VersionedMember, owned: bool) {
        let mut lagging = Vec::new();
        for (id, subscriber) in self.subscribers.iter_mut() {
            if subscriber.owner_only && !owned {
                continue;
            }
            if (subscriber.callback)(member) == Delivery::Lagging {
                lagging.push(*id);
            }
        }

        for id in lagging {
            slog::warn!(logger, "Removing lagging subscriber {}", id);
            self.subscribers.remove(&id);
        }
    }

    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        self.subscribers.len()
    }
}

/// Returned by `MemberStore::subscribe()`. The catch-up members must be delivered before any
/// update passed to the callback.
pub struct Subscription {
    pub catch_up: Vec<VersionedMember>,
    pub handle: SubscriptionHandle,
}

/// Unsubscribes when dropped.
pub struct SubscriptionHandle {
    store: Weak<MemberStore>,
    id: u64,
}

impl SubscriptionHandle {
    pub fn unsubscribe(self) {
        // Drop does it.
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.unsubscribe(self.id);
        }
    }
}

impl MemberStore {
    /// Registers `callback` for every future update, and returns the members the subscriber is
    /// missing given the versions it already `known`s.
    ///
    /// Known members that no longer exist in the store are returned as LEFT tombstones with a
    /// version one counter above the known one, so the subscriber drops them too.
    pub fn subscribe(
        self: &Arc<Self>,
        known: &KnownVersions,
        owner_only: bool,
        callback: UpdateCallback,
    ) -> Subscription {
        let mut inner = self.lock();

        let mut catch_up = Vec::new();
        for (id, member) in inner.members.iter() {
            let known_version = known.get(id);
            if owner_only
                && !member.version.is_owned_by(&self.local_id)
                && !known_version.map(|v| v.is_owned_by(&self.local_id)).unwrap_or(false)
            {
                continue;
            }

            match known_version {
                Some(known_version) if !member.version.is_newer_than(known_version) => {}
                _ => catch_up.push(member.clone()),
            }
        }

        for (id, known_version) in known.iter() {
            if inner.members.contains_key(id) {
                continue;
            }
            if owner_only && !known_version.is_owned_by(&self.local_id) {
                continue;
            }

            catch_up.push(VersionedMember {
                state: MemberState::tombstone(id.clone()),
                liveness: Liveness::Left,
                version: Version {
                    owner_id: known_version.owner_id.clone(),
                    timestamp: VersionTimestamp {
                        timestamp: known_version.timestamp.timestamp,
                        counter: known_version.timestamp.counter + 1,
                    },
                },
                expiry: 0,
            });
        }
        catch_up.sort_by(|a, b| a.state.id.cmp(&b.state.id));

        let id = inner.subscribers.insert(owner_only, callback);
        slog::debug!(
            self.logger,
            "Added subscriber {} (owner_only={}) with {} catch-up members",
            id,
            owner_only,
            catch_up.len()
        );

        Subscription {
            catch_up,
            handle: SubscriptionHandle {
                store: Arc::downgrade(self),
                id,
            },
        }
    }

    /// Subscribes to future updates only.
    pub fn subscribe_live(self: &Arc<Self>, owner_only: bool, callback: UpdateCallback) -> SubscriptionHandle {
        let id = self.lock().subscribers.insert(owner_only, callback);

        SubscriptionHandle {
            store: Arc::downgrade(self),
            id,
        }
    }

    fn unsubscribe(&self, id: u64) {
        if self.lock().subscribers.remove(id) {
            slog::debug!(self.logger, "Removed subscriber {}", id);
        }
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}
