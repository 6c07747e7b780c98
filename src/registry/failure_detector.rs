use crate::registry::member::{Liveness, ReplicaId, VersionedMember};
use crate::registry::store::MemberStore;

enum LivenessAction {
    MarkDown(VersionedMember),
    MarkLeft(VersionedMember),
    Remove(String),
    TakeOver(VersionedMember),
}

impl MemberStore {
    /// One tick of the failure detector. Walks every member and moves it along the
    /// UP -> DOWN -> LEFT -> removed state machine. Members of departed peers are taken over once
    /// the departure is older than the heartbeat timeout.
    pub fn update_liveness(&self, now: i64) {
        let timeouts = self.config.timeouts;
        let mut inner = self.lock();

        let mut actions = Vec::new();
        for member in inner.members.values() {
            if member.id() == self.local_id.as_str() {
                continue;
            }

            if member.version.is_owned_by(&self.local_id) {
                match member.liveness {
                    Liveness::Up => {
                        let last_seen = inner.last_seen.get(member.id()).copied().unwrap_or(0);
                        if now - last_seen > timeouts.heartbeat_timeout {
                            actions.push(LivenessAction::MarkDown(member.clone()));
                        }
                    }
                    Liveness::Down => {
                        if now > member.expiry {
                            actions.push(LivenessAction::MarkLeft(member.clone()));
                        }
                    }
                    Liveness::Left => {
                        if now > member.expiry {
                            actions.push(LivenessAction::Remove(member.state.id.clone()));
                        }
                    }
                }
                continue;
            }

            if member.liveness == Liveness::Left && now > member.expiry {
                actions.push(LivenessAction::Remove(member.state.id.clone()));
                continue;
            }

            if let Some(departed_at) = inner.departed_peers.get(member.owner()) {
                if now - departed_at > timeouts.heartbeat_timeout {
                    actions.push(LivenessAction::TakeOver(member.clone()));
                }
            }
        }

        for action in actions {
            let result = match action {
                LivenessAction::MarkDown(member) => {
                    slog::info!(self.logger, "Member {:?} missed heartbeats, marking DOWN", member.id());
                    let expiry = now + timeouts.reconnect_timeout;
                    self.apply_local(&mut inner, member.state, Liveness::Down, expiry, now)
                        .map(|_| ())
                }
                LivenessAction::MarkLeft(member) => {
                    slog::info!(self.logger, "Member {:?} didn't reconnect, marking LEFT", member.id());
                    let expiry = now + timeouts.tombstone_timeout;
                    self.apply_local(&mut inner, member.state, Liveness::Left, expiry, now)
                        .map(|_| ())
                }
                LivenessAction::Remove(member_id) => {
                    slog::info!(self.logger, "Removing expired member {:?}", member_id);
                    inner.remove_member(&member_id);
                    Ok(())
                }
                LivenessAction::TakeOver(member) => {
                    slog::info!(
                        self.logger,
                        "Taking over {:?} from departed replica {:?}",
                        member.id(),
                        member.owner()
                    );
                    let (liveness, expiry) = match member.liveness {
                        Liveness::Up => (Liveness::Down, now + timeouts.reconnect_timeout),
                        other => (other, member.expiry),
                    };
                    self.apply_local(&mut inner, member.state, liveness, expiry, now)
                        .map(|_| ())
                }
            };

            if let Err(e) = result {
                slog::warn!(self.logger, "Failure detector update dropped: {}", e);
            }
        }

        let still_owning: Vec<ReplicaId> = inner
            .departed_peers
            .keys()
            .filter(|peer_id| inner.members.values().any(|m| m.version.is_owned_by(peer_id)))
            .cloned()
            .collect();
        inner.departed_peers.retain(|peer_id, _| still_owning.contains(peer_id));
    }
}
