use crate::registry::{Digest, MemberStore, ReplicaId, VersionedMember};
use crate::replication::replication_api::{PeerConnector, PeerInfo, PeerTransport};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::time::Duration;
use tonic::Status;

#[derive(Default)]
struct LogState {
    attempts: usize,
    failures: VecDeque<Status>,
    updates: Vec<VersionedMember>,
    digests: usize,
}

/// Records what a `FakeTransport` was asked to send.
#[derive(Clone, Default)]
pub(crate) struct TransportLog {
    state: Arc<Mutex<LogState>>,
}

impl TransportLog {
    /// The next calls fail with these statuses, in order.
    pub(crate) fn fail_next(&self, failures: Vec<Status>) {
        self.state.lock().unwrap().failures.extend(failures);
    }

    pub(crate) fn attempts(&self) -> usize {
        self.state.lock().unwrap().attempts
    }

    pub(crate) fn digests(&self) -> usize {
        self.state.lock().unwrap().digests
    }

    pub(crate) async fn wait_for_updates(&self, count: usize) -> Vec<VersionedMember> {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                {
                    let state = self.state.lock().unwrap();
                    if state.updates.len() >= count {
                        return state.updates.clone();
                    }
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("Unexpected timeout")
    }
}

/// Accepts every update, optionally failing some first. If `peer` is set, updates and digests
/// are applied to it as a real peer would.
pub(crate) struct FakeTransport {
    log: TransportLog,
    peer: Option<Arc<MemberStore>>,
    rng: StdRng,
}

impl FakeTransport {
    pub(crate) fn new(log: TransportLog) -> Self {
        FakeTransport {
            log,
            peer: None,
            rng: StdRng::seed_from_u64(0),
        }
    }

    pub(crate) fn to_store(log: TransportLog, peer: Arc<MemberStore>) -> Self {
        FakeTransport {
            log,
            peer: Some(peer),
            rng: StdRng::seed_from_u64(0),
        }
    }

    fn next_failure(&self) -> Option<Status> {
        let mut state = self.log.state.lock().unwrap();
        state.attempts += 1;
        state.failures.pop_front()
    }
}

#[async_trait::async_trait]
impl PeerTransport for FakeTransport {
    async fn send_update(&mut self, member: &VersionedMember) -> Result<(), Status> {
        if let Some(status) = self.next_failure() {
            return Err(status);
        }
        if let Some(peer) = &self.peer {
            peer.apply_remote(member.clone())
                .map_err(|e| Status::failed_precondition(e.to_string()))?;
        }

        self.log.state.lock().unwrap().updates.push(member.clone());
        Ok(())
    }

    async fn exchange_digest(&mut self, digest: &Digest) -> Result<Vec<VersionedMember>, Status> {
        if let Some(status) = self.next_failure() {
            return Err(status);
        }
        self.log.state.lock().unwrap().digests += 1;

        match &self.peer {
            Some(peer) => Ok(peer.handle_digest(&Digest::from_entries(digest.entries.clone()), &mut self.rng)),
            None => Ok(Vec::new()),
        }
    }
}

/// Connects peers to in-process stores.
#[derive(Clone, Default)]
pub(crate) struct InMemoryConnector {
    stores: Arc<Mutex<HashMap<ReplicaId, Arc<MemberStore>>>>,
    logs: Arc<Mutex<HashMap<ReplicaId, TransportLog>>>,
}

impl InMemoryConnector {
    pub(crate) fn add(&self, store: Arc<MemberStore>) {
        let id = store.local_id().clone();
        self.stores.lock().unwrap().insert(id.clone(), store);
        self.logs.lock().unwrap().insert(id, TransportLog::default());
    }

    pub(crate) fn log(&self, id: &ReplicaId) -> TransportLog {
        self.logs.lock().unwrap().entry(id.clone()).or_default().clone()
    }
}

impl PeerConnector for InMemoryConnector {
    type Transport = FakeTransport;

    fn connect(&self, peer: &PeerInfo) -> FakeTransport {
        let log = self.log(&peer.id);
        match self.stores.lock().unwrap().get(&peer.id) {
            Some(store) => FakeTransport::to_store(log, store.clone()),
            None => FakeTransport::new(log),
        }
    }
}
