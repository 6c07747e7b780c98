use crate::registry::MemberStore;
use crate::replication::peers::PeerTracker;
use crate::replication::replication_api::{PeerConnector, PeerTransport};
use crate::timers::{Clock, RealClock};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

/// Every `interval`, pulls a delta from each peer in turn by sending it a digest.
pub(crate) struct AntiEntropyTimer<P: PeerConnector, C: Clock = RealClock> {
    logger: slog::Logger,
    store: Arc<MemberStore>,
    peers: Arc<PeerTracker<P>>,
    interval: Duration,
    clock: C,
    cancel: CancellationToken,
    rng: StdRng,
}

impl<P: PeerConnector> AntiEntropyTimer<P> {
    pub(crate) fn spawn(
        logger: slog::Logger,
        store: Arc<MemberStore>,
        peers: Arc<PeerTracker<P>>,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        let timer = AntiEntropyTimer::new(logger, store, peers, interval, RealClock, cancel);
        tokio::task::spawn(timer.run());
    }
}

impl<P: PeerConnector, C: Clock> AntiEntropyTimer<P, C> {
    fn new(
        logger: slog::Logger,
        store: Arc<MemberStore>,
        peers: Arc<PeerTracker<P>>,
        interval: Duration,
        clock: C,
        cancel: CancellationToken,
    ) -> Self {
        AntiEntropyTimer {
            logger,
            store,
            peers,
            interval,
            clock,
            cancel,
            rng: StdRng::from_entropy(),
        }
    }

    async fn run(mut self) {
        let interval_ms = self.interval.as_millis() as i64;
        let mut next_wake = self.clock.now_ms();
        loop {
            next_wake += interval_ms;
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    slog::info!(self.logger, "Anti-entropy timer stopped");
                    return;
                }
                _ = self.clock.sleep_until_ms(next_wake) => {}
            }

            self.run_round().await;
        }
    }

    /// One digest/delta exchange with every known peer.
    async fn run_round(&mut self) {
        for (peer_id, transport) in self.peers.digest_targets() {
            let digest = self.store.build_digest(&mut self.rng);

            let mut transport = transport.lock().await;
            let result = tokio::select! {
                _ = self.cancel.cancelled() => return,
                result = transport.exchange_digest(&digest) => result,
            };

            match result {
                Ok(delta) => {
                    let outcome = self.store.apply_delta(&digest, delta);
                    slog::debug!(self.logger, "Anti-entropy with {:?}: {:?}", peer_id, outcome);
                }
                Err(status) => {
                    slog::warn!(self.logger, "Anti-entropy with {:?} failed: {}", peer_id, status);
                    // Requeue the placeholders we drained for this digest.
                    self.store.apply_delta(&digest, Vec::new());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::test_utils::{member_state, new_store, test_logger};
    use crate::registry::ReplicaId;
    use crate::replication::forwarder::ForwarderConfig;
    use crate::replication::replication_api::PeerInfo;
    use crate::replication::test_utils::InMemoryConnector;
    use crate::timers::mocked_clock;
    use std::net::SocketAddr;
    use tonic::Status;

    struct Replica {
        store: Arc<MemberStore>,
        peers: Arc<PeerTracker<InMemoryConnector>>,
    }

    /// Replicas wired to each other in memory. Forwarder queues are tiny so that anti-entropy has
    /// something left to repair.
    fn cluster(ids: &[&str]) -> (Vec<Replica>, InMemoryConnector) {
        let connector = InMemoryConnector::default();
        let config = ForwarderConfig {
            queue_size: 1,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        };

        let replicas: Vec<Replica> = ids
            .iter()
            .map(|id| {
                let store = Arc::new(new_store(id));
                connector.add(store.clone());
                let peers = Arc::new(PeerTracker::new(
                    test_logger(),
                    store.clone(),
                    connector.clone(),
                    config,
                    CancellationToken::new(),
                ));
                Replica { store, peers }
            })
            .collect();

        for (i, replica) in replicas.iter().enumerate() {
            for (j, id) in ids.iter().enumerate() {
                if i != j {
                    replica.peers.join(PeerInfo {
                        id: ReplicaId::new(*id),
                        rpc_addr: SocketAddr::from(([127, 0, 0, 1], 9000 + j as u16)),
                    });
                }
            }
        }

        (replicas, connector)
    }

    fn timer(replica: &Replica) -> AntiEntropyTimer<InMemoryConnector> {
        AntiEntropyTimer::new(
            test_logger(),
            replica.store.clone(),
            replica.peers.clone(),
            Duration::from_secs(10),
            RealClock,
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn rounds_converge_replicas() {
        let (replicas, _connector) = cluster(&["a", "b", "c"]);
        for (i, replica) in replicas.iter().enumerate() {
            for j in 0..20 {
                let id = format!("member-{}-{}", i, j);
                replica.store.register("c1", member_state(&id), 100 + j).unwrap();
            }
        }

        for replica in replicas.iter() {
            timer(replica).run_round().await;
        }
        for replica in replicas.iter() {
            timer(replica).run_round().await;
        }

        let expected = replicas[0].store.list();
        assert_eq!(expected.len(), 63);
        for replica in replicas.iter() {
            assert_eq!(replica.store.list(), expected);
        }
    }

    #[tokio::test]
    async fn failed_round_is_logged_and_skipped() {
        let (replicas, connector) = cluster(&["a", "b"]);
        connector
            .log(&ReplicaId::new("b"))
            .fail_next(vec![Status::unavailable("down")]);
        replicas[1].store.register("c1", member_state("m"), 100).unwrap();

        let mut timer = timer(&replicas[0]);
        timer.run_round().await;
        // The forwarder may have delivered it meanwhile. Either way the next round has it.
        timer.run_round().await;

        assert_eq!(replicas[0].store.lookup("m"), replicas[1].store.lookup("m"));
    }

    #[tokio::test]
    async fn timer_runs_rounds_on_interval() {
        let (replicas, connector) = cluster(&["a", "b"]);
        let (clock, mut controller) = mocked_clock();
        let cancel = CancellationToken::new();
        let timer = AntiEntropyTimer::new(
            test_logger(),
            replicas[0].store.clone(),
            replicas[0].peers.clone(),
            Duration::from_secs(10),
            clock,
            cancel.clone(),
        );
        let task = tokio::task::spawn(timer.run());
        let log = connector.log(&ReplicaId::new("b"));

        controller.advance(Duration::from_secs(5));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(log.digests(), 0);

        controller.advance(Duration::from_secs(5));
        wait_for_digests(&connector, "b", 1).await;

        controller.advance(Duration::from_secs(10));
        wait_for_digests(&connector, "b", 2).await;

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("Timer didn't stop")
            .unwrap();
    }

    async fn wait_for_digests(connector: &InMemoryConnector, id: &str, count: usize) {
        let log = connector.log(&ReplicaId::new(id));
        tokio::time::timeout(Duration::from_secs(5), async {
            while log.digests() < count {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("Unexpected timeout");
    }
}
