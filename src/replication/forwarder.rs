use crate::registry::{Delivery, MemberStore, SubscriptionHandle, VersionedMember};
use crate::replication::replication_api::{is_deterministic_rejection, PeerTransport};
use rand::Rng;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Copy, Clone, Debug)]
pub(crate) struct ForwarderConfig {
    pub(crate) queue_size: usize,
    pub(crate) initial_backoff: Duration,
    pub(crate) max_backoff: Duration,
}

/// FIFO of updates to deliver to one peer, holding at most one update per member id. A newer
/// update for a queued id replaces it in place.
struct ForwarderQueue {
    capacity: usize,
    state: Mutex<QueueState>,
    notify: Notify,
}

#[derive(Default)]
struct QueueState {
    order: VecDeque<String>,
    pending: HashMap<String, VersionedMember>,
}

impl ForwarderQueue {
    fn new(capacity: usize) -> Self {
        ForwarderQueue {
            capacity,
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueState> {
        self.state.lock().expect("ForwarderQueue mutex guard poison")
    }

    /// Returns false if the update was dropped because the queue is full.
    fn push(&self, member: VersionedMember) -> bool {
        let mut state = self.lock();
        let id = member.state.id.clone();

        if let Some(queued) = state.pending.get_mut(&id) {
            *queued = member;
        } else if state.order.len() >= self.capacity {
            return false;
        } else {
            state.order.push_back(id.clone());
            state.pending.insert(id, member);
        }

        drop(state);
        self.notify.notify_one();
        true
    }

    fn try_pop(&self) -> Option<VersionedMember> {
        let mut state = self.lock();
        while let Some(id) = state.order.pop_front() {
            if let Some(member) = state.pending.remove(&id) {
                return Some(member);
            }
        }

        None
    }

    async fn pop(&self) -> VersionedMember {
        loop {
            if let Some(member) = self.try_pop() {
                return member;
            }
            self.notify.notified().await;
        }
    }

    fn has_newer(&self, member: &VersionedMember) -> bool {
        self.lock()
            .pending
            .get(member.id())
            .map(|queued| queued.version.is_newer_than(&member.version))
            .unwrap_or(false)
    }

    fn len(&self) -> usize {
        self.lock().order.len()
    }
}

/// Keeps one peer's forwarder alive. Dropping it unsubscribes from the store and stops the sender
/// task.
pub(crate) struct ForwarderHandle {
    _subscription: SubscriptionHandle,
    _stop: tokio_util::sync::DropGuard,
}

/// Subscribes to every update this replica owns and unicasts them to the peer, in commit order.
pub(crate) fn spawn_forwarder<T: PeerTransport>(
    logger: slog::Logger,
    store: &Arc<MemberStore>,
    transport: T,
    config: ForwarderConfig,
    cancel: CancellationToken,
) -> ForwarderHandle {
    let queue = Arc::new(ForwarderQueue::new(config.queue_size));

    let callback_queue = queue.clone();
    let callback_logger = logger.clone();
    let subscription = store.subscribe_live(
        true,
        Box::new(move |member: &VersionedMember| {
            if !callback_queue.push(member.clone()) {
                slog::warn!(callback_logger, "Forwarder queue full, dropping update for {:?}", member.id());
            }
            // Overflow is repaired by anti-entropy, the forwarder never lags out.
            Delivery::Delivered
        }),
    );

    let sender = ForwarderTask {
        logger,
        queue,
        transport,
        config,
        cancel: cancel.clone(),
    };
    tokio::task::spawn(sender.run());

    ForwarderHandle {
        _subscription: subscription,
        _stop: cancel.drop_guard(),
    }
}

struct ForwarderTask<T: PeerTransport> {
    logger: slog::Logger,
    queue: Arc<ForwarderQueue>,
    transport: T,
    config: ForwarderConfig,
    cancel: CancellationToken,
}

impl<T: PeerTransport> ForwarderTask<T> {
    async fn run(mut self) {
        loop {
            let member = tokio::select! {
                _ = self.cancel.cancelled() => {
                    slog::debug!(self.logger, "Forwarder stopped with {} updates queued", self.queue.len());
                    return;
                }
                member = self.queue.pop() => member,
            };

            if !self.deliver(member).await {
                return;
            }
        }
    }

    /// Returns false if cancelled.
    async fn deliver(&mut self, member: VersionedMember) -> bool {
        let mut backoff = self.config.initial_backoff;
        loop {
            let result = tokio::select! {
                _ = self.cancel.cancelled() => return false,
                result = self.transport.send_update(&member) => result,
            };

            let status = match result {
                Ok(()) => return true,
                Err(status) => status,
            };

            if is_deterministic_rejection(&status) {
                slog::debug!(self.logger, "Peer rejected {:?}: {}", member.id(), status.message());
                return true;
            }
            if self.queue.has_newer(&member) {
                slog::debug!(self.logger, "Abandoning retry of {:?}, newer version queued", member.id());
                return true;
            }

            slog::warn!(
                self.logger,
                "Failed to forward {:?}, retrying in {:?}: {}",
                member.id(),
                backoff,
                status
            );
            let jitter = rand::thread_rng().gen_range(0..=backoff.as_millis() as u64 / 2);
            let sleep = backoff + Duration::from_millis(jitter);
            tokio::select! {
                _ = self.cancel.cancelled() => return false,
                _ = tokio::time::sleep(sleep) => {}
            }

            backoff = std::cmp::min(backoff * 2, self.config.max_backoff);
        }
    }
}
