use crate::registry::MemberStore;
use crate::timers::time::{Clock, RealClock};
use std::sync::Arc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

/// Periodically drives the failure detector of a `MemberStore`.
pub(crate) struct LivenessTimer<C: Clock = RealClock> {
    store: Arc<MemberStore>,
    interval: Duration,
    clock: C,
    cancel: CancellationToken,
}

impl LivenessTimer {
    pub(crate) fn spawn(store: Arc<MemberStore>, interval: Duration, cancel: CancellationToken) {
        // Keep this thin, it isn't covered by tests.
        let timer = LivenessTimer::new(store, interval, RealClock, cancel);
        tokio::task::spawn(timer.run());
    }
}

impl<C: Clock> LivenessTimer<C> {
    fn new(store: Arc<MemberStore>, interval: Duration, clock: C, cancel: CancellationToken) -> Self {
        LivenessTimer {
            store,
            interval,
            clock,
            cancel,
        }
    }

    async fn run(mut self) {
        let interval_ms = self.interval.as_millis() as i64;
        let mut next_wake = self.clock.now_ms();
        loop {
            next_wake += interval_ms;
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    slog::info!(self.store.logger(), "Liveness timer stopped");
                    return;
                }
                _ = self.clock.sleep_until_ms(next_wake) => {}
            }

            self.store.update_liveness(self.clock.now_ms());
        }
    }
}
