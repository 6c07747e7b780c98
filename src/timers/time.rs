#[cfg(test)]
use tokio::sync::watch;
use tokio::time::Duration;

/// Wall clock in UTC milliseconds, the time domain of member versions and expiries.
#[async_trait::async_trait]
pub(crate) trait Clock: Clone + Send + Sync + 'static {
    fn now_ms(&self) -> i64;
    async fn sleep_until_ms(&mut self, deadline_ms: i64);
}

#[derive(Copy, Clone)]
pub(crate) struct RealClock;

#[async_trait::async_trait]
impl Clock for RealClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    async fn sleep_until_ms(&mut self, deadline_ms: i64) {
        let remaining = deadline_ms - self.now_ms();
        if remaining > 0 {
            tokio::time::sleep(Duration::from_millis(remaining as u64)).await;
        }
    }
}

#[cfg(test)]
pub(crate) fn mocked_clock() -> (MockClock, MockClockController) {
    mocked_clock_at(0)
}

#[cfg(test)]
pub(crate) fn mocked_clock_at(start_ms: i64) -> (MockClock, MockClockController) {
    let (tx, rx) = watch::channel(start_ms);
    let clock = MockClock { current_time: rx };
    let controller = MockClockController {
        current_time: tx,
        time_of_instantiation: start_ms,
    };

    (clock, controller)
}

#[cfg(test)]
#[derive(Clone)]
pub(crate) struct MockClock {
    current_time: watch::Receiver<i64>,
}

#[cfg(test)]
#[async_trait::async_trait]
impl Clock for MockClock {
    fn now_ms(&self) -> i64 {
        *self.current_time.borrow()
    }

    async fn sleep_until_ms(&mut self, deadline_ms: i64) {
        loop {
            if *self.current_time.borrow() >= deadline_ms {
                return;
            }

            if self.current_time.changed().await.is_err() {
                // Controller dropped, time stands still forever.
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
pub(crate) struct MockClockController {
    current_time: watch::Sender<i64>,
    time_of_instantiation: i64,
}

#[cfg(test)]
impl MockClockController {
    pub(crate) fn current_time(&self) -> i64 {
        *self.current_time.borrow()
    }

    pub(crate) fn elapsed_time(&self) -> Duration {
        Duration::from_millis((self.current_time() - self.time_of_instantiation) as u64)
    }

    /// Same caveat as any mock clock: `sleep_until_ms` only promises to return once `now` is at or
    /// past the deadline. Advance in steps smaller than the granularity you want to observe.
    pub(crate) fn advance(&mut self, duration: Duration) {
        let new_now = self.current_time() + duration.as_millis() as i64;
        // Nobody listening is fine.
        let _ = self.current_time.send(new_now);
    }
}
