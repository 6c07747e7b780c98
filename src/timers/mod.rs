mod liveness_timer;
mod time;

pub(crate) use liveness_timer::LivenessTimer;
pub(crate) use time::Clock;
pub(crate) use time::RealClock;

#[cfg(test)]
pub(crate) use time::{mocked_clock, MockClock, MockClockController};
