use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::Timestamp;

/// Source of `now` for hosts that build a [`CallContext`](crate::CallContext).
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Wall clock, seconds since the Unix epoch.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Manually driven clock for tests and replay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FixedClock(pub Timestamp);

impl FixedClock {
    pub fn advance(&mut self, secs: u64) {
        self.0 = self.0.saturating_add(secs);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}
