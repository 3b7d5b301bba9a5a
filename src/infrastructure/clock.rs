use crate::domain::ports::Clock;
use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

/// Wall-clock time source used outside of tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Lets tests exercise TTL expiry,
/// operating-hours windows and confirmation deadlines deterministically.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut slot) = self.now.lock() {
            *slot = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut slot) = self.now.lock() {
            *slot += by;
        }
    }
}

impl Default for ManualClock {
    /// A fixed mid-day instant, so always-open fixtures are unaffected by
    /// operating-hours checks.
    fn default() -> Self {
        Self::at(
            "2026-01-15T10:00:00Z"
                .parse()
                .unwrap_or_else(|_| Utc::now()),
        )
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
            .lock()
            .map(|slot| *slot)
            .unwrap_or_else(|_| Utc::now())
    }
}
