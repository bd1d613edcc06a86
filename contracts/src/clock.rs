//! Logical clock consulted by time-dependent vault logic.
//!
//! The vault never schedules anything. Yield accrual and withdrawal delays
//! are evaluated against `Clock::now()` at the moment a call executes.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

/// Source of the current time for a vault.
pub trait Clock: Send + Sync + fmt::Debug {
    /// The time at which the current call executes.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Cloning shares the underlying instant, so a test can hand one clone to a
/// proxy and keep another to advance time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl ManualClock {
    /// Starts the clock at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(RwLock::new(start)),
        }
    }

    /// Starts the clock at the current wall-clock time.
    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    /// Moves the clock forward by `secs` seconds.
    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.write();
        *now += Duration::seconds(secs);
    }

    /// Pins the clock to an exact instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.write() = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

/// `start + secs`, or `None` if the instant is not representable.
pub fn add_secs(start: DateTime<Utc>, secs: u64) -> Option<DateTime<Utc>> {
    let millis = secs.checked_mul(1_000).and_then(|ms| i64::try_from(ms).ok())?;
    start.checked_add_signed(Duration::milliseconds(millis))
}

/// `start + secs`, saturating at the latest representable instant. An
/// effectively unbounded delay yields a time that is never reached.
pub fn saturating_add_secs(start: DateTime<Utc>, secs: u64) -> DateTime<Utc> {
    add_secs(start, secs).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Whole seconds from `start` to `now`, clamped at zero.
pub fn elapsed_secs(start: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - start).num_seconds().max(0) as u64
}
