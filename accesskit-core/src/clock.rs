//! Time source used for validation and bookkeeping.

use chrono::{DateTime, FixedOffset, Local};

/// Supplies the current local time, including its UTC offset.
///
/// Time restrictions are evaluated against the local wall clock, expiry against the
/// absolute instant, so both live in one value.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Device clock in the device's time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
