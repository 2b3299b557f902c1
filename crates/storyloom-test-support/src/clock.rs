//! Test clock — a `Clock` pinned to one instant.

use chrono::{DateTime, TimeZone, Utc};
use storyloom_core::clock::Clock;

/// A clock that never advances.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Pins the clock to a UTC calendar time.
    ///
    /// # Panics
    ///
    /// Panics if the fields do not form a valid date and time.
    #[must_use]
    pub fn at_utc(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Self {
        Self(
            Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
                .single()
                .expect("valid UTC timestamp"),
        )
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
