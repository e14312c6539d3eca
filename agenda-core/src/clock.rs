//! Time sources.
//!
//! Relative dates resolve against the wall clock in the configured offset,
//! while the circuit breaker measures cooldowns on the monotonic clock.
//! Both come from one trait so tests can drive them together.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use parking_lot::Mutex;

use crate::error::{AgendaError, AgendaResult};

pub trait Clock: Send + Sync {
    /// Current wall-clock time in the configured offset.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Current monotonic instant.
    fn instant(&self) -> Instant;

    /// Calendar date used as "today" for relative expressions.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// The real clock, pinned to a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        SystemClock { offset }
    }

    pub fn with_offset_hours(hours: i32) -> AgendaResult<Self> {
        FixedOffset::east_opt(hours * 3600)
            .map(SystemClock::new)
            .ok_or_else(|| AgendaError::Config(format!("Invalid UTC offset: {} hours", hours)))
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    wall: DateTime<FixedOffset>,
    origin: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new(wall: DateTime<FixedOffset>) -> Self {
        ManualClock {
            wall,
            origin: Instant::now(),
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Move both the wall clock and the monotonic clock forward.
    pub fn advance(&self, by: Duration) {
        *self.elapsed.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let elapsed = *self.elapsed.lock();
        self.wall + chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero())
    }

    fn instant(&self) -> Instant {
        self.origin + *self.elapsed.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn manual_clock_moves_both_clocks() {
        let offset = FixedOffset::west_opt(3 * 3600).unwrap();
        let wall = offset.with_ymd_and_hms(2025, 1, 10, 23, 30, 0).unwrap();
        let clock = ManualClock::new(wall);
        let start = clock.instant();

        clock.advance(Duration::from_secs(3600));
        assert_eq!(clock.instant() - start, Duration::from_secs(3600));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 1, 11).unwrap());
    }

    #[test]
    fn clones_share_elapsed_time() {
        let wall = Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap().fixed_offset();
        let clock = ManualClock::new(wall);
        let other = clock.clone();
        other.advance(Duration::from_secs(5));
        assert_eq!(clock.now(), wall + chrono::Duration::seconds(5));
    }

    #[test]
    fn offset_hours_validation() {
        assert!(SystemClock::with_offset_hours(-3).is_ok());
        assert!(SystemClock::with_offset_hours(30).is_err());
    }
}
