//! Clock abstraction.
//!
//! Time is always caller-provided: the posting engine stamps posting dates
//! and the recurring scheduler decides due-ness through a `Clock`, never by
//! reading the system time directly. `FixedClock` makes both deterministic
//! in tests.

use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current instant in UTC.
    fn now_utc(&self) -> DateTime<Utc>;

    /// Returns today's date in the given time zone.
    fn today_in(&self, tz: chrono_tz::Tz) -> NaiveDate {
        self.now_utc().with_timezone(&tz).date_naive()
    }
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests and replay.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Creates a clock pinned at the given instant.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Creates a clock pinned at midnight UTC of the given date.
    #[must_use]
    pub fn at_date(date: NaiveDate) -> Self {
        Self::new(date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
    }

    /// Moves the clock to a new instant.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().expect("clock poisoned") = now;
    }

    /// Advances the clock by the given duration.
    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().expect("clock poisoned");
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_is_pinned() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let clock = FixedClock::at_date(date);
        assert_eq!(clock.today_in(chrono_tz::Tz::UTC), date);
    }

    #[test]
    fn test_fixed_clock_advance() {
        let clock = FixedClock::at_date(NaiveDate::from_ymd_opt(2025, 1, 31).unwrap());
        clock.advance(chrono::Duration::days(1));
        assert_eq!(
            clock.today_in(chrono_tz::Tz::UTC),
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()
        );
    }

    #[test]
    fn test_today_respects_time_zone() {
        // 2025-01-15 02:00 UTC is still 2025-01-14 in New York.
        let now = NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(2, 0, 0)
            .unwrap()
            .and_utc();
        let clock = FixedClock::new(now);
        assert_eq!(
            clock.today_in(chrono_tz::Tz::America__New_York),
            NaiveDate::from_ymd_opt(2025, 1, 14).unwrap()
        );
    }

    #[test]
    fn test_system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.now_utc();
        let b = clock.now_utc();
        assert!(b >= a);
    }
}
