//! # Clock
//!
//! The only source of "today" in Rentwise.
//!
//! Callers read the clock once per evaluation pass (one request, one sweep)
//! and hand the resulting date to every status computation in that pass, so
//! all leases are judged against the same day.

use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};

/// A source of the current date and time.
pub trait Clock: Send + Sync {
    /// Current calendar date used for lease evaluation.
    fn today(&self) -> NaiveDate;

    /// Current instant, used to timestamp activity entries.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock. "Today" follows the host's local calendar.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Frozen at midnight UTC on `date`.
    #[must_use]
    pub fn on(date: NaiveDate) -> Self {
        Self::new(date.and_time(NaiveTime::MIN).and_utc())
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_reports_its_date() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 28).expect("date");
        let clock = FixedClock::on(date);
        assert_eq!(clock.today(), date);
        assert_eq!(clock.now().date_naive(), date);
    }
}
