//! Time source and day bucketing
//!
//! All components take an injected [`Clock`] so lockout windows and day
//! boundaries are deterministic under test.
//! - Day buckets: "YYYY-MM-DD" (UTC) for per-day riddles, hints and streaks

use std::sync::Mutex;

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current Unix timestamp in milliseconds
    fn now_ms(&self) -> i64 {
        self.now().timestamp_millis()
    }

    /// Today's calendar day (UTC)
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests and replays
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Start at midnight UTC of the given day
    pub fn at_day(day: NaiveDate) -> Self {
        Self::new(day.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().expect("clock lock poisoned") = to;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock poisoned");
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock poisoned")
    }
}

/// Compute the day bucket string from a Unix timestamp in milliseconds.
///
/// Returns a string in format "YYYY-MM-DD".
pub fn day_bucket(timestamp_ms: i64) -> String {
    let dt = DateTime::from_timestamp_millis(timestamp_ms).unwrap_or_default();
    format_day(dt.date_naive())
}

pub fn format_day(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Parse a day bucket back into a date
pub fn parse_day(bucket: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(bucket, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_bucket() {
        // 2023-12-28 12:34:56 UTC
        let ts = 1703766896000i64;
        assert_eq!(day_bucket(ts), "2023-12-28");
    }

    #[test]
    fn test_parse_day() {
        let day = parse_day("2024-03-01").unwrap();
        assert_eq!(format_day(day), "2024-03-01");
        assert!(parse_day("2024-13-01").is_none());
        assert!(parse_day("yesterday").is_none());
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::at_day(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(format_day(clock.today()), "2024-01-01");

        clock.advance(Duration::hours(25));
        assert_eq!(format_day(clock.today()), "2024-01-02");
        assert_eq!(day_bucket(clock.now_ms()), "2024-01-02");
    }
}
