//! Streak calculation
//!
//! A streak is the number of consecutive calendar days, ending at the most
//! recent completion day, on which at least one task was completed.

use chrono::NaiveDate;
use serde::Serialize;

/// Streak summary for display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreakInfo {
    pub current: u32,
    pub best: u32,
    pub last_activity_day: Option<NaiveDate>,
}

impl StreakInfo {
    pub fn from_days(days: &[NaiveDate]) -> Self {
        let days = normalize(days);
        Self {
            current: run_from_start(&days),
            best: longest_run(&days),
            last_activity_day: days.first().copied(),
        }
    }

    /// Active if the last completion was today or yesterday
    pub fn is_active(&self, today: NaiveDate) -> bool {
        let Some(last) = self.last_activity_day else {
            return false;
        };
        (today - last).num_days() <= 1
    }
}

/// Consecutive days counted back from the most recent completion day.
///
/// Input order and duplicates do not matter.
pub fn current_streak(days: &[NaiveDate]) -> u32 {
    run_from_start(&normalize(days))
}

/// Longest run of consecutive days anywhere in the history
pub fn longest_streak(days: &[NaiveDate]) -> u32 {
    longest_run(&normalize(days))
}

/// Distinct days, most recent first
fn normalize(days: &[NaiveDate]) -> Vec<NaiveDate> {
    let mut days = days.to_vec();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();
    days
}

fn run_from_start(days: &[NaiveDate]) -> u32 {
    if days.is_empty() {
        return 0;
    }
    1 + days
        .windows(2)
        .take_while(|w| (w[0] - w[1]).num_days() == 1)
        .count() as u32
}

fn longest_run(days: &[NaiveDate]) -> u32 {
    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;
    for &day in days {
        run = match prev {
            Some(p) if (p - day).num_days() == 1 => run + 1,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(day);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_consecutive_days() {
        let days = [d("2024-03-03"), d("2024-03-02"), d("2024-03-01")];
        assert_eq!(current_streak(&days), 3);
    }

    #[test]
    fn test_gap_stops_streak() {
        let days = [d("2024-03-03"), d("2024-03-01")];
        assert_eq!(current_streak(&days), 1);
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(current_streak(&[]), 0);
        assert_eq!(current_streak(&[d("2024-02-29")]), 1);
    }

    #[test]
    fn test_unsorted_with_duplicates() {
        let days = [
            d("2024-02-28"),
            d("2024-03-01"),
            d("2024-02-29"),
            d("2024-03-01"),
        ];
        assert_eq!(current_streak(&days), 3);
    }

    #[test]
    fn test_month_and_year_boundaries() {
        let days = [d("2024-01-01"), d("2023-12-31"), d("2023-12-30")];
        assert_eq!(current_streak(&days), 3);
    }

    #[test]
    fn test_longest_streak_in_history() {
        let days = [
            d("2024-03-10"),
            d("2024-03-05"),
            d("2024-03-04"),
            d("2024-03-03"),
            d("2024-03-02"),
            d("2024-02-20"),
        ];
        assert_eq!(current_streak(&days), 1);
        assert_eq!(longest_streak(&days), 4);

        let info = StreakInfo::from_days(&days);
        assert_eq!(info.current, 1);
        assert_eq!(info.best, 4);
        assert_eq!(info.last_activity_day, Some(d("2024-03-10")));
        assert!(info.is_active(d("2024-03-11")));
        assert!(!info.is_active(d("2024-03-12")));
    }
}
