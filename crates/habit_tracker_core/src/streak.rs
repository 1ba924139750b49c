//! crates/habit_tracker_core/src/streak.rs
//!
//! The streak calculator. Converts the completion timestamps of one habit into
//! a current and a longest streak of consecutive calendar days.
//!
//! The calculator is a pure function of its input and a caller-supplied "now":
//! it never reads the system clock and keeps no state between calls, so it can
//! be shared freely across request handlers.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::collections::BTreeSet;
use std::fmt;

//=========================================================================================
// Types
//=========================================================================================

/// A calendar day (no time-of-day) on which a habit was completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompletionDate(NaiveDate);

impl CompletionDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Number of whole days from `earlier` to `self`.
    pub fn days_since(&self, earlier: CompletionDate) -> i64 {
        (self.0 - earlier.0).num_days()
    }
}

impl From<NaiveDate> for CompletionDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for CompletionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// The outcome of a streak computation.
///
/// `longest >= current` always holds, and both are zero only for an empty history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreakResult {
    pub current: u32,
    pub longest: u32,
}

impl StreakResult {
    pub const ZERO: StreakResult = StreakResult { current: 0, longest: 0 };
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StreakError {
    #[error("Invalid completion timestamp at position {index}: '{value}'")]
    InvalidInput { index: usize, value: String },
}

//=========================================================================================
// StreakCalculator
//=========================================================================================

/// Computes streaks with every timestamp truncated to a day in one reference zone.
#[derive(Debug, Clone, Copy)]
pub struct StreakCalculator {
    tz: Tz,
}

impl Default for StreakCalculator {
    fn default() -> Self {
        Self::utc()
    }
}

impl StreakCalculator {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn utc() -> Self {
        Self { tz: Tz::UTC }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Truncates a timestamp to its calendar day in the reference zone.
    pub fn day_of(&self, timestamp: &DateTime<Utc>) -> CompletionDate {
        CompletionDate(timestamp.with_timezone(&self.tz).date_naive())
    }

    /// The first instant of `day` in the reference zone, expressed in UTC.
    ///
    /// `day_of(start_of(day)) == day` holds in every zone.
    pub fn start_of(&self, day: CompletionDate) -> DateTime<Utc> {
        let midnight = day.0.and_time(NaiveTime::MIN);
        // A DST gap can swallow local midnight; take the first hour after it.
        (0..24)
            .map(|hour| midnight + Duration::hours(hour))
            .find_map(|local| self.tz.from_local_datetime(&local).earliest())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
    }

    /// Computes the current and longest streak for a set of completion timestamps.
    ///
    /// The input may be in any order and may contain several timestamps on the
    /// same day; it is only read.
    pub fn compute(&self, timestamps: &[DateTime<Utc>], now: DateTime<Utc>) -> StreakResult {
        let days = timestamps.iter().map(|ts| self.day_of(ts));
        Self::compute_days(days, self.day_of(&now))
    }

    /// Validates textual timestamps, then computes as [`StreakCalculator::compute`].
    ///
    /// Every entry must be an RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
    /// The first entry that is neither is reported and nothing is computed.
    pub fn compute_raw<S: AsRef<str>>(
        &self,
        raw: &[S],
        now: DateTime<Utc>,
    ) -> Result<StreakResult, StreakError> {
        let timestamps = raw
            .iter()
            .enumerate()
            .map(|(index, value)| {
                self.parse_completion(value.as_ref())
                    .map_err(|_| StreakError::InvalidInput {
                        index,
                        value: value.as_ref().to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.compute(&timestamps, now))
    }

    /// Parses one completion timestamp. A bare date means midnight in the reference zone.
    pub fn parse_completion(&self, value: &str) -> Result<DateTime<Utc>, StreakError> {
        let value = value.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Ok(dt.with_timezone(&Utc));
        }
        if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            return Ok(self.start_of(CompletionDate(date)));
        }
        Err(StreakError::InvalidInput {
            index: 0,
            value: value.to_string(),
        })
    }

    /// Day-level streak computation.
    ///
    /// Duplicates collapse, days are walked oldest first, and the run that ends
    /// on the most recent day counts as current only when that day is today or
    /// yesterday. A lapsed run reports a current streak of zero.
    pub fn compute_days<I>(days: I, today: CompletionDate) -> StreakResult
    where
        I: IntoIterator<Item = CompletionDate>,
    {
        let days: BTreeSet<CompletionDate> = days.into_iter().collect();

        let mut iter = days.iter();
        let Some(&first) = iter.next() else {
            return StreakResult::ZERO;
        };

        let mut run = 1u32;
        let mut longest = 1u32;
        let mut previous = first;

        for &day in iter {
            if day.days_since(previous) == 1 {
                run += 1;
                longest = longest.max(run);
            } else {
                run = 1;
            }
            previous = day;
        }

        // `previous` is now the most recent completion.
        let alive = today.days_since(previous) <= 1;

        StreakResult {
            current: if alive { run } else { 0 },
            longest,
        }
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day(offset: i64) -> CompletionDate {
        let base = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        CompletionDate(base + Duration::days(offset))
    }

    fn at(offset: i64, hour: u32) -> DateTime<Utc> {
        let d = day(offset).date().and_hms_opt(hour, 15, 0).unwrap();
        Utc.from_utc_datetime(&d)
    }

    #[test]
    fn empty_input_yields_zero() {
        let calc = StreakCalculator::utc();
        assert_eq!(calc.compute(&[], at(0, 12)), StreakResult::ZERO);
    }

    #[test]
    fn single_completion_today() {
        let calc = StreakCalculator::utc();
        let result = calc.compute(&[at(5, 8)], at(5, 20));
        assert_eq!(result, StreakResult { current: 1, longest: 1 });
    }

    #[test]
    fn consecutive_days_ending_today() {
        let calc = StreakCalculator::utc();
        let result = calc.compute(&[at(0, 9), at(1, 9), at(2, 9)], at(2, 23));
        assert_eq!(result, StreakResult { current: 3, longest: 3 });
    }

    #[test]
    fn gap_resets_the_running_streak() {
        let calc = StreakCalculator::utc();
        let result = calc.compute(&[at(0, 9), at(1, 9), at(5, 9)], at(5, 10));
        assert_eq!(result, StreakResult { current: 1, longest: 2 });
    }

    #[test]
    fn lapsed_streak_reports_zero_current() {
        let calc = StreakCalculator::utc();
        let result = calc.compute(&[at(0, 9)], at(5, 9));
        assert_eq!(result, StreakResult { current: 0, longest: 1 });
    }

    #[test]
    fn streak_ending_yesterday_is_still_alive() {
        let calc = StreakCalculator::utc();
        let result = calc.compute(&[at(3, 9), at(4, 9)], at(5, 0));
        assert_eq!(result, StreakResult { current: 2, longest: 2 });
    }

    #[test]
    fn same_day_timestamps_are_deduplicated() {
        let calc = StreakCalculator::utc();
        let input = [at(1, 23), at(0, 1), at(1, 2), at(0, 22), at(1, 12)];
        let result = calc.compute(&input, at(1, 23));
        assert_eq!(result, StreakResult { current: 2, longest: 2 });
    }

    #[test]
    fn input_is_left_untouched() {
        let calc = StreakCalculator::utc();
        let input = vec![at(2, 1), at(0, 1), at(1, 1)];
        let snapshot = input.clone();
        let first = calc.compute(&input, at(2, 5));
        let second = calc.compute(&input, at(2, 5));
        assert_eq!(input, snapshot);
        assert_eq!(first, second);
    }

    #[test]
    fn longest_run_can_precede_current_run() {
        let calc = StreakCalculator::utc();
        let input = [at(0, 1), at(1, 1), at(2, 1), at(3, 1), at(7, 1), at(8, 1)];
        let result = calc.compute(&input, at(8, 1));
        assert_eq!(result, StreakResult { current: 2, longest: 4 });
    }

    #[test]
    fn truncation_uses_the_reference_zone() {
        // 02:00 UTC on day 1 is still the evening of day 0 in New York.
        let calc = StreakCalculator::new(chrono_tz::America::New_York);
        assert_eq!(calc.day_of(&at(1, 2)), day(0));

        let result = calc.compute(&[at(0, 18), at(1, 2)], at(1, 12));
        assert_eq!(result, StreakResult { current: 1, longest: 1 });
    }

    #[test]
    fn start_of_round_trips_through_day_of() {
        let calc = StreakCalculator::new(chrono_tz::Asia::Tokyo);
        let start = calc.start_of(day(10));
        assert_eq!(calc.day_of(&start), day(10));
    }

    #[test]
    fn start_of_skips_a_midnight_dst_gap() {
        // Santiago springs forward from 00:00 to 01:00 on 2024-09-08.
        let calc = StreakCalculator::new(chrono_tz::America::Santiago);
        let gap_day = CompletionDate::new(NaiveDate::from_ymd_opt(2024, 9, 8).unwrap());
        let eve = CompletionDate::new(NaiveDate::from_ymd_opt(2024, 9, 7).unwrap());

        let start = calc.start_of(gap_day);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 9, 8, 4, 0, 0).unwrap());
        assert_eq!(calc.day_of(&start), gap_day);

        let now = Utc.with_ymd_and_hms(2024, 9, 9, 15, 0, 0).unwrap();
        let result = calc.compute(&[calc.start_of(eve), start], now);
        assert_eq!(result, StreakResult { current: 2, longest: 2 });
    }

    #[test]
    fn raw_input_accepts_rfc3339_and_bare_dates() {
        let calc = StreakCalculator::utc();
        let raw = ["2024-03-01", "2024-03-02T07:30:00Z", "2024-03-03T23:00:00+00:00"];
        let result = calc.compute_raw(&raw, at(2, 12)).unwrap();
        assert_eq!(result, StreakResult { current: 3, longest: 3 });
    }

    #[test]
    fn raw_input_rejects_malformed_values() {
        let calc = StreakCalculator::utc();
        let raw = ["2024-03-01", "yesterday", "2024-03-02"];
        let err = calc.compute_raw(&raw, at(2, 12)).unwrap_err();
        assert_eq!(
            err,
            StreakError::InvalidInput {
                index: 1,
                value: "yesterday".to_string()
            }
        );
    }

    #[test]
    fn raw_empty_input_is_not_an_error() {
        let calc = StreakCalculator::utc();
        let raw: [&str; 0] = [];
        assert_eq!(calc.compute_raw(&raw, at(0, 0)).unwrap(), StreakResult::ZERO);
    }

    #[test]
    fn completion_date_displays_as_iso_day() {
        assert_eq!(day(0).to_string(), "2024-03-01");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn n_consecutive_days_ending_today(n in 1i64..60) {
                let days: Vec<_> = (0..n).map(day).collect();
                let result = StreakCalculator::compute_days(days, day(n - 1));
                prop_assert_eq!(result, StreakResult { current: n as u32, longest: n as u32 });
            }

            #[test]
            fn n_consecutive_days_that_lapsed(n in 1i64..60, idle in 2i64..30) {
                let days: Vec<_> = (0..n).map(day).collect();
                let result = StreakCalculator::compute_days(days, day(n - 1 + idle));
                prop_assert_eq!(result, StreakResult { current: 0, longest: n as u32 });
            }

            #[test]
            fn order_and_duplicates_do_not_matter(
                offsets in proptest::collection::vec(0i64..40, 0..50),
                today in 0i64..45,
            ) {
                let forward: Vec<_> = offsets.iter().copied().map(day).collect();
                let mut shuffled = forward.clone();
                shuffled.reverse();
                shuffled.extend(forward.iter().copied());

                let a = StreakCalculator::compute_days(forward, day(today));
                let b = StreakCalculator::compute_days(shuffled, day(today));
                prop_assert_eq!(a, b);
            }

            #[test]
            fn longest_never_below_current(
                offsets in proptest::collection::vec(0i64..40, 0..50),
                today in 0i64..45,
            ) {
                let empty = offsets.is_empty();
                let result = StreakCalculator::compute_days(offsets.into_iter().map(day), day(today));
                prop_assert!(result.longest >= result.current);
                prop_assert_eq!(empty, result.longest == 0);
            }
        }
    }
}
