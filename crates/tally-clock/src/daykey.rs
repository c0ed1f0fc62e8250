//! The `DayKey` calendar-day type.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// A calendar date truncated to day granularity, the unit of claim
/// eligibility. Two claims fall on the same day iff their `DayKey`s
/// compare equal.
///
/// Serializes (and displays) as `YYYY-MM-DD`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DayKey(NaiveDate);

impl DayKey {
    /// Wrap a calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Build from year/month/day. `None` for invalid dates.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// The previous calendar day.
    ///
    /// Saturates at the calendar's lower bound rather than wrapping.
    pub fn day_before(self) -> Self {
        Self(self.0.pred_opt().unwrap_or(self.0))
    }

    /// The next calendar day. Saturates at the calendar's upper bound.
    pub fn day_after(self) -> Self {
        Self(self.0.succ_opt().unwrap_or(self.0))
    }

    /// Step back `n` calendar days, saturating.
    pub fn days_before(self, n: u64) -> Self {
        Self(self.0.checked_sub_days(Days::new(n)).unwrap_or(self.0))
    }

    /// Weekday slot index, Monday = 0 .. Sunday = 6.
    pub fn weekday_index(self) -> usize {
        self.0.weekday().num_days_from_monday() as usize
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Error parsing a `YYYY-MM-DD` day key.
#[derive(Debug, thiserror::Error)]
#[error("invalid day key: {0:?}")]
pub struct ParseDayKeyError(String);

impl FromStr for DayKey {
    type Err = ParseDayKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| ParseDayKeyError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> DayKey {
        s.parse().expect("valid day key")
    }

    #[test]
    fn test_display_round_trip() {
        let key = day("2025-03-09");
        assert_eq!(key.to_string(), "2025-03-09");
        assert_eq!(day(&key.to_string()), key);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!("not-a-date".parse::<DayKey>().is_err());
        assert!("2025-13-01".parse::<DayKey>().is_err());
        assert!("".parse::<DayKey>().is_err());
    }

    #[test]
    fn test_day_before_crosses_month_and_year() {
        assert_eq!(day("2025-03-01").day_before(), day("2025-02-28"));
        assert_eq!(day("2024-03-01").day_before(), day("2024-02-29")); // leap year
        assert_eq!(day("2025-01-01").day_before(), day("2024-12-31"));
    }

    #[test]
    fn test_day_after_inverts_day_before() {
        let key = day("2025-06-15");
        assert_eq!(key.day_before().day_after(), key);
    }

    #[test]
    fn test_days_before() {
        assert_eq!(day("2025-01-10").days_before(3), day("2025-01-07"));
        assert_eq!(day("2025-01-10").days_before(0), day("2025-01-10"));
    }

    #[test]
    fn test_ordering() {
        assert!(day("2025-01-01") < day("2025-01-02"));
        assert!(day("2024-12-31") < day("2025-01-01"));
    }

    #[test]
    fn test_weekday_index_monday_zero() {
        assert_eq!(day("2024-01-01").weekday_index(), 0); // Monday
        assert_eq!(day("2024-01-06").weekday_index(), 5); // Saturday
        assert_eq!(day("2024-01-07").weekday_index(), 6); // Sunday
    }

    #[test]
    fn test_serde_as_plain_string() {
        let key = day("2025-03-09");
        let json = serde_json::to_string(&key).expect("serialize");
        assert_eq!(json, "\"2025-03-09\"");
        let back: DayKey = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, key);
    }
}
