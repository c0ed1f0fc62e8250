//! # tally-clock
//!
//! Calendar-day resolution for claim eligibility.
//!
//! All claim accounting is keyed by a [`DayKey`]: a calendar date at a
//! caller-supplied UTC offset, collapsed to day granularity. Deriving
//! "today" and "yesterday" happens here and nowhere else, so every call
//! site sees identical day-boundary behavior around midnight and DST
//! transitions.

pub mod daykey;

pub use daykey::DayKey;

use chrono::{FixedOffset, Offset, Utc};

/// Widest legal UTC offset, in minutes (UTC±23:59).
pub const MAX_UTC_OFFSET_MINUTES: i32 = 23 * 60 + 59;

/// Resolve the current calendar day at the given UTC offset.
///
/// `offset_minutes` is minutes east of UTC (+120 for UTC+2, -300 for
/// UTC-5). Out-of-range offsets are clamped to the legal range.
pub fn today(offset_minutes: i32) -> DayKey {
    let clamped = offset_minutes.clamp(-MAX_UTC_OFFSET_MINUTES, MAX_UTC_OFFSET_MINUTES);
    let offset = FixedOffset::east_opt(clamped * 60).unwrap_or_else(|| Utc.fix());
    DayKey::from_date(Utc::now().with_timezone(&offset).date_naive())
}

/// Current Unix time in seconds.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_today_utc_is_well_formed() {
        let key = today(0);
        let parsed: DayKey = key.to_string().parse().expect("round-trip");
        assert_eq!(parsed, key);
    }

    #[test]
    fn test_today_offsets_differ_by_at_most_two_days() {
        // The international date line spans just under 48 hours.
        let west = today(-MAX_UTC_OFFSET_MINUTES);
        let east = today(MAX_UTC_OFFSET_MINUTES);
        assert!(west <= east);
        assert!(east <= west.day_after().day_after());
    }

    #[test]
    fn test_today_clamps_out_of_range_offsets() {
        // An absurd offset must not panic; it clamps to the legal edge.
        assert_eq!(today(1_000_000), today(MAX_UTC_OFFSET_MINUTES));
        assert_eq!(today(-1_000_000), today(-MAX_UTC_OFFSET_MINUTES));
    }

    #[test]
    fn test_unix_now_is_recent() {
        // Sanity: past 2023-01-01.
        assert!(unix_now() > 1_672_531_200);
    }
}
