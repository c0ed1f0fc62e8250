//! The aggregated per-user rewards view.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tally_clock::DayKey;
use tally_types::GOAL_POINTS;

use crate::{profile, streak, Result};

/// Everything a rewards surface needs in one read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardsSummary {
    pub points: u64,
    /// Progress target: the cheapest catalog reward.
    pub goal_points: u64,
    /// Normalized streak: 0 unless the run is still alive.
    pub current_streak: u32,
    pub claimed_today: bool,
    /// Monday-first weekday strip covered by the current run.
    pub active_days: [bool; 7],
    pub referral_code: String,
    pub referral_link: String,
    pub referral_count: u32,
    pub referral_points: u64,
}

/// Assemble the summary for one user. Read-only: a stale streak reads
/// as 0 here but is reset in the store only by the next claim.
pub fn rewards_summary(
    conn: &Connection,
    user_id: &str,
    today: DayKey,
    link_base: &str,
) -> Result<RewardsSummary> {
    let profile = profile::get(conn, user_id)?;
    let state = streak::read_state(conn, user_id)?;

    let current_streak = streak::display_streak(&state, today);
    let claimed_today = state.last_claim_date == Some(today);
    let referral_link = profile::referral_link(link_base, &profile.referral_code);

    Ok(RewardsSummary {
        points: profile.points,
        goal_points: GOAL_POINTS,
        current_streak,
        claimed_today,
        active_days: streak::active_days(current_streak, today),
        referral_code: profile.referral_code,
        referral_link,
        referral_count: profile.referral_count,
        referral_points: profile.referral_points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streak::claim_daily;
    use tally_types::DAILY_POINTS;

    const BASE: &str = "https://tally.example";

    fn test_db() -> Connection {
        let conn = tally_db::open_memory().expect("open test db");
        profile::ensure(&conn, "u1", "a@example.com", 1000).expect("profile");
        conn
    }

    fn day(s: &str) -> DayKey {
        s.parse().expect("day key")
    }

    #[test]
    fn test_fresh_user_summary() {
        let conn = test_db();
        let summary = rewards_summary(&conn, "u1", day("2025-03-14"), BASE).expect("summary");

        assert_eq!(summary.points, 0);
        assert_eq!(summary.goal_points, GOAL_POINTS);
        assert_eq!(summary.current_streak, 0);
        assert!(!summary.claimed_today);
        assert_eq!(summary.active_days, [false; 7]);
        assert_eq!(summary.referral_count, 0);
        assert!(summary
            .referral_link
            .ends_with(&format!("/signup?ref={}", summary.referral_code)));
    }

    #[test]
    fn test_summary_after_a_claim() {
        let mut conn = test_db();
        let today = day("2025-03-14"); // a Friday
        claim_daily(&mut conn, "u1", today, 100).expect("claim");

        let summary = rewards_summary(&conn, "u1", today, BASE).expect("summary");
        assert_eq!(summary.points, DAILY_POINTS);
        assert_eq!(summary.current_streak, 1);
        assert!(summary.claimed_today);
        // Friday slot only
        assert_eq!(
            summary.active_days,
            [false, false, false, false, true, false, false]
        );
    }

    #[test]
    fn test_stale_streak_reads_as_zero_without_mutation() {
        let mut conn = test_db();
        claim_daily(&mut conn, "u1", day("2025-03-10"), 100).expect("claim");

        let summary = rewards_summary(&conn, "u1", day("2025-03-14"), BASE).expect("summary");
        assert_eq!(summary.current_streak, 0);
        assert!(!summary.claimed_today);

        // The stored counter is untouched; only the next claim resets it
        let row = tally_db::queries::streaks::get(&conn, "u1").expect("row");
        assert_eq!(row.current_streak, 1);
    }

    #[test]
    fn test_yesterday_claim_keeps_the_run_alive() {
        let mut conn = test_db();
        claim_daily(&mut conn, "u1", day("2025-03-13"), 100).expect("claim");

        let summary = rewards_summary(&conn, "u1", day("2025-03-14"), BASE).expect("summary");
        assert_eq!(summary.current_streak, 1);
        assert!(!summary.claimed_today);
    }
}
