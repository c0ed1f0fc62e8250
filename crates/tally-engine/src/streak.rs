//! Daily claim streaks.
//!
//! One claim per calendar day. Claiming on consecutive days grows the
//! streak; a gap resets it to 1 on the next claim. The day-key equality
//! check is the sole duplicate guard, which makes the whole operation
//! idempotent per day.

use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use tally_clock::DayKey;
use tally_db::{queries, DbError};
use tally_types::profile::StreakState;
use tally_types::transaction::TxType;
use tally_types::DAILY_POINTS;

use crate::{ledger, notify, profile, EngineError, Result};

/// Outcome of a daily claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClaimOutcome {
    /// The claim landed: the streak advanced and points were credited.
    Claimed { new_streak: u32, points_awarded: u64 },
    /// Today was already claimed. Nothing changed; retrying is safe.
    AlreadyClaimed,
}

/// Streak value a claim today would produce: yesterday's claim
/// continues the run, anything older (or none) starts over at 1.
pub fn next_streak(state: &StreakState, today: DayKey) -> u32 {
    match state.last_claim_date {
        Some(last) if last == today.day_before() => state.current_streak.saturating_add(1),
        _ => 1,
    }
}

/// Streak value for display: a run is only alive if the last claim was
/// today or yesterday, otherwise it reads as 0. Never mutates state;
/// the stored counter is reset only by the next claim.
pub fn display_streak(state: &StreakState, today: DayKey) -> u32 {
    match state.last_claim_date {
        Some(last) if last == today || last == today.day_before() => state.current_streak,
        _ => 0,
    }
}

/// Which of the 7 weekday slots (Monday first) the current run covers:
/// the most recent `min(streak, 7)` slots ending today.
pub fn active_days(streak: u32, today: DayKey) -> [bool; 7] {
    let today_idx = today.weekday_index() as i64;
    let span = streak.min(7);
    let mut days = [false; 7];
    for (i, slot) in days.iter_mut().enumerate() {
        let back = (today_idx - i as i64).rem_euclid(7) as u32;
        *slot = back < span;
    }
    days
}

/// Read a user's streak state. Users with no row yet read as zero.
pub fn read_state(conn: &Connection, user_id: &str) -> Result<StreakState> {
    match queries::streaks::get(conn, user_id) {
        Ok(row) => Ok(StreakState {
            user_id: row.user_id,
            current_streak: row.current_streak,
            last_claim_date: row.last_claim_date,
        }),
        Err(DbError::NotFound(_)) => Ok(StreakState {
            user_id: user_id.to_string(),
            current_streak: 0,
            last_claim_date: None,
        }),
        Err(e) => Err(e.into()),
    }
}

/// Claim the daily reward for `today`.
///
/// The streak write, ledger credit, log append, and notification commit
/// as one unit. A repeat claim for the same day returns
/// [`ClaimOutcome::AlreadyClaimed`] before anything is written.
pub fn claim_daily(
    conn: &mut Connection,
    user_id: &str,
    today: DayKey,
    now: u64,
) -> Result<ClaimOutcome> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(DbError::Sqlite)?;

    // The streak row references the profile; fail cleanly if it is gone
    profile::get(&tx, user_id)?;

    let state = read_state(&tx, user_id)?;
    if state.last_claim_date == Some(today) {
        return Ok(ClaimOutcome::AlreadyClaimed); // tx drops with nothing written
    }

    let new_streak = next_streak(&state, today);
    queries::streaks::record_claim(&tx, user_id, new_streak, today)?;
    ledger::credit(&tx, user_id, TxType::DailyReward, DAILY_POINTS, today, now)?;
    notify::daily_claimed(&tx, user_id, DAILY_POINTS, now)?;

    tx.commit()
        .map_err(|e| EngineError::PartialFailure(e.to_string()))?;

    tracing::info!(user_id, new_streak, points = DAILY_POINTS, "daily reward claimed");

    Ok(ClaimOutcome::Claimed {
        new_streak,
        points_awarded: DAILY_POINTS,
    })
}
