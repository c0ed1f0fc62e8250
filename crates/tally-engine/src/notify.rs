//! Durable user-visible notifications.
//!
//! Emission happens inside the same store transaction as the ledger
//! write that triggered it, so any operation that reported success is
//! already visible through [`list`].

use rusqlite::Connection;
use tally_db::queries;
use tally_types::notification::Notification;

use crate::Result;

/// Notification kinds, mirroring the transaction types.
pub mod kind {
    pub const DAILY_REWARD: &str = "daily_reward";
    pub const REFERRAL_BONUS: &str = "referral_bonus";
    pub const REDEMPTION: &str = "redemption";
}

/// In-app destination reward notifications point at.
const REWARDS_URL: &str = "/rewards";

/// Announce a successful daily claim.
pub fn daily_claimed(conn: &Connection, user_id: &str, points: u64, now: u64) -> Result<i64> {
    let message = format!("You earned {points} points for your daily streak. Keep it going!");
    let id = queries::notifications::insert(
        conn,
        user_id,
        kind::DAILY_REWARD,
        "Daily Reward Claimed! 🎉",
        &message,
        REWARDS_URL,
        now,
    )?;
    Ok(id)
}

/// Announce a referral payout to the referrer.
pub fn referral_qualified(conn: &Connection, user_id: &str, points: u64, now: u64) -> Result<i64> {
    let message =
        format!("You earned {points} points for referring a friend. Share your link to earn more!");
    let id = queries::notifications::insert(
        conn,
        user_id,
        kind::REFERRAL_BONUS,
        "Referral Bonus! 🎉",
        &message,
        REWARDS_URL,
        now,
    )?;
    Ok(id)
}

/// Announce a catalog redemption.
pub fn reward_redeemed(
    conn: &Connection,
    user_id: &str,
    title: &str,
    points: u64,
    now: u64,
) -> Result<i64> {
    let message = format!("You redeemed {title} for {points} points.");
    let id = queries::notifications::insert(
        conn,
        user_id,
        kind::REDEMPTION,
        "Reward Redeemed! 🎉",
        &message,
        REWARDS_URL,
        now,
    )?;
    Ok(id)
}

/// A user's notifications, newest first.
pub fn list(conn: &Connection, user_id: &str, limit: u32) -> Result<Vec<Notification>> {
    let rows = queries::notifications::list_for_user(conn, user_id, limit)?;
    Ok(rows
        .into_iter()
        .map(|row| Notification {
            id: row.id,
            user_id: row.user_id,
            kind: row.kind,
            title: row.title,
            message: row.message,
            target_url: row.target_url,
            read: row.read,
            created_at: row.created_at,
        })
        .collect())
}

/// Mark one notification read. Returns `false` when the id is unknown
/// or owned by another user; re-marking a read one succeeds.
pub fn mark_read(conn: &Connection, user_id: &str, notification_id: i64) -> Result<bool> {
    Ok(queries::notifications::mark_read(conn, user_id, notification_id)?)
}

/// Mark everything read. Returns how many rows flipped.
pub fn mark_all_read(conn: &Connection, user_id: &str) -> Result<u32> {
    Ok(queries::notifications::mark_all_read(conn, user_id)?)
}

/// Delete all of a user's notifications. Returns how many were removed.
pub fn delete_all(conn: &Connection, user_id: &str) -> Result<u32> {
    Ok(queries::notifications::delete_all(conn, user_id)?)
}

/// Count unread notifications.
pub fn unread_count(conn: &Connection, user_id: &str) -> Result<u32> {
    Ok(queries::notifications::unread_count(conn, user_id)?)
}
