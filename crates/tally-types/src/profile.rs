//! Profile and streak structures.

use serde::{Deserialize, Serialize};
use tally_clock::DayKey;

use crate::UserId;

/// A user's rewards profile. One row per user, created lazily on first
/// authenticated access.
///
/// `points` is authoritative and only ever changes through ledger
/// credit/debit deltas; it never goes negative.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub email: String,
    /// Current points balance. Non-negative.
    pub points: u64,
    /// Unique short token handed out in referral links.
    pub referral_code: String,
    /// Signups attributed to this user's code.
    pub referral_count: u32,
    /// Lifetime points earned from referral bonuses.
    pub referral_points: u64,
    /// Unix timestamp of profile creation.
    pub created_at: u64,
}

/// Consecutive-day claim state. One row per user, alongside [`Profile`].
///
/// `last_claim_date`, when present, never exceeds today's day key;
/// `current_streak` is 0 until the first claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub user_id: UserId,
    pub current_streak: u32,
    pub last_claim_date: Option<DayKey>,
}
