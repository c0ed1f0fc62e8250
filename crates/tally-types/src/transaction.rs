//! The append-only transaction log row.

use serde::{Deserialize, Serialize};
use tally_clock::DayKey;

use crate::{RowId, UserId};

/// Kind of point-affecting event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxType {
    /// Daily check-in claim credit.
    DailyReward,
    /// Referral bonus credit to a referrer.
    ReferralBonus,
    /// Catalog reward redemption debit.
    Redemption,
}

impl TxType {
    /// Stable string form, as stored in the `transactions` table.
    pub fn as_str(self) -> &'static str {
        match self {
            TxType::DailyReward => "daily_reward",
            TxType::ReferralBonus => "referral_bonus",
            TxType::Redemption => "redemption",
        }
    }

    /// Parse the stored string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily_reward" => Some(TxType::DailyReward),
            "referral_bonus" => Some(TxType::ReferralBonus),
            "redemption" => Some(TxType::Redemption),
            _ => None,
        }
    }
}

/// One point-affecting event. Immutable once written; the signed deltas
/// for a user always sum to that user's balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: RowId,
    pub user_id: UserId,
    pub tx_type: TxType,
    /// Signed point delta: positive for credits, negative for debits.
    pub points_delta: i64,
    /// Calendar day the event was accounted against.
    pub occurred_on: DayKey,
    /// Unix timestamp of the append.
    pub created_at: u64,
}
