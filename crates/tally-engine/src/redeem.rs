//! Catalog redemption.

use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use tally_clock::DayKey;
use tally_db::DbError;
use tally_types::catalog::RewardStatus;
use tally_types::transaction::TxType;

use crate::{catalog, ledger, notify, EngineError, Result};

/// A completed redemption.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redemption {
    pub reward_id: u32,
    pub title: String,
    pub points_spent: u64,
    pub new_balance: u64,
}

/// Redeem a catalog reward, debiting its cost.
///
/// Fails closed: an unknown, unredeemable, or unaffordable reward
/// leaves the balance and the log untouched.
pub fn redeem(
    conn: &mut Connection,
    user_id: &str,
    reward_id: u32,
    today: DayKey,
    now: u64,
) -> Result<Redemption> {
    let entry = catalog::find(reward_id).ok_or(EngineError::UnknownReward(reward_id))?;
    if entry.base_status == RewardStatus::ComingSoon {
        return Err(EngineError::NotRedeemable(reward_id));
    }

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(DbError::Sqlite)?;

    let new_balance = ledger::debit(&tx, user_id, TxType::Redemption, entry.points_cost, today, now)?;
    notify::reward_redeemed(&tx, user_id, entry.title, entry.points_cost, now)?;

    tx.commit()
        .map_err(|e| EngineError::PartialFailure(e.to_string()))?;

    tracing::info!(user_id, reward_id, points = entry.points_cost, "reward redeemed");

    Ok(Redemption {
        reward_id,
        title: entry.title.to_string(),
        points_spent: entry.points_cost,
        new_balance,
    })
}
