//! Delta-only balance accounting.
//!
//! Every balance change flows through [`credit`] or [`debit`], which
//! pair the profile update with a matching append to the transaction
//! log. Operations that combine a balance change with other writes
//! (claim, qualification, redemption) call these inside one store
//! transaction so the pair commits or rolls back as a unit.

use rusqlite::Connection;
use tally_clock::DayKey;
use tally_db::{queries, DbError};
use tally_types::transaction::{Transaction, TxType};

use crate::{map_profile_err, EngineError, Result};

/// Get the current points balance.
pub fn balance(conn: &Connection, user_id: &str) -> Result<u64> {
    queries::profiles::balance(conn, user_id).map_err(|e| map_profile_err(e, user_id))
}

/// Credit points and append the matching log entry.
/// Returns the new balance.
pub fn credit(
    conn: &Connection,
    user_id: &str,
    tx_type: TxType,
    amount: u64,
    day: DayKey,
    now: u64,
) -> Result<u64> {
    if amount == 0 {
        return Err(EngineError::ZeroAmount);
    }
    let new_balance = queries::profiles::add_points(conn, user_id, amount)
        .map_err(|e| map_profile_err(e, user_id))?;
    queries::transactions::append(conn, user_id, tx_type.as_str(), amount as i64, day, now)?;
    Ok(new_balance)
}

/// Debit points if the balance covers the amount, appending the log
/// entry. Returns the new balance.
///
/// Fails closed on [`EngineError::InsufficientBalance`]: no partial
/// debit, no log entry, balance untouched.
pub fn debit(
    conn: &Connection,
    user_id: &str,
    tx_type: TxType,
    amount: u64,
    day: DayKey,
    now: u64,
) -> Result<u64> {
    if amount == 0 {
        return Err(EngineError::ZeroAmount);
    }
    let new_balance = match queries::profiles::try_deduct(conn, user_id, amount)
        .map_err(|e| map_profile_err(e, user_id))?
    {
        Some(balance) => balance,
        None => {
            let available = balance(conn, user_id)?;
            return Err(EngineError::InsufficientBalance {
                required: amount,
                available,
            });
        }
    };
    queries::transactions::append(conn, user_id, tx_type.as_str(), -(amount as i64), day, now)?;
    Ok(new_balance)
}

/// A user's transaction history, most recent first.
pub fn history(conn: &Connection, user_id: &str, limit: u32) -> Result<Vec<Transaction>> {
    let rows = queries::transactions::list_for_user(conn, user_id, limit)?;
    rows.into_iter()
        .map(|row| {
            let tx_type = TxType::parse(&row.tx_type).ok_or_else(|| {
                EngineError::Store(DbError::Corrupt(format!(
                    "unknown tx type '{}'",
                    row.tx_type
                )))
            })?;
            Ok(Transaction {
                id: row.id,
                user_id: row.user_id,
                tx_type,
                points_delta: row.points_delta,
                occurred_on: row.occurred_on,
                created_at: row.created_at,
            })
        })
        .collect()
}
