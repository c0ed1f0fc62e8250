//! Transaction log query functions.
//!
//! The log is append-only: there is no update or delete here, and the
//! schema has no path that mutates a row once written.

use rusqlite::Connection;
use tally_clock::DayKey;

use crate::{DbError, Result};

/// Append a transaction. Returns the new row id.
pub fn append(
    conn: &Connection,
    user_id: &str,
    tx_type: &str,
    points_delta: i64,
    occurred_on: DayKey,
    created_at: u64,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO transactions (user_id, tx_type, points_delta, occurred_on, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            user_id,
            tx_type,
            points_delta,
            occurred_on.to_string(),
            created_at as i64,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// List a user's transactions, most recent first.
pub fn list_for_user(conn: &Connection, user_id: &str, limit: u32) -> Result<Vec<TxRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, tx_type, points_delta, occurred_on, created_at
         FROM transactions WHERE user_id = ?1
         ORDER BY created_at DESC, id DESC LIMIT ?2",
    )?;

    let raw = stmt
        .query_map(rusqlite::params![user_id, limit], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)? as u64,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(|(id, user_id, tx_type, points_delta, occurred_on, created_at)| {
            Ok(TxRow {
                id,
                user_id,
                tx_type,
                points_delta,
                occurred_on: parse_day(&occurred_on)?,
                created_at,
            })
        })
        .collect()
}

/// Sum of all signed deltas for a user. Zero when there are no rows.
pub fn sum_deltas(conn: &Connection, user_id: &str) -> Result<i64> {
    let sum: i64 = conn.query_row(
        "SELECT COALESCE(SUM(points_delta), 0) FROM transactions WHERE user_id = ?1",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(sum)
}

fn parse_day(s: &str) -> Result<DayKey> {
    s.parse()
        .map_err(|e| DbError::Corrupt(format!("bad day key: {e}")))
}

/// A raw transaction row.
#[derive(Debug)]
pub struct TxRow {
    pub id: i64,
    pub user_id: String,
    pub tx_type: String,
    pub points_delta: i64,
    pub occurred_on: DayKey,
    pub created_at: u64,
}
