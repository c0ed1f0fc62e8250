//! Daily streak query functions.

use rusqlite::Connection;
use tally_clock::DayKey;

use crate::{DbError, Result};

/// Create the streak row for a user if none exists.
pub fn insert_if_absent(conn: &Connection, user_id: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO daily_streaks (user_id, current_streak, last_claim_date)
         VALUES (?1, 0, NULL)
         ON CONFLICT(user_id) DO NOTHING",
        [user_id],
    )?;
    Ok(())
}

/// Get the streak state for a user.
pub fn get(conn: &Connection, user_id: &str) -> Result<StreakRow> {
    let (current_streak, last_claim_date): (u32, Option<String>) = conn
        .query_row(
            "SELECT current_streak, last_claim_date FROM daily_streaks WHERE user_id = ?1",
            [user_id],
            |row| Ok((row.get::<_, i64>(0)? as u32, row.get(1)?)),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                DbError::NotFound(format!("streak for '{user_id}'"))
            }
            other => DbError::Sqlite(other),
        })?;

    Ok(StreakRow {
        user_id: user_id.to_string(),
        current_streak,
        last_claim_date: parse_day(last_claim_date)?,
    })
}

/// Record a successful claim: new streak value plus the day it covers.
pub fn record_claim(conn: &Connection, user_id: &str, streak: u32, day: DayKey) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO daily_streaks (user_id, current_streak, last_claim_date)
         VALUES (?1, ?2, ?3)",
        rusqlite::params![user_id, streak as i64, day.to_string()],
    )?;
    Ok(())
}

fn parse_day(value: Option<String>) -> Result<Option<DayKey>> {
    match value {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|e| DbError::Corrupt(format!("bad day key: {e}"))),
    }
}

/// A raw streak row from the database.
#[derive(Debug)]
pub struct StreakRow {
    pub user_id: String,
    pub current_streak: u32,
    pub last_claim_date: Option<DayKey>,
}
