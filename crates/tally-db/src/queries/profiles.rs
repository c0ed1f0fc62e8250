//! Profile query functions.
//!
//! The `points` column is the authoritative balance and only ever moves
//! through the delta functions here; callers never write an absolute value.

use rusqlite::Connection;

use crate::{DbError, Result};

/// Insert a profile if none exists for this user.
///
/// Returns `true` if the row was created, `false` if it already existed.
/// A duplicate `referral_code` is reported as [`DbError::Constraint`] so
/// the caller can regenerate and retry.
pub fn insert_if_absent(
    conn: &Connection,
    user_id: &str,
    email: &str,
    referral_code: &str,
    created_at: u64,
) -> Result<bool> {
    let inserted = conn
        .execute(
            "INSERT INTO profiles (user_id, email, referral_code, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id) DO NOTHING",
            rusqlite::params![user_id, email, referral_code, created_at as i64],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                DbError::Constraint(format!("referral code '{referral_code}' already taken"))
            }
            other => DbError::Sqlite(other),
        })?;
    Ok(inserted > 0)
}

/// Get a profile by user id.
pub fn get(conn: &Connection, user_id: &str) -> Result<ProfileRow> {
    conn.query_row(
        "SELECT user_id, email, points, referral_code, referral_count, referral_points, created_at
         FROM profiles WHERE user_id = ?1",
        [user_id],
        map_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("profile '{user_id}'")),
        other => DbError::Sqlite(other),
    })
}

/// Get a profile by its referral code.
pub fn by_referral_code(conn: &Connection, code: &str) -> Result<ProfileRow> {
    conn.query_row(
        "SELECT user_id, email, points, referral_code, referral_count, referral_points, created_at
         FROM profiles WHERE referral_code = ?1",
        [code],
        map_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            DbError::NotFound(format!("referral code '{code}'"))
        }
        other => DbError::Sqlite(other),
    })
}

/// Get the current points balance.
pub fn balance(conn: &Connection, user_id: &str) -> Result<u64> {
    let points: i64 = conn
        .query_row(
            "SELECT points FROM profiles WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                DbError::NotFound(format!("profile '{user_id}'"))
            }
            other => DbError::Sqlite(other),
        })?;
    Ok(points as u64)
}

/// Credit points to a profile. Returns the new balance.
pub fn add_points(conn: &Connection, user_id: &str, amount: u64) -> Result<u64> {
    let updated = conn.execute(
        "UPDATE profiles SET points = points + ?1 WHERE user_id = ?2",
        rusqlite::params![amount as i64, user_id],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("profile '{user_id}'")));
    }
    balance(conn, user_id)
}

/// Deduct points only if the balance covers the amount.
///
/// Returns `Ok(Some(new_balance))` on success and `Ok(None)` if the
/// balance is insufficient. The guard in the WHERE clause means the
/// balance can never go negative, regardless of interleaving.
pub fn try_deduct(conn: &Connection, user_id: &str, amount: u64) -> Result<Option<u64>> {
    let updated = conn.execute(
        "UPDATE profiles SET points = points - ?1 WHERE user_id = ?2 AND points >= ?1",
        rusqlite::params![amount as i64, user_id],
    )?;
    if updated == 0 {
        // Distinguish a missing profile from an insufficient balance
        balance(conn, user_id)?;
        return Ok(None);
    }
    balance(conn, user_id).map(Some)
}

/// Count one more attributed signup for a referrer.
pub fn increment_referral_count(conn: &Connection, user_id: &str) -> Result<()> {
    let updated = conn.execute(
        "UPDATE profiles SET referral_count = referral_count + 1 WHERE user_id = ?1",
        [user_id],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("profile '{user_id}'")));
    }
    Ok(())
}

/// Add to a referrer's lifetime referral points tally. This is the
/// bookkeeping column only; the balance credit goes through
/// [`add_points`].
pub fn add_referral_points(conn: &Connection, user_id: &str, points: u64) -> Result<()> {
    let updated = conn.execute(
        "UPDATE profiles SET referral_points = referral_points + ?1 WHERE user_id = ?2",
        rusqlite::params![points as i64, user_id],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("profile '{user_id}'")));
    }
    Ok(())
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        user_id: row.get(0)?,
        email: row.get(1)?,
        points: row.get::<_, i64>(2)? as u64,
        referral_code: row.get(3)?,
        referral_count: row.get::<_, i64>(4)? as u32,
        referral_points: row.get::<_, i64>(5)? as u64,
        created_at: row.get::<_, i64>(6)? as u64,
    })
}

/// A raw profile row from the database.
#[derive(Debug)]
pub struct ProfileRow {
    pub user_id: String,
    pub email: String,
    pub points: u64,
    pub referral_code: String,
    pub referral_count: u32,
    pub referral_points: u64,
    pub created_at: u64,
}
