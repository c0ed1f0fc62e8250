//! Referral attribution query functions.
//!
//! One row per referred user (primary key), so a signup can only ever be
//! attributed once. `qualified_at` moves NULL -> timestamp exactly once,
//! which is what makes the payout single-shot.

use rusqlite::Connection;

use crate::{DbError, Result};

/// Record an attribution if the referred user has none yet.
///
/// Returns `true` if this call created the attribution, `false` if one
/// already existed (the original referrer keeps the credit).
pub fn insert(
    conn: &Connection,
    referred_user_id: &str,
    referrer_id: &str,
    attributed_at: u64,
) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT INTO referrals (referred_user_id, referrer_id, attributed_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(referred_user_id) DO NOTHING",
        rusqlite::params![referred_user_id, referrer_id, attributed_at as i64],
    )?;
    Ok(inserted > 0)
}

/// Get the attribution for a referred user.
pub fn get(conn: &Connection, referred_user_id: &str) -> Result<ReferralRow> {
    conn.query_row(
        "SELECT referred_user_id, referrer_id, attributed_at, qualified_at
         FROM referrals WHERE referred_user_id = ?1",
        [referred_user_id],
        |row| {
            Ok(ReferralRow {
                referred_user_id: row.get(0)?,
                referrer_id: row.get(1)?,
                attributed_at: row.get::<_, i64>(2)? as u64,
                qualified_at: row.get::<_, Option<i64>>(3)?.map(|t| t as u64),
            })
        },
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            DbError::NotFound(format!("referral for '{referred_user_id}'"))
        }
        other => DbError::Sqlite(other),
    })
}

/// Mark an attribution qualified. Returns `false` if it was already
/// qualified (or does not exist), so the payout can never run twice.
pub fn mark_qualified(conn: &Connection, referred_user_id: &str, qualified_at: u64) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE referrals SET qualified_at = ?1
         WHERE referred_user_id = ?2 AND qualified_at IS NULL",
        rusqlite::params![qualified_at as i64, referred_user_id],
    )?;
    Ok(updated > 0)
}

/// A raw referral row from the database.
#[derive(Debug)]
pub struct ReferralRow {
    pub referred_user_id: String,
    pub referrer_id: String,
    pub attributed_at: u64,
    pub qualified_at: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::profiles;

    fn test_db() -> Connection {
        let conn = crate::open_memory().expect("open test db");
        profiles::insert_if_absent(&conn, "referrer", "r@example.com", "code1", 1000)
            .expect("profile");
        profiles::insert_if_absent(&conn, "other", "o@example.com", "code2", 1000)
            .expect("profile");
        conn
    }

    #[test]
    fn test_insert_and_get() {
        let conn = test_db();
        assert!(insert(&conn, "newcomer", "referrer", 500).expect("insert"));

        let row = get(&conn, "newcomer").expect("get");
        assert_eq!(row.referrer_id, "referrer");
        assert_eq!(row.attributed_at, 500);
        assert!(row.qualified_at.is_none());
    }

    #[test]
    fn test_first_attribution_wins() {
        let conn = test_db();
        assert!(insert(&conn, "newcomer", "referrer", 500).expect("first"));
        assert!(!insert(&conn, "newcomer", "other", 600).expect("second"));

        let row = get(&conn, "newcomer").expect("get");
        assert_eq!(row.referrer_id, "referrer");
        assert_eq!(row.attributed_at, 500);
    }

    #[test]
    fn test_mark_qualified_once() {
        let conn = test_db();
        insert(&conn, "newcomer", "referrer", 500).expect("insert");

        assert!(mark_qualified(&conn, "newcomer", 900).expect("first"));
        assert!(!mark_qualified(&conn, "newcomer", 901).expect("second"));

        let row = get(&conn, "newcomer").expect("get");
        assert_eq!(row.qualified_at, Some(900));
    }

    #[test]
    fn test_mark_qualified_without_attribution() {
        let conn = test_db();
        assert!(!mark_qualified(&conn, "stranger", 900).expect("mark"));
    }

    #[test]
    fn test_get_missing() {
        let conn = test_db();
        assert!(matches!(get(&conn, "stranger"), Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_referrer_must_exist() {
        let conn = test_db();
        let result = insert(&conn, "newcomer", "no-such-user", 500);
        assert!(result.is_err(), "foreign key should reject unknown referrer");
    }

    #[test]
    fn test_referred_user_needs_no_profile() {
        // Attribution can land before the referred user's profile is
        // provisioned; that is the whole point of the missing FK.
        let conn = test_db();
        assert!(insert(&conn, "not-yet-provisioned", "referrer", 500).expect("insert"));
    }
}
