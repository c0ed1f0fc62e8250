//! Notification query functions.
//!
//! All reads and writes are scoped to the owning user; there is no way
//! to touch another user's rows through this module.

use rusqlite::Connection;

use crate::Result;

/// Insert a notification. Returns the new row id.
pub fn insert(
    conn: &Connection,
    user_id: &str,
    kind: &str,
    title: &str,
    message: &str,
    target_url: &str,
    created_at: u64,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO notifications (user_id, kind, title, message, target_url, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![user_id, kind, title, message, target_url, created_at as i64],
    )?;
    Ok(conn.last_insert_rowid())
}

/// List a user's notifications, most recent first.
pub fn list_for_user(conn: &Connection, user_id: &str, limit: u32) -> Result<Vec<NotificationRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, kind, title, message, target_url, read, created_at
         FROM notifications WHERE user_id = ?1
         ORDER BY created_at DESC, id DESC LIMIT ?2",
    )?;

    let rows = stmt
        .query_map(rusqlite::params![user_id, limit], |row| {
            Ok(NotificationRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                kind: row.get(2)?,
                title: row.get(3)?,
                message: row.get(4)?,
                target_url: row.get(5)?,
                read: row.get::<_, bool>(6)?,
                created_at: row.get::<_, i64>(7)? as u64,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Mark one notification read. Returns `false` if the id does not exist
/// or belongs to another user; marking an already-read row succeeds.
pub fn mark_read(conn: &Connection, user_id: &str, id: i64) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE notifications SET read = 1 WHERE id = ?1 AND user_id = ?2",
        rusqlite::params![id, user_id],
    )?;
    Ok(updated > 0)
}

/// Mark all of a user's unread notifications read. Returns how many changed.
pub fn mark_all_read(conn: &Connection, user_id: &str) -> Result<u32> {
    let updated = conn.execute(
        "UPDATE notifications SET read = 1 WHERE user_id = ?1 AND read = 0",
        [user_id],
    )?;
    Ok(updated as u32)
}

/// Delete all of a user's notifications. Returns how many were removed.
pub fn delete_all(conn: &Connection, user_id: &str) -> Result<u32> {
    let deleted = conn.execute("DELETE FROM notifications WHERE user_id = ?1", [user_id])?;
    Ok(deleted as u32)
}

/// Count a user's unread notifications.
pub fn unread_count(conn: &Connection, user_id: &str) -> Result<u32> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND read = 0",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(count as u32)
}

/// A raw notification row from the database.
#[derive(Debug)]
pub struct NotificationRow {
    pub id: i64,
    pub user_id: String,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub target_url: String,
    pub read: bool,
    pub created_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::profiles;

    fn test_db() -> Connection {
        let conn = crate::open_memory().expect("open test db");
        profiles::insert_if_absent(&conn, "u1", "a@example.com", "code1", 1000).expect("profile");
        profiles::insert_if_absent(&conn, "u2", "b@example.com", "code2", 1000).expect("profile");
        conn
    }

    #[test]
    fn test_insert_and_list() {
        let conn = test_db();
        insert(&conn, "u1", "daily_reward", "Claimed!", "You earned 5 points", "/rewards", 100)
            .expect("insert");
        insert(&conn, "u1", "referral", "Bonus!", "You earned 25 points", "/referrals", 200)
            .expect("insert");

        let notes = list_for_user(&conn, "u1", 10).expect("list");
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].kind, "referral"); // Most recent first
        assert!(!notes[0].read);
    }

    #[test]
    fn test_list_is_scoped_to_user() {
        let conn = test_db();
        insert(&conn, "u1", "daily_reward", "t", "m", "", 100).expect("insert");
        insert(&conn, "u2", "daily_reward", "t", "m", "", 100).expect("insert");

        assert_eq!(list_for_user(&conn, "u1", 10).expect("list").len(), 1);
        assert_eq!(list_for_user(&conn, "u2", 10).expect("list").len(), 1);
    }

    #[test]
    fn test_mark_read() {
        let conn = test_db();
        let id = insert(&conn, "u1", "daily_reward", "t", "m", "", 100).expect("insert");

        assert!(mark_read(&conn, "u1", id).expect("mark"));
        let notes = list_for_user(&conn, "u1", 10).expect("list");
        assert!(notes[0].read);

        // Already-read is still a success
        assert!(mark_read(&conn, "u1", id).expect("mark again"));
    }

    #[test]
    fn test_mark_read_wrong_owner() {
        let conn = test_db();
        let id = insert(&conn, "u1", "daily_reward", "t", "m", "", 100).expect("insert");

        assert!(!mark_read(&conn, "u2", id).expect("mark"));
        let notes = list_for_user(&conn, "u1", 10).expect("list");
        assert!(!notes[0].read, "another user must not flip the flag");
    }

    #[test]
    fn test_mark_all_and_unread_count() {
        let conn = test_db();
        for i in 0..3 {
            insert(&conn, "u1", "daily_reward", "t", "m", "", 100 + i).expect("insert");
        }
        assert_eq!(unread_count(&conn, "u1").expect("count"), 3);

        assert_eq!(mark_all_read(&conn, "u1").expect("mark all"), 3);
        assert_eq!(unread_count(&conn, "u1").expect("count"), 0);

        // Second pass has nothing left to change
        assert_eq!(mark_all_read(&conn, "u1").expect("mark all"), 0);
    }

    #[test]
    fn test_delete_all() {
        let conn = test_db();
        insert(&conn, "u1", "daily_reward", "t", "m", "", 100).expect("insert");
        insert(&conn, "u1", "referral", "t", "m", "", 200).expect("insert");
        insert(&conn, "u2", "daily_reward", "t", "m", "", 100).expect("insert");

        assert_eq!(delete_all(&conn, "u1").expect("delete"), 2);
        assert!(list_for_user(&conn, "u1", 10).expect("list").is_empty());
        assert_eq!(list_for_user(&conn, "u2", 10).expect("list").len(), 1);
    }
}
