//! # tally-db
//!
//! Database access layer for the Tally daemon.
//! Manages the single SQLite database at `$TALLY_DATA_DIR/tally.db`:
//! profiles, daily streaks, the append-only transaction log,
//! notifications, and referral attributions.
//!
//! ## Schema
//!
//! - WAL mode mandatory
//! - Foreign keys enforced
//! - Timestamps are Unix epoch seconds, day keys are `YYYY-MM-DD` TEXT
//! - Schema version stored in `PRAGMA user_version`
//!
//! The engine wraps multi-row sequences (claim, qualification,
//! redemption) in a single transaction on the connection returned here;
//! the query functions in [`queries`] are transaction-agnostic and work
//! on either a plain connection or one inside a transaction.

pub mod migrations;
pub mod queries;
pub mod schema;

use std::path::Path;

use rusqlite::Connection;

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    /// A stored value failed to parse back (e.g. a day key column that
    /// is not `YYYY-MM-DD`). Indicates an out-of-band write.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Open or create the Tally database at the given path.
///
/// Configures WAL mode and foreign keys, then runs any pending
/// migrations.
pub fn open(path: &Path) -> Result<Connection> {
    tracing::debug!("Opening database at {}", path.display());
    let conn = Connection::open(path)?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing).
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Configure SQLite pragmas.
///
/// busy_timeout covers the claim path: two devices claiming for the
/// same user serialize on the writer lock instead of failing fast.
fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(())
}
