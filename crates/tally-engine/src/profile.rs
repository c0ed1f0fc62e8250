//! Profile provisioning and referral links.
//!
//! Profiles (and their streak rows) are created lazily on first
//! authenticated access; the operation is idempotent so concurrent
//! first requests race harmlessly.

use rand::Rng;
use rusqlite::Connection;
use tally_db::{queries, DbError};
use tally_types::profile::Profile;
use tally_types::REFERRAL_CODE_LEN;

use crate::{map_profile_err, EngineError, Result};

/// Attempts to mint an unused referral code before giving up.
const CODE_ATTEMPTS: usize = 4;

/// Fetch a profile.
pub fn get(conn: &Connection, user_id: &str) -> Result<Profile> {
    let row = queries::profiles::get(conn, user_id).map_err(|e| map_profile_err(e, user_id))?;
    Ok(Profile {
        user_id: row.user_id,
        email: row.email,
        points: row.points,
        referral_code: row.referral_code,
        referral_count: row.referral_count,
        referral_points: row.referral_points,
        created_at: row.created_at,
    })
}

/// Create the profile and streak rows for a user if they do not exist
/// yet, then return the profile.
pub fn ensure(conn: &Connection, user_id: &str, email: &str, now: u64) -> Result<Profile> {
    for _ in 0..CODE_ATTEMPTS {
        let code = generate_referral_code();
        match queries::profiles::insert_if_absent(conn, user_id, email, &code, now) {
            Ok(created) => {
                queries::streaks::insert_if_absent(conn, user_id)?;
                if created {
                    tracing::info!(user_id, "profile provisioned");
                }
                return get(conn, user_id);
            }
            // Code collision: mint another and retry
            Err(DbError::Constraint(_)) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(EngineError::CodeSpaceExhausted)
}

/// Build the shareable signup link for a referral code.
pub fn referral_link(base_url: &str, referral_code: &str) -> String {
    format!("{}/signup?ref={}", base_url.trim_end_matches('/'), referral_code)
}

fn generate_referral_code() -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..REFERRAL_CODE_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}
