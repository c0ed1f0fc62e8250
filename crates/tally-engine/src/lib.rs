//! # tally-engine
//!
//! The rewards engine: every decision about whether and how many points
//! move lives in this crate.
//!
//! This crate implements:
//!
//! - [`streak`] - Daily claim eligibility and the consecutive-day counter
//! - [`ledger`] - Delta-only balance accounting paired with the audit log
//! - [`referral`] - Signup attribution and one-shot referrer payouts
//! - [`notify`] - Durable user-visible event records
//! - [`catalog`] / [`redeem`] - The static reward catalog and redemption
//! - [`summary`] - The aggregated per-user rewards view
//! - [`profile`] - Lazy profile provisioning and referral links
//!
//! ## Atomicity
//!
//! The multi-row operations (claim, qualification, redemption) run
//! inside a single IMMEDIATE SQLite transaction: the streak or referral
//! write, the balance delta, the log append, and the notification land
//! together or not at all. Benign repeats (a second claim today, a
//! replayed attribution) are detected inside that transaction and return
//! an outcome variant instead of failing, which is what makes client
//! retries safe.

pub mod catalog;
pub mod ledger;
pub mod notify;
pub mod profile;
pub mod redeem;
pub mod referral;
pub mod streak;
pub mod summary;

use tally_db::DbError;

/// Error types for engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Credit and debit amounts must be positive.
    #[error("amount must be positive")]
    ZeroAmount,

    /// A debit would push the balance below zero. Fails closed: the
    /// balance is left untouched.
    #[error("insufficient balance: need {required}, have {available}")]
    InsufficientBalance {
        /// Points the operation asked for.
        required: u64,
        /// Points actually available.
        available: u64,
    },

    /// The referral code does not resolve to any profile.
    #[error("unknown referral code '{0}'")]
    UnknownReferralCode(String),

    /// A user tried to sign up with their own referral code.
    #[error("self-referral is not allowed")]
    SelfReferral,

    /// The reward id is not in the catalog.
    #[error("unknown reward {0}")]
    UnknownReward(u32),

    /// The reward exists but cannot be redeemed yet.
    #[error("reward {0} is not redeemable")]
    NotRedeemable(u32),

    /// No profile exists for this user and the operation does not
    /// create one.
    #[error("no profile for user '{0}'")]
    ProfileMissing(String),

    /// Referral code generation kept colliding with existing codes.
    #[error("could not allocate a unique referral code")]
    CodeSpaceExhausted,

    /// The store failed before commit. State is unchanged and the
    /// operation is safe to retry.
    #[error("store error: {0}")]
    Store(#[from] DbError),

    /// The commit outcome is unknown. The caller must not assume either
    /// success or failure; the next read or retry resolves it.
    #[error("commit outcome unknown: {0}")]
    PartialFailure(String),
}

/// Convenience result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Map a store error from a profile lookup, turning "no such row" into
/// the user-level [`EngineError::ProfileMissing`].
pub(crate) fn map_profile_err(e: DbError, user_id: &str) -> EngineError {
    match e {
        DbError::NotFound(_) => EngineError::ProfileMissing(user_id.to_string()),
        other => EngineError::Store(other),
    }
}
