//! # tally-types
//!
//! Shared domain types used across the Tally workspace: the persistent
//! data model (profiles, streaks, transactions, notifications, the
//! reward catalog) and the program constants that price each earning
//! event.

pub mod catalog;
pub mod notification;
pub mod profile;
pub mod transaction;

/// Opaque stable user identifier, issued by the identity provider.
pub type UserId = String;

/// Row identifier for notifications and transactions.
pub type RowId = i64;

/// Points credited per daily check-in claim.
pub const DAILY_POINTS: u64 = 5;

/// Points credited to a referrer when a referred signup completes
/// onboarding.
pub const REFERRAL_POINTS: u64 = 25;

/// Progress target shown against the balance (the cheapest catalog
/// reward).
pub const GOAL_POINTS: u64 = 5_000;

/// Length of generated referral codes (lowercase alphanumeric).
pub const REFERRAL_CODE_LEN: usize = 8;
