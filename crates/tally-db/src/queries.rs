//! Database query functions organized by domain.

pub mod notifications;
pub mod profiles;
pub mod referrals;
pub mod streaks;
pub mod transactions;
