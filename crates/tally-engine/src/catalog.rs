//! The reward catalog.
//!
//! Static reference data compiled into the binary. Per-user lock state
//! is derived from the balance at read time and never persisted.

use rusqlite::Connection;
use tally_types::catalog::{CatalogItem, RewardEntry, RewardStatus};

use crate::{ledger, Result};

/// Every offered reward, cheapest first.
pub const CATALOG: &[RewardEntry] = &[
    RewardEntry {
        id: 1,
        icon: "💸",
        title: "$5 Bank Transfer",
        description: "The $5 equivalent will be transferred to your bank account.",
        points_cost: 5_000,
        base_status: RewardStatus::Locked,
    },
    RewardEntry {
        id: 2,
        icon: "💸",
        title: "$5 PayPal International",
        description: "Receive a $5 PayPal balance transfer directly to your PayPal account email.",
        points_cost: 5_000,
        base_status: RewardStatus::Locked,
    },
    RewardEntry {
        id: 3,
        icon: "🎁",
        title: "$5 Virtual Visa Card",
        description: "Use your $5 prepaid card to shop anywhere Visa is accepted online.",
        points_cost: 5_000,
        base_status: RewardStatus::Locked,
    },
    RewardEntry {
        id: 4,
        icon: "🎁",
        title: "$5 Apple Gift Card",
        description: "Redeem this $5 Apple Gift Card for apps, games, music, movies, and more on the App Store and iTunes.",
        points_cost: 5_000,
        base_status: RewardStatus::Locked,
    },
    RewardEntry {
        id: 5,
        icon: "🎁",
        title: "$5 Google Play Card",
        description: "Use this $5 Google Play Gift Card to purchase apps, games, movies, books, and more on the Google Play Store.",
        points_cost: 5_000,
        base_status: RewardStatus::Locked,
    },
    RewardEntry {
        id: 6,
        icon: "🎁",
        title: "$5 Amazon Gift Card",
        description: "Get a $5 digital gift card to spend on your favorite tools or platforms.",
        points_cost: 5_000,
        base_status: RewardStatus::Locked,
    },
    RewardEntry {
        id: 7,
        icon: "🎁",
        title: "$10 Amazon Gift Card",
        description: "Get a $10 digital gift card to spend on your favorite platforms.",
        points_cost: 10_000,
        base_status: RewardStatus::Locked,
    },
    RewardEntry {
        id: 8,
        icon: "📚",
        title: "Free Udemy Course",
        description: "Coming Soon!",
        points_cost: 0,
        base_status: RewardStatus::ComingSoon,
    },
];

/// Look up a catalog entry by id.
pub fn find(reward_id: u32) -> Option<&'static RewardEntry> {
    CATALOG.iter().find(|entry| entry.id == reward_id)
}

/// The catalog as one user sees it, lock state derived from their balance.
pub fn list_for_user(conn: &Connection, user_id: &str) -> Result<Vec<CatalogItem>> {
    let balance = ledger::balance(conn, user_id)?;
    Ok(CATALOG.iter().map(|entry| entry.for_balance(balance)).collect())
}
