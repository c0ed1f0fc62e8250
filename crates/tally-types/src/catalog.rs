//! Reward catalog reference data.

use serde::{Deserialize, Serialize};

/// Redeemability state of a catalog entry.
///
/// `Locked`/`Unlocked` are computed per caller from the points balance;
/// `ComingSoon` entries are never redeemable regardless of balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewardStatus {
    Locked,
    Unlocked,
    ComingSoon,
}

/// A static catalog definition. Compiled in; never user state.
#[derive(Clone, Copy, Debug)]
pub struct RewardEntry {
    pub id: u32,
    pub icon: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    /// Points debited on redemption. Zero only for `ComingSoon` entries.
    pub points_cost: u64,
    /// `Locked` (redeemable once affordable) or `ComingSoon`.
    pub base_status: RewardStatus,
}

/// A catalog entry as presented to a caller, with the effective status
/// computed from that caller's balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: u32,
    pub icon: String,
    pub title: String,
    pub description: String,
    pub points_cost: u64,
    pub status: RewardStatus,
}

impl RewardEntry {
    /// View this entry with the effective status for `balance`.
    pub fn for_balance(&self, balance: u64) -> CatalogItem {
        let status = match self.base_status {
            RewardStatus::ComingSoon => RewardStatus::ComingSoon,
            _ if balance >= self.points_cost => RewardStatus::Unlocked,
            _ => RewardStatus::Locked,
        };
        CatalogItem {
            id: self.id,
            icon: self.icon.to_string(),
            title: self.title.to_string(),
            description: self.description.to_string(),
            points_cost: self.points_cost,
            status,
        }
    }
}
