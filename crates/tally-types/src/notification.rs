//! User-visible notification rows.

use serde::{Deserialize, Serialize};

use crate::{RowId, UserId};

/// A user-visible event record. Created as a side effect of a
/// ledger-affecting operation; mutated only to flip `read`, deletable
/// in bulk by the owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: RowId,
    pub user_id: UserId,
    /// Event tag, e.g. `daily_reward`, mirrored from the transaction
    /// kinds where one applies.
    pub kind: String,
    pub title: String,
    pub message: String,
    /// In-app destination the notification links to.
    pub target_url: String,
    pub read: bool,
    /// Unix timestamp of emission.
    pub created_at: u64,
}
