//! SQL schema definitions.

/// Complete schema for Tally v1 database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Profiles: one row per user, authoritative points balance.
-- points only moves through delta updates (credit/debit); the
-- CHECK is a store-level backstop for the non-negative invariant.
-- ============================================================

CREATE TABLE IF NOT EXISTS profiles (
    user_id TEXT PRIMARY KEY,
    email TEXT NOT NULL DEFAULT '',
    points INTEGER NOT NULL DEFAULT 0 CHECK (points >= 0),
    referral_code TEXT NOT NULL UNIQUE,
    referral_count INTEGER NOT NULL DEFAULT 0,
    referral_points INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);

-- ============================================================
-- Daily claim streaks: one row per user, created with the profile.
-- last_claim_date is a day key (YYYY-MM-DD) or NULL before the
-- first claim.
-- ============================================================

CREATE TABLE IF NOT EXISTS daily_streaks (
    user_id TEXT PRIMARY KEY REFERENCES profiles(user_id) ON DELETE CASCADE,
    current_streak INTEGER NOT NULL DEFAULT 0,
    last_claim_date TEXT
);

-- ============================================================
-- Transactions: append-only audit trail of point-affecting events.
-- Never updated or deleted; the signed deltas per user sum to the
-- profile balance.
-- ============================================================

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES profiles(user_id) ON DELETE CASCADE,
    tx_type TEXT NOT NULL,
    points_delta INTEGER NOT NULL,
    occurred_on TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_transactions_user ON transactions(user_id, created_at DESC);

-- ============================================================
-- Notifications: user-visible event records. Mutated only to flip
-- read; bulk-deletable by the owner. AUTOINCREMENT keeps ids stable
-- across bulk deletes.
-- ============================================================

CREATE TABLE IF NOT EXISTS notifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL REFERENCES profiles(user_id) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    title TEXT NOT NULL,
    message TEXT NOT NULL,
    target_url TEXT NOT NULL DEFAULT '',
    read INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_notifications_unread ON notifications(user_id) WHERE read = 0;

-- ============================================================
-- Referrals: at most one attribution per referred user (primary
-- key), paid out at most once (qualified_at transitions NULL -> set).
-- referred_user_id is deliberately not a foreign key: the signup
-- event can arrive before the referred user's profile exists.
-- ============================================================

CREATE TABLE IF NOT EXISTS referrals (
    referred_user_id TEXT PRIMARY KEY,
    referrer_id TEXT NOT NULL REFERENCES profiles(user_id) ON DELETE CASCADE,
    attributed_at INTEGER NOT NULL,
    qualified_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_referrals_referrer ON referrals(referrer_id);
"#;
