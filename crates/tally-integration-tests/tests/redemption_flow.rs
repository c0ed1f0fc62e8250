//! Integration test: Catalog listing and reward redemption.
//!
//! Exercises the redemption pipeline:
//! 1. Balance gates catalog entry status
//! 2. Redemption debits, logs, and notifies as one unit
//! 3. Insufficient balance fails the whole operation cleanly
//! 4. Coming-soon and unknown entries reject before any debit

use tally_clock::DayKey;
use tally_engine::{catalog, ledger, notify, profile, redeem, EngineError};
use tally_types::catalog::RewardStatus;
use tally_types::transaction::TxType;
use tally_types::GOAL_POINTS;

/// Simulated timestamp for deterministic testing.
const TEST_NOW: u64 = 1_741_600_000;

fn day(s: &str) -> DayKey {
    s.parse().expect("valid day key")
}

#[tokio::test]
#[ignore]
async fn redemption_debits_logs_and_notifies() {
    let mut conn = tally_db::open_memory().expect("in-memory DB should open");
    profile::ensure(&conn, "alice", "alice@example.com", TEST_NOW).expect("profile");
    let today = day("2025-03-10");

    // =========================================================
    // Step 1: Seed earnings to exactly the cheapest reward cost
    // =========================================================
    // Simulate accumulated referral earnings.
    ledger::credit(
        &conn,
        "alice",
        TxType::ReferralBonus,
        GOAL_POINTS,
        today,
        TEST_NOW,
    )
    .expect("seed credit should succeed");

    let items = catalog::list_for_user(&conn, "alice").expect("catalog");
    let cheapest = items.iter().find(|i| i.id == 1).expect("entry 1 exists");
    assert_eq!(
        cheapest.status,
        RewardStatus::Unlocked,
        "The exact cost must unlock the entry"
    );
    assert!(
        items
            .iter()
            .filter(|i| i.points_cost > GOAL_POINTS)
            .all(|i| i.status == RewardStatus::Locked),
        "Entries above the balance stay locked"
    );

    // =========================================================
    // Step 2: Redeem the cheapest entry
    // =========================================================
    let redemption = redeem::redeem(&mut conn, "alice", 1, today, TEST_NOW + 10)
        .expect("redemption should succeed");
    assert_eq!(redemption.reward_id, 1);
    assert_eq!(redemption.points_spent, GOAL_POINTS);
    assert_eq!(redemption.new_balance, 0);

    assert_eq!(ledger::balance(&conn, "alice").expect("balance"), 0);

    // Credit then debit in the log, newest first.
    let txs = ledger::history(&conn, "alice", 10).expect("history");
    assert_eq!(txs.len(), 2);
    assert_eq!(txs[0].tx_type, TxType::Redemption);
    assert_eq!(txs[0].points_delta, -(GOAL_POINTS as i64));
    assert_eq!(txs[1].tx_type, TxType::ReferralBonus);

    // The redemption notification names the reward.
    let notes = notify::list(&conn, "alice", 10).expect("notifications");
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].kind, "redemption");
    assert!(
        notes[0].message.contains(&redemption.title),
        "Redemption copy names the reward title"
    );

    // The catalog relocks once the balance is spent.
    let items = catalog::list_for_user(&conn, "alice").expect("catalog");
    let cheapest = items.iter().find(|i| i.id == 1).expect("entry 1 exists");
    assert_eq!(cheapest.status, RewardStatus::Locked);

    // =========================================================
    // Step 3: A second redemption fails with nothing left behind
    // =========================================================
    let err = redeem::redeem(&mut conn, "alice", 1, today, TEST_NOW + 20)
        .expect_err("zero balance cannot redeem");
    assert!(
        matches!(
            err,
            EngineError::InsufficientBalance {
                required,
                available: 0
            } if required == GOAL_POINTS
        ),
        "The error reports the shortfall"
    );
    assert_eq!(
        ledger::history(&conn, "alice", 10).expect("history").len(),
        2,
        "A failed redemption must not append to the log"
    );
    assert_eq!(
        notify::list(&conn, "alice", 10).expect("notes").len(),
        2,
        "A failed redemption must not notify"
    );
}

#[tokio::test]
#[ignore]
async fn unredeemable_entries_reject_before_debit() {
    let mut conn = tally_db::open_memory().expect("in-memory DB should open");
    profile::ensure(&conn, "alice", "alice@example.com", TEST_NOW).expect("profile");
    let today = day("2025-03-10");

    // A large balance does not make a coming-soon entry redeemable.
    ledger::credit(
        &conn,
        "alice",
        TxType::ReferralBonus,
        10 * GOAL_POINTS,
        today,
        TEST_NOW,
    )
    .expect("seed credit");

    let coming_soon = catalog::list_for_user(&conn, "alice")
        .expect("catalog")
        .into_iter()
        .find(|i| i.status == RewardStatus::ComingSoon)
        .expect("catalog carries a coming-soon entry");

    let err = redeem::redeem(&mut conn, "alice", coming_soon.id, today, TEST_NOW + 10)
        .expect_err("coming-soon must reject");
    assert!(matches!(err, EngineError::NotRedeemable(_)));

    // Unknown ids reject.
    let err = redeem::redeem(&mut conn, "alice", 999, today, TEST_NOW + 20)
        .expect_err("unknown reward must reject");
    assert!(matches!(err, EngineError::UnknownReward(999)));

    // Neither attempt touched the balance or the log.
    assert_eq!(
        ledger::balance(&conn, "alice").expect("balance"),
        10 * GOAL_POINTS
    );
    assert_eq!(
        ledger::history(&conn, "alice", 10).expect("history").len(),
        1
    );
}
