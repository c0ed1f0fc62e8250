//! Referral attribution and payouts.
//!
//! Attribution is first-wins and exactly-once per referred user. The
//! payout fires separately, when the referred signup completes
//! onboarding, and the NULL -> set transition on the qualification
//! timestamp guarantees it can never pay twice.

use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use tally_clock::DayKey;
use tally_db::{queries, DbError};
use tally_types::transaction::TxType;
use tally_types::{UserId, REFERRAL_POINTS};

use crate::{ledger, notify, EngineError, Result};

/// Outcome of a signup attribution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttributionOutcome {
    /// The signup is now credited to the code's owner.
    Attributed { referrer_id: UserId },
    /// An earlier attribution stands; the first referrer keeps it.
    AlreadyAttributed,
}

/// Outcome of consuming an onboarding-completed event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QualificationOutcome {
    /// The referrer was paid the bonus.
    Qualified {
        referrer_id: UserId,
        points_awarded: u64,
    },
    /// The payout already happened; nothing changed.
    AlreadyQualified,
    /// The user was never attributed; nothing to pay.
    NotAttributed,
}

/// Attribute a signup to the owner of `code`.
///
/// Unknown and self-referring codes are rejected with no state change.
/// A repeat call for an already-attributed user is a benign no-op. The
/// attribution may land before the referred user's own profile exists.
pub fn attribute(
    conn: &mut Connection,
    referred_user_id: &str,
    code: &str,
    now: u64,
) -> Result<AttributionOutcome> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(DbError::Sqlite)?;

    let referrer = match queries::profiles::by_referral_code(&tx, code) {
        Ok(row) => row,
        Err(DbError::NotFound(_)) => {
            return Err(EngineError::UnknownReferralCode(code.to_string()))
        }
        Err(e) => return Err(e.into()),
    };
    if referrer.user_id == referred_user_id {
        return Err(EngineError::SelfReferral);
    }

    let created = queries::referrals::insert(&tx, referred_user_id, &referrer.user_id, now)?;
    if !created {
        return Ok(AttributionOutcome::AlreadyAttributed); // tx drops with nothing written
    }
    queries::profiles::increment_referral_count(&tx, &referrer.user_id)?;

    tx.commit()
        .map_err(|e| EngineError::PartialFailure(e.to_string()))?;

    tracing::info!(referred_user_id, referrer_id = %referrer.user_id, "signup attributed");

    Ok(AttributionOutcome::Attributed {
        referrer_id: referrer.user_id,
    })
}

/// Consume an onboarding-completed event for a referred user, paying
/// the referrer the bonus exactly once.
pub fn qualify(
    conn: &mut Connection,
    referred_user_id: &str,
    today: DayKey,
    now: u64,
) -> Result<QualificationOutcome> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(DbError::Sqlite)?;

    let referral = match queries::referrals::get(&tx, referred_user_id) {
        Ok(row) => row,
        Err(DbError::NotFound(_)) => return Ok(QualificationOutcome::NotAttributed),
        Err(e) => return Err(e.into()),
    };

    if !queries::referrals::mark_qualified(&tx, referred_user_id, now)? {
        return Ok(QualificationOutcome::AlreadyQualified);
    }

    ledger::credit(
        &tx,
        &referral.referrer_id,
        TxType::ReferralBonus,
        REFERRAL_POINTS,
        today,
        now,
    )?;
    queries::profiles::add_referral_points(&tx, &referral.referrer_id, REFERRAL_POINTS)?;
    notify::referral_qualified(&tx, &referral.referrer_id, REFERRAL_POINTS, now)?;

    tx.commit()
        .map_err(|e| EngineError::PartialFailure(e.to_string()))?;

    tracing::info!(
        referred_user_id,
        referrer_id = %referral.referrer_id,
        points = REFERRAL_POINTS,
        "referral qualified"
    );

    Ok(QualificationOutcome::Qualified {
        referrer_id: referral.referrer_id,
        points_awarded: REFERRAL_POINTS,
    })
}
