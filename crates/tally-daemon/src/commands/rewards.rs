//! Rewards command handlers: daily claim, summary, transaction
//! history, catalog listing, and redemption.

use std::sync::Arc;

use serde_json::Value;

use tally_engine::streak::ClaimOutcome;

use crate::commands::{map_engine_err, require_user, to_result, today_for};
use crate::events::Event;
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Claim today's daily reward.
pub async fn claim_daily(state: &Arc<DaemonState>, params: &Value) -> Result {
    let principal = require_user(state, params).await?;
    let today = today_for(state, params);
    let now = tally_clock::unix_now();

    let outcome = {
        let mut db = state.db.lock().await;
        tally_engine::streak::claim_daily(&mut db, &principal.user_id, today, now)
            .map_err(map_engine_err)?
    };

    if let ClaimOutcome::Claimed {
        new_streak,
        points_awarded,
    } = &outcome
    {
        state.event_bus.emit(Event {
            event_type: "DailyClaimed".to_string(),
            timestamp: now,
            payload: serde_json::json!({
                "user_id": principal.user_id,
                "streak": new_streak,
                "points": points_awarded,
            }),
        });
    }

    to_result(&outcome)
}

/// Assemble the rewards page summary for the caller.
pub async fn get_rewards_summary(state: &Arc<DaemonState>, params: &Value) -> Result {
    let principal = require_user(state, params).await?;
    let today = today_for(state, params);

    let db = state.db.lock().await;
    let summary = tally_engine::summary::rewards_summary(
        &db,
        &principal.user_id,
        today,
        &state.config.rewards.referral_link_base,
    )
    .map_err(map_engine_err)?;

    to_result(&summary)
}

/// List the caller's transaction log, newest first.
pub async fn get_transactions(state: &Arc<DaemonState>, params: &Value) -> Result {
    let principal = require_user(state, params).await?;
    let limit = params
        .get("limit")
        .and_then(|v| v.as_u64())
        .unwrap_or(50)
        .min(500) as u32;

    let db = state.db.lock().await;
    let transactions =
        tally_engine::ledger::history(&db, &principal.user_id, limit).map_err(map_engine_err)?;

    to_result(&transactions)
}

/// List the reward catalog with the caller's effective statuses.
pub async fn list_rewards(state: &Arc<DaemonState>, params: &Value) -> Result {
    let principal = require_user(state, params).await?;

    let db = state.db.lock().await;
    let items =
        tally_engine::catalog::list_for_user(&db, &principal.user_id).map_err(map_engine_err)?;

    to_result(&items)
}

/// Redeem a catalog reward, debiting its cost.
pub async fn redeem_reward(state: &Arc<DaemonState>, params: &Value) -> Result {
    let principal = require_user(state, params).await?;
    let reward_id = params
        .get("reward_id")
        .and_then(|v| v.as_u64())
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| RpcError::invalid_params("reward_id required"))?;
    let today = today_for(state, params);
    let now = tally_clock::unix_now();

    let redemption = {
        let mut db = state.db.lock().await;
        tally_engine::redeem::redeem(&mut db, &principal.user_id, reward_id, today, now)
            .map_err(map_engine_err)?
    };

    state.event_bus.emit(Event {
        event_type: "RewardRedeemed".to_string(),
        timestamp: now,
        payload: serde_json::json!({
            "user_id": principal.user_id,
            "reward_id": redemption.reward_id,
            "points": redemption.points_spent,
        }),
    });

    to_result(&redemption)
}
