//! Referral command handlers.

use std::sync::Arc;

use serde_json::Value;

use tally_engine::referral::AttributionOutcome;

use crate::commands::{map_engine_err, require_user, to_result};
use crate::events::Event;
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Attribute the caller's signup to the owner of a referral code.
///
/// Unlike the signup webhook path, a rejected code surfaces here as a
/// typed RPC error so the client can show accurate copy.
pub async fn attribute_referral(state: &Arc<DaemonState>, params: &Value) -> Result {
    let principal = require_user(state, params).await?;
    let code = params
        .get("referral_code")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("referral_code required"))?;
    let now = tally_clock::unix_now();

    let outcome = {
        let mut db = state.db.lock().await;
        tally_engine::referral::attribute(&mut db, &principal.user_id, code, now)
            .map_err(map_engine_err)?
    };

    if let AttributionOutcome::Attributed { referrer_id } = &outcome {
        state.event_bus.emit(Event {
            event_type: "ReferralAttributed".to_string(),
            timestamp: now,
            payload: serde_json::json!({
                "referred_user_id": principal.user_id,
                "referrer_id": referrer_id,
            }),
        });
    }

    to_result(&outcome)
}
