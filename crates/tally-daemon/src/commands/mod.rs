//! RPC command handlers.
//!
//! Each submodule implements the commands for one method group. Shared
//! here: token resolution, day-key resolution, and the mapping from
//! engine failures onto the RPC error catalog.

pub mod notifications;
pub mod referrals;
pub mod rewards;
pub mod session;

use std::sync::Arc;

use serde_json::Value;

use tally_clock::DayKey;
use tally_engine::EngineError;

use crate::identity::Principal;
use crate::rpc::RpcError;
use crate::DaemonState;

/// Map an engine failure onto the RPC error catalog.
pub(crate) fn map_engine_err(err: EngineError) -> RpcError {
    match err {
        EngineError::InsufficientBalance {
            required,
            available,
        } => RpcError::insufficient_balance(required, available),
        EngineError::UnknownReferralCode(code) => RpcError::unknown_referral_code(&code),
        EngineError::SelfReferral => RpcError::self_referral_rejected(),
        EngineError::UnknownReward(id) => RpcError::unknown_reward(id),
        EngineError::NotRedeemable(id) => RpcError::not_redeemable(id),
        EngineError::ZeroAmount => RpcError::invalid_params("amount must be positive"),
        // The profile is ensured on token resolution, so a missing row
        // past that point is an internal inconsistency.
        EngineError::ProfileMissing(user_id) => {
            RpcError::internal_error(&format!("no profile for {user_id}"))
        }
        EngineError::CodeSpaceExhausted => {
            RpcError::internal_error("could not allocate a referral code")
        }
        EngineError::Store(e) => RpcError::store_unavailable(&e.to_string()),
        EngineError::PartialFailure(detail) => RpcError::partial_failure(&detail),
    }
}

/// Resolve the caller from `params.auth_token`, creating the rewards
/// profile on first authenticated access.
pub(crate) async fn require_user(
    state: &Arc<DaemonState>,
    params: &Value,
) -> std::result::Result<Principal, RpcError> {
    let token = params
        .get("auth_token")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("auth_token required"))?;
    let principal = state
        .identity
        .resolve(token)
        .ok_or_else(RpcError::unauthenticated)?;

    let db = state.db.lock().await;
    tally_engine::profile::ensure(
        &db,
        &principal.user_id,
        &principal.email,
        tally_clock::unix_now(),
    )
    .map_err(map_engine_err)?;

    Ok(principal)
}

/// Resolve "today" for a request: the caller's UTC offset when given,
/// the configured default otherwise.
pub(crate) fn today_for(state: &DaemonState, params: &Value) -> DayKey {
    let offset = params
        .get("utc_offset_minutes")
        .and_then(|v| v.as_i64())
        .and_then(|v| i32::try_from(v).ok())
        .unwrap_or(state.config.rewards.utc_offset_minutes);
    tally_clock::today(offset)
}

/// Serialize a typed response payload.
pub(crate) fn to_result<T: serde::Serialize>(value: &T) -> std::result::Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError::internal_error(&format!("serialize: {e}")))
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::sync::Arc;

    use tokio::sync::broadcast;

    use crate::config::{DaemonConfig, IdentityConfig, TokenEntry};
    use crate::events::EventBus;
    use crate::identity::{IdentityProvider, StaticTokenProvider};
    use crate::DaemonState;

    /// In-memory daemon state with two token-backed users.
    pub fn state_with_tokens() -> Arc<DaemonState> {
        let config = DaemonConfig {
            identity: IdentityConfig {
                tokens: vec![
                    TokenEntry {
                        token: "tok-alice".to_string(),
                        user_id: "alice".to_string(),
                        email: "alice@example.com".to_string(),
                    },
                    TokenEntry {
                        token: "tok-bob".to_string(),
                        user_id: "bob".to_string(),
                        email: "bob@example.com".to_string(),
                    },
                ],
            },
            ..Default::default()
        };

        let conn = tally_db::open_memory().expect("open in-memory db");
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(StaticTokenProvider::from_config(&config.identity));
        let (shutdown_tx, _) = broadcast::channel(1);

        Arc::new(DaemonState {
            db: Arc::new(tokio::sync::Mutex::new(conn)),
            config,
            identity,
            event_bus: EventBus::new(16),
            shutdown_tx,
        })
    }

    /// Params object carrying only an auth token.
    pub fn auth_params(token: &str) -> serde_json::Value {
        serde_json::json!({"auth_token": token})
    }
}
