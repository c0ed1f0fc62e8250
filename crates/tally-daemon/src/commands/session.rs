//! Session boundary and identity-provider webhook handlers.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use tally_engine::referral::{AttributionOutcome, QualificationOutcome};
use tally_engine::EngineError;

use crate::commands::{map_engine_err, require_user, to_result, today_for};
use crate::events::Event;
use crate::identity::AuthEvent;
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Fetch the caller's rewards profile, creating it on first access.
pub async fn get_profile(state: &Arc<DaemonState>, params: &Value) -> Result {
    let principal = require_user(state, params).await?;

    let db = state.db.lock().await;
    let profile = tally_engine::profile::get(&db, &principal.user_id).map_err(map_engine_err)?;
    to_result(&profile)
}

/// Consume an auth lifecycle event relayed by the identity provider.
///
/// `logged_in` and `signed_up` guarantee the profile row exists.
/// `signed_up` additionally attributes the referral when a code came
/// with the signup; a code the engine rejects is reported in the
/// response but does not fail the event. `onboarding_completed` pays
/// the referrer exactly once.
pub async fn auth_event(state: &Arc<DaemonState>, params: &Value) -> Result {
    let user_id = params
        .get("user_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("user_id required"))?;
    let email = params
        .get("email")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let event: AuthEvent = serde_json::from_value(
        params
            .get("event")
            .cloned()
            .ok_or_else(|| RpcError::invalid_params("event required"))?,
    )
    .map_err(|_| RpcError::invalid_params("unrecognized event"))?;

    let now = tally_clock::unix_now();

    match event {
        AuthEvent::LoggedIn => {
            let db = state.db.lock().await;
            tally_engine::profile::ensure(&db, user_id, email, now).map_err(map_engine_err)?;
            Ok(serde_json::json!({"handled": "logged_in"}))
        }

        AuthEvent::SignedUp { referral_code } => {
            let (attribution, referrer_id) = {
                let mut db = state.db.lock().await;
                tally_engine::profile::ensure(&db, user_id, email, now).map_err(map_engine_err)?;

                match referral_code.as_deref() {
                    None => (Value::Null, None),
                    Some(code) => {
                        match tally_engine::referral::attribute(&mut db, user_id, code, now) {
                            Ok(outcome) => {
                                let referrer_id = match &outcome {
                                    AttributionOutcome::Attributed { referrer_id } => {
                                        Some(referrer_id.clone())
                                    }
                                    AttributionOutcome::AlreadyAttributed => None,
                                };
                                (to_result(&outcome)?, referrer_id)
                            }
                            // A bad code must not fail the signup event
                            Err(
                                EngineError::UnknownReferralCode(_) | EngineError::SelfReferral,
                            ) => {
                                warn!(user_id, code, "signup carried a rejected referral code");
                                (serde_json::json!({"status": "rejected"}), None)
                            }
                            Err(e) => return Err(map_engine_err(e)),
                        }
                    }
                }
            };

            if let Some(referrer_id) = referrer_id {
                state.event_bus.emit(Event {
                    event_type: "ReferralAttributed".to_string(),
                    timestamp: now,
                    payload: serde_json::json!({
                        "referred_user_id": user_id,
                        "referrer_id": referrer_id,
                    }),
                });
            }

            Ok(serde_json::json!({"handled": "signed_up", "attribution": attribution}))
        }

        AuthEvent::OnboardingCompleted => {
            let today = today_for(state, params);
            let outcome = {
                let mut db = state.db.lock().await;
                tally_engine::referral::qualify(&mut db, user_id, today, now)
                    .map_err(map_engine_err)?
            };

            if let QualificationOutcome::Qualified {
                referrer_id,
                points_awarded,
            } = &outcome
            {
                state.event_bus.emit(Event {
                    event_type: "ReferralQualified".to_string(),
                    timestamp: now,
                    payload: serde_json::json!({
                        "referred_user_id": user_id,
                        "referrer_id": referrer_id,
                        "points": points_awarded,
                    }),
                });
            }

            Ok(serde_json::json!({
                "handled": "onboarding_completed",
                "qualification": to_result(&outcome)?,
            }))
        }

        AuthEvent::PasswordRecoveryRequested => {
            info!(user_id, "password recovery requested");
            Ok(serde_json::json!({"handled": "password_recovery_requested"}))
        }
    }
}

/// Subscribe to daemon events.
pub async fn subscribe_events(state: &Arc<DaemonState>, _params: &Value) -> Result {
    let sub_id: u128 = rand::random();

    Ok(serde_json::json!({
        "subscription_id": format!("{sub_id:032x}"),
        "sequence": state.event_bus.sequence(),
    }))
}

/// Unsubscribe from daemon events.
pub async fn unsubscribe_events(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _subscription_id = params
        .get("subscription_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("subscription_id required"))?;

    Ok(serde_json::json!({"unsubscribed": true}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testutil::{auth_params, state_with_tokens};

    #[tokio::test]
    async fn test_get_profile_creates_on_first_access() {
        let state = state_with_tokens();

        let profile = get_profile(&state, &auth_params("tok-alice"))
            .await
            .expect("get_profile");

        assert_eq!(profile["user_id"], "alice");
        assert_eq!(profile["email"], "alice@example.com");
        assert_eq!(profile["points"], 0);
        assert_eq!(
            profile["referral_code"].as_str().expect("code").len(),
            tally_types::REFERRAL_CODE_LEN
        );
    }

    #[tokio::test]
    async fn test_get_profile_unknown_token() {
        let state = state_with_tokens();

        let err = get_profile(&state, &auth_params("tok-mallory"))
            .await
            .expect_err("unknown token");
        assert_eq!(err.code, -32010);
    }

    #[tokio::test]
    async fn test_auth_event_requires_user_id() {
        let state = state_with_tokens();

        let err = auth_event(&state, &serde_json::json!({"event": {"type": "logged_in"}}))
            .await
            .expect_err("missing user_id");
        assert_eq!(err.code, -32602);
    }

    #[tokio::test]
    async fn test_signup_attribution_then_onboarding_pays_once() {
        let state = state_with_tokens();
        let mut rx = state.event_bus.subscribe();

        // Alice exists and owns a referral code.
        let alice = get_profile(&state, &auth_params("tok-alice"))
            .await
            .expect("alice profile");
        let code = alice["referral_code"].as_str().expect("code").to_string();

        // Signup webhook for a brand-new user carrying Alice's code.
        let res = auth_event(
            &state,
            &serde_json::json!({
                "user_id": "newbie",
                "email": "newbie@example.com",
                "event": {"type": "signed_up", "referral_code": code},
            }),
        )
        .await
        .expect("signup event");
        assert_eq!(res["handled"], "signed_up");
        assert_eq!(res["attribution"]["status"], "attributed");
        assert_eq!(res["attribution"]["referrer_id"], "alice");

        // Attribution alone pays nothing.
        {
            let db = state.db.lock().await;
            let balance = tally_engine::ledger::balance(&db, "alice").expect("balance");
            assert_eq!(balance, 0);
        }

        // Onboarding completion pays the bonus.
        let res = auth_event(
            &state,
            &serde_json::json!({
                "user_id": "newbie",
                "event": {"type": "onboarding_completed"},
            }),
        )
        .await
        .expect("onboarding event");
        assert_eq!(res["qualification"]["status"], "qualified");
        assert_eq!(
            res["qualification"]["points_awarded"],
            tally_types::REFERRAL_POINTS
        );

        {
            let db = state.db.lock().await;
            let balance = tally_engine::ledger::balance(&db, "alice").expect("balance");
            assert_eq!(balance, tally_types::REFERRAL_POINTS);
        }

        // Replay is benign and pays nothing further.
        let res = auth_event(
            &state,
            &serde_json::json!({
                "user_id": "newbie",
                "event": {"type": "onboarding_completed"},
            }),
        )
        .await
        .expect("replayed onboarding event");
        assert_eq!(res["qualification"]["status"], "already_qualified");

        // One attribution event, one qualification event.
        assert_eq!(rx.try_recv().expect("event").event_type, "ReferralAttributed");
        assert_eq!(rx.try_recv().expect("event").event_type, "ReferralQualified");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_signup_with_unknown_code_still_succeeds() {
        let state = state_with_tokens();

        let res = auth_event(
            &state,
            &serde_json::json!({
                "user_id": "newbie",
                "event": {"type": "signed_up", "referral_code": "nosuch00"},
            }),
        )
        .await
        .expect("signup event");
        assert_eq!(res["handled"], "signed_up");
        assert_eq!(res["attribution"]["status"], "rejected");

        // The profile was still created.
        let db = state.db.lock().await;
        let profile = tally_engine::profile::get(&db, "newbie").expect("profile");
        assert_eq!(profile.points, 0);
    }

    #[tokio::test]
    async fn test_onboarding_without_attribution_is_benign() {
        let state = state_with_tokens();

        let res = auth_event(
            &state,
            &serde_json::json!({
                "user_id": "loner",
                "event": {"type": "onboarding_completed"},
            }),
        )
        .await
        .expect("onboarding event");
        assert_eq!(res["qualification"]["status"], "not_attributed");
    }

    #[tokio::test]
    async fn test_subscribe_events_returns_id_and_sequence() {
        let state = state_with_tokens();

        let res = subscribe_events(&state, &serde_json::json!({}))
            .await
            .expect("subscribe");
        assert_eq!(res["subscription_id"].as_str().expect("id").len(), 32);
        assert_eq!(res["sequence"], 0);
    }
}
