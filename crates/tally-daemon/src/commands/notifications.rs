//! Notification command handlers.

use std::sync::Arc;

use serde_json::Value;

use crate::commands::{map_engine_err, require_user, to_result};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// List the caller's notifications, newest first.
pub async fn list_notifications(state: &Arc<DaemonState>, params: &Value) -> Result {
    let principal = require_user(state, params).await?;
    let limit = params
        .get("limit")
        .and_then(|v| v.as_u64())
        .unwrap_or(50)
        .min(200) as u32;

    let db = state.db.lock().await;
    let notifications =
        tally_engine::notify::list(&db, &principal.user_id, limit).map_err(map_engine_err)?;

    to_result(&notifications)
}

/// Count the caller's unread notifications.
pub async fn get_unread_count(state: &Arc<DaemonState>, params: &Value) -> Result {
    let principal = require_user(state, params).await?;

    let db = state.db.lock().await;
    let unread =
        tally_engine::notify::unread_count(&db, &principal.user_id).map_err(map_engine_err)?;

    Ok(serde_json::json!({"unread": unread}))
}

/// Mark one of the caller's notifications read.
pub async fn mark_notification_read(state: &Arc<DaemonState>, params: &Value) -> Result {
    let principal = require_user(state, params).await?;
    let notification_id = params
        .get("notification_id")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| RpcError::invalid_params("notification_id required"))?;

    let db = state.db.lock().await;
    let updated = tally_engine::notify::mark_read(&db, &principal.user_id, notification_id)
        .map_err(map_engine_err)?;

    Ok(serde_json::json!({"updated": updated}))
}

/// Mark all of the caller's notifications read.
pub async fn mark_all_notifications_read(state: &Arc<DaemonState>, params: &Value) -> Result {
    let principal = require_user(state, params).await?;

    let db = state.db.lock().await;
    let updated =
        tally_engine::notify::mark_all_read(&db, &principal.user_id).map_err(map_engine_err)?;

    Ok(serde_json::json!({"updated": updated}))
}

/// Delete all of the caller's notifications.
pub async fn delete_all_notifications(state: &Arc<DaemonState>, params: &Value) -> Result {
    let principal = require_user(state, params).await?;

    let db = state.db.lock().await;
    let deleted =
        tally_engine::notify::delete_all(&db, &principal.user_id).map_err(map_engine_err)?;

    Ok(serde_json::json!({"deleted": deleted}))
}
