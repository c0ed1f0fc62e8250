//! JSON-RPC server over Unix socket.
//!
//! Listens on a Unix domain socket, accepts connections, and dispatches
//! JSON-RPC method calls to the appropriate command handlers. Requests
//! and responses are line-delimited JSON-RPC 2.0.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tracing::{debug, error, info, warn};

use crate::commands;
use crate::DaemonState;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Method name.
    pub method: String,
    /// Parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    /// JSON-RPC version.
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Result or error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcError {
    /// Error code.
    pub code: i32,
    /// Error name.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcError {
    // Standard JSON-RPC errors

    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self {
            code: -32700,
            message: "PARSE_ERROR".to_string(),
            data: None,
        }
    }

    /// Invalid request (-32600).
    pub fn invalid_request() -> Self {
        Self {
            code: -32600,
            message: "INVALID_REQUEST".to_string(),
            data: None,
        }
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "METHOD_NOT_FOUND".to_string(),
            data: Some(serde_json::json!({"method": method})),
        }
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self {
            code: -32602,
            message: "INVALID_PARAMS".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self {
            code: -32603,
            message: "INTERNAL_ERROR".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    // Daemon errors

    /// Unknown or expired auth token (-32010).
    pub fn unauthenticated() -> Self {
        Self {
            code: -32010,
            message: "UNAUTHENTICATED".to_string(),
            data: None,
        }
    }

    /// Record store unreachable or rejected the operation (-32030).
    /// The operation rolled back; safe to retry.
    pub fn store_unavailable(detail: &str) -> Self {
        Self {
            code: -32030,
            message: "STORE_UNAVAILABLE".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Commit fate unknown (-32031). Not safe to blind-retry.
    pub fn partial_failure(detail: &str) -> Self {
        Self {
            code: -32031,
            message: "PARTIAL_FAILURE".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Insufficient balance (-32040).
    pub fn insufficient_balance(required: u64, available: u64) -> Self {
        Self {
            code: -32040,
            message: "INSUFFICIENT_BALANCE".to_string(),
            data: Some(serde_json::json!({"required": required, "available": available})),
        }
    }

    /// Referral code does not resolve to any profile (-32050).
    pub fn unknown_referral_code(code: &str) -> Self {
        Self {
            code: -32050,
            message: "UNKNOWN_REFERRAL_CODE".to_string(),
            data: Some(serde_json::json!({"referral_code": code})),
        }
    }

    /// Attempt to redeem one's own referral code (-32051).
    pub fn self_referral_rejected() -> Self {
        Self {
            code: -32051,
            message: "SELF_REFERRAL_REJECTED".to_string(),
            data: None,
        }
    }

    /// Reward id not in the catalog (-32052).
    pub fn unknown_reward(reward_id: u32) -> Self {
        Self {
            code: -32052,
            message: "UNKNOWN_REWARD".to_string(),
            data: Some(serde_json::json!({"reward_id": reward_id})),
        }
    }

    /// Catalog entry exists but cannot be redeemed (-32053).
    pub fn not_redeemable(reward_id: u32) -> Self {
        Self {
            code: -32053,
            message: "NOT_REDEEMABLE".to_string(),
            data: Some(serde_json::json!({"reward_id": reward_id})),
        }
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<DaemonState>,
    socket_path: PathBuf,
}

impl RpcServer {
    /// Create a new RPC server.
    pub fn new(state: Arc<DaemonState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the server, accepting connections.
    pub async fn run(&self) -> anyhow::Result<()> {
        // Remove stale socket file
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(
    state: Arc<DaemonState>,
    stream: tokio::net::UnixStream,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // EOF
        }

        let response = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(request) => dispatch_request(state.clone(), request).await,
            Err(_) => RpcResponse::error(serde_json::Value::Null, RpcError::parse_error()),
        };

        let mut response_json = serde_json::to_string(&response)?;
        response_json.push('\n');
        writer.write_all(response_json.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
///
/// Authentication is per-request: handlers that act on a user resolve
/// `params.auth_token` themselves, so there is no ambient session to
/// gate here.
pub(crate) async fn dispatch_request(state: Arc<DaemonState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    let method = request.method.as_str();

    if request.jsonrpc != "2.0" {
        return RpcResponse::error(id, RpcError::invalid_request());
    }

    debug!("Dispatching RPC method: {}", method);

    let result = match method {
        // Session and identity-provider boundary
        "get_profile" => commands::session::get_profile(&state, &request.params).await,
        "auth_event" => commands::session::auth_event(&state, &request.params).await,

        // Rewards
        "claim_daily" => commands::rewards::claim_daily(&state, &request.params).await,
        "get_rewards_summary" => {
            commands::rewards::get_rewards_summary(&state, &request.params).await
        }
        "get_transactions" => commands::rewards::get_transactions(&state, &request.params).await,
        "list_rewards" => commands::rewards::list_rewards(&state, &request.params).await,
        "redeem_reward" => commands::rewards::redeem_reward(&state, &request.params).await,

        // Notifications
        "list_notifications" => {
            commands::notifications::list_notifications(&state, &request.params).await
        }
        "get_unread_count" => {
            commands::notifications::get_unread_count(&state, &request.params).await
        }
        "mark_notification_read" => {
            commands::notifications::mark_notification_read(&state, &request.params).await
        }
        "mark_all_notifications_read" => {
            commands::notifications::mark_all_notifications_read(&state, &request.params).await
        }
        "delete_all_notifications" => {
            commands::notifications::delete_all_notifications(&state, &request.params).await
        }

        // Referrals
        "attribute_referral" => {
            commands::referrals::attribute_referral(&state, &request.params).await
        }

        // Event subscription
        "subscribe_events" => commands::session::subscribe_events(&state, &request.params).await,
        "unsubscribe_events" => {
            commands::session::unsubscribe_events(&state, &request.params).await
        }

        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_error_codes() {
        let err = RpcError::unauthenticated();
        assert_eq!(err.code, -32010);
        assert_eq!(err.message, "UNAUTHENTICATED");

        let err = RpcError::insufficient_balance(5000, 120);
        assert_eq!(err.code, -32040);
        let data = err.data.expect("data");
        assert_eq!(data["required"], 5000);
        assert_eq!(data["available"], 120);

        let err = RpcError::unknown_referral_code("zz99");
        assert_eq!(err.code, -32050);

        let err = RpcError::method_not_found("unknown");
        assert_eq!(err.code, -32601);
    }

    #[test]
    fn test_rpc_response_success() {
        let resp = RpcResponse::success(serde_json::json!(1), serde_json::json!({"points": 120}));
        assert!(resp.result.is_some());
        assert!(resp.error.is_none());
    }

    #[test]
    fn test_rpc_response_error() {
        let resp = RpcResponse::error(serde_json::json!(1), RpcError::internal_error("test"));
        assert!(resp.result.is_none());
        assert!(resp.error.is_some());
    }

    #[test]
    fn test_request_params_default_to_null() {
        let request: RpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"method":"list_rewards"}"#)
                .expect("parse");
        assert!(request.params.is_null());
    }

    #[tokio::test]
    async fn test_dispatch_rejects_wrong_version() {
        let state = crate::commands::testutil::state_with_tokens();
        let request = RpcRequest {
            jsonrpc: "1.0".to_string(),
            id: serde_json::json!(7),
            method: "list_rewards".to_string(),
            params: serde_json::Value::Null,
        };
        let resp = dispatch_request(state, request).await;
        assert_eq!(resp.error.expect("error").code, -32600);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_method() {
        let state = crate::commands::testutil::state_with_tokens();
        let request = RpcRequest {
            jsonrpc: "2.0".to_string(),
            id: serde_json::json!(8),
            method: "mint_points".to_string(),
            params: serde_json::Value::Null,
        };
        let resp = dispatch_request(state, request).await;
        let err = resp.error.expect("error");
        assert_eq!(err.code, -32601);
        assert_eq!(err.data.expect("data")["method"], "mint_points");
    }
}
