//! tally-daemon: the Tally rewards daemon.
//!
//! Single OS process running a Tokio async runtime. Clients (the web
//! backend and the identity provider's webhook relay) talk to the
//! daemon via JSON-RPC over Unix socket.

mod commands;
mod config;
mod events;
mod identity;
mod rpc;

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{error, info};

use crate::config::DaemonConfig;
use crate::events::EventBus;
use crate::identity::{IdentityProvider, StaticTokenProvider};
use crate::rpc::RpcServer;

/// Daemon-wide shared state.
pub struct DaemonState {
    /// Database connection.
    pub db: Arc<tokio::sync::Mutex<rusqlite::Connection>>,
    /// Configuration.
    pub config: DaemonConfig,
    /// Resolves bearer tokens to principals.
    pub identity: Arc<dyn IdentityProvider>,
    /// Event bus for pushing events to subscribers.
    pub event_bus: EventBus,
    /// Shutdown signal sender.
    pub shutdown_tx: broadcast::Sender<()>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tally=info".parse()?),
        )
        .init();

    info!("Tally daemon starting");

    // 1. Load config
    let config = DaemonConfig::load()?;
    let data_dir = config.data_dir();

    // Ensure data directory exists
    std::fs::create_dir_all(&data_dir)?;

    // 2. Open database
    let db_path = data_dir.join("tally.db");
    let conn = tally_db::open(&db_path)?;
    let db = Arc::new(tokio::sync::Mutex::new(conn));

    // 3. Identity provider (static token table in v1)
    let identity: Arc<dyn IdentityProvider> =
        Arc::new(StaticTokenProvider::from_config(&config.identity));

    // 4. Create event bus
    let event_bus = EventBus::new(1000);

    // 5. Create shutdown channel
    let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);

    // 6. Build daemon state
    let state = Arc::new(DaemonState {
        db,
        config,
        identity,
        event_bus,
        shutdown_tx: shutdown_tx.clone(),
    });

    // 7. Start IPC server
    let socket_path = data_dir.join("daemon.sock");
    let rpc_server = RpcServer::new(state.clone(), socket_path.clone());

    info!("Starting JSON-RPC server on {:?}", socket_path);

    // 8. Emit DaemonStarted event
    state.event_bus.emit(events::Event {
        event_type: "DaemonStarted".to_string(),
        timestamp: tally_clock::unix_now(),
        payload: serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
        }),
    });

    // 9. Run the RPC server until shutdown
    let mut shutdown_rx = shutdown_tx.subscribe();
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = shutdown_rx.recv() => {
            info!("Shutdown signal received");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    // Graceful shutdown
    info!("Daemon shutting down gracefully");

    // Clean up socket file
    let _ = std::fs::remove_file(&socket_path);

    info!("Daemon stopped");
    Ok(())
}
