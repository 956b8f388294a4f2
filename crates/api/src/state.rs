use std::sync::Arc;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`). The WebSocket
/// manager and event bus are constructed once in `main` and injected here —
/// components that publish never reach for globals.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: nephra_db::DbPool,
    /// Server configuration (JWT secret, CORS, timeouts).
    pub config: Arc<ServerConfig>,
    /// Real-time channel manager (connected clinical staff).
    pub ws_manager: Arc<WsManager>,
    /// Event bus the record-write collaborators publish to.
    pub event_bus: Arc<nephra_events::EventBus>,
}
