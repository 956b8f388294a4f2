pub mod health;
pub mod notification;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                  WebSocket (token-authenticated)
///
/// /notifications                       list, create
/// /notifications/unread-count         unread badge count
/// /notifications/mark-all-read        bulk mark read (PATCH)
/// /notifications/clear-all            bulk delete (DELETE)
/// /notifications/broadcast            admin fan-out (POST)
/// /notifications/{id}                 get, delete
/// /notifications/{id}/read            mark read (PATCH)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/notifications", notification::router())
}
