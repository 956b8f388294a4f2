//! Route definitions for the `/notifications` resource.
//!
//! All endpoints require authentication; `/broadcast` additionally requires
//! the admin role.

use axum::routing::{delete, get, patch, post};
use axum::Router;

use crate::handlers::notification;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// GET    /                 -> list_notifications
/// POST   /                 -> create_notification
/// GET    /unread-count     -> unread_count
/// PATCH  /mark-all-read    -> mark_all_read
/// DELETE /clear-all        -> clear_all
/// POST   /broadcast        -> broadcast_notification (admin only)
/// GET    /{id}             -> get_notification
/// DELETE /{id}             -> delete_notification
/// PATCH  /{id}/read        -> mark_read
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(notification::list_notifications).post(notification::create_notification),
        )
        .route("/unread-count", get(notification::unread_count))
        .route("/mark-all-read", patch(notification::mark_all_read))
        .route("/clear-all", delete(notification::clear_all))
        .route("/broadcast", post(notification::broadcast_notification))
        .route(
            "/{id}",
            get(notification::get_notification).delete(notification::delete_notification),
        )
        .route("/{id}/read", patch(notification::mark_read))
}
