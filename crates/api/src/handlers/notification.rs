//! Handlers for the `/notifications` resource (the inbox API).
//!
//! Every operation implicitly filters by the authenticated caller as
//! recipient — no cross-user access path exists at this layer. Cross-
//! recipient reads are indistinguishable from missing rows (404).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use nephra_core::error::CoreError;
use nephra_core::types::{DbId, Timestamp};
use nephra_db::models::notification::{
    NewNotification, Notification, NotificationCategory, NotificationFilter,
    NotificationPriority, NotificationType, RelatedEntityType,
};
use nephra_db::repositories::{NotificationRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::PageParams;
use crate::response::{ApiResponse, Pagination};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Payload of `GET /notifications`.
#[derive(Debug, Serialize)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub pagination: Pagination,
}

/// Body of `POST /notifications/broadcast`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastRequest {
    pub user_ids: Vec<DbId>,
    #[serde(flatten)]
    pub notification: BroadcastTemplate,
}

/// The notification fields of a broadcast, without a recipient (each entry
/// of `userIds` becomes one).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastTemplate {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    #[serde(default)]
    pub priority: NotificationPriority,
    pub category: NotificationCategory,
    pub related_entity_type: Option<RelatedEntityType>,
    pub related_entity_id: Option<DbId>,
    pub data: Option<serde_json::Value>,
    pub expires_at: Option<Timestamp>,
}

/// Payload of `POST /notifications/broadcast`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastResult {
    pub notifications: Vec<Notification>,
    pub count: usize,
    /// Recipient ids that were skipped (unknown/inactive) or failed to insert.
    pub failed_user_ids: Vec<DbId>,
}

// ---------------------------------------------------------------------------
// Inbox reads
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications
///
/// List the authenticated user's active notifications, newest first, with
/// optional type/category/priority/isRead filters.
pub async fn list_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
    Query(filter): Query<NotificationFilter>,
) -> AppResult<Json<ApiResponse<NotificationList>>> {
    let (notifications, total) = NotificationRepo::list_for_recipient(
        &state.pool,
        auth.user_id,
        &filter,
        page.limit(),
        page.offset(),
    )
    .await?;

    let pagination = Pagination::new(page.page(), page.limit(), total);

    Ok(Json(ApiResponse::ok(NotificationList {
        notifications,
        pagination,
    })))
}

/// GET /api/v1/notifications/unread-count
///
/// Return the number of unread, unexpired notifications for the caller.
pub async fn unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let count = NotificationRepo::unread_count(&state.pool, auth.user_id).await?;

    Ok(Json(ApiResponse::ok(serde_json::json!({ "count": count }))))
}

/// GET /api/v1/notifications/{id}
///
/// Fetch a single notification. 404 both for unknown ids and for rows
/// owned by someone else.
pub async fn get_notification(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<ApiResponse<Notification>>> {
    let notification = NotificationRepo::get_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Notification",
            id,
        }))?;

    Ok(Json(ApiResponse::ok(notification)))
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

/// POST /api/v1/notifications
///
/// Direct creation by an authorized human action. The recipient must be an
/// existing active user at creation time; lengths and enum membership are
/// validated server-side.
pub async fn create_notification(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(mut input): Json<NewNotification>,
) -> AppResult<impl IntoResponse> {
    input.created_by = Some(auth.user_id);
    input.validated(Utc::now()).map_err(AppError::Core)?;

    if !UserRepo::is_active(&state.pool, input.recipient_id).await? {
        return Err(AppError::Core(CoreError::Validation(format!(
            "recipient {} is not an active user",
            input.recipient_id
        ))));
    }

    let notification = NotificationRepo::create(&state.pool, &input).await?;
    tracing::info!(
        notification_id = notification.id,
        recipient_id = notification.recipient_id,
        created_by = auth.user_id,
        "Notification created"
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(notification))))
}

/// POST /api/v1/notifications/broadcast
///
/// Administrative fan-out of one message to an explicit recipient list.
/// Each recipient gets an independent row; a bad recipient id never aborts
/// the rest.
pub async fn broadcast_notification(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<BroadcastRequest>,
) -> AppResult<impl IntoResponse> {
    if input.user_ids.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "userIds must not be empty".into(),
        )));
    }

    let template = NewNotification {
        title: input.notification.title,
        message: input.notification.message,
        notification_type: input.notification.notification_type,
        priority: input.notification.priority,
        category: input.notification.category,
        // Replaced per recipient below; validated() does not inspect it.
        recipient_id: 0,
        related_entity_type: input.notification.related_entity_type,
        related_entity_id: input.notification.related_entity_id,
        data: input.notification.data,
        created_by: Some(admin.user_id),
        expires_at: input.notification.expires_at,
    };
    template.validated(Utc::now()).map_err(AppError::Core)?;

    // Partition recipients up front so unknown/inactive users are reported
    // without attempting an insert that would hit the FK.
    let mut valid_ids = Vec::with_capacity(input.user_ids.len());
    let mut failed_user_ids = Vec::new();
    for &user_id in &input.user_ids {
        if UserRepo::is_active(&state.pool, user_id).await? {
            valid_ids.push(user_id);
        } else {
            failed_user_ids.push(user_id);
        }
    }

    let (notifications, insert_failures) =
        NotificationRepo::create_broadcast(&state.pool, &template, &valid_ids).await?;
    failed_user_ids.extend(insert_failures);

    tracing::info!(
        created = notifications.len(),
        failed = failed_user_ids.len(),
        created_by = admin.user_id,
        "Broadcast notification sent"
    );

    let count = notifications.len();
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(BroadcastResult {
            notifications,
            count,
            failed_user_ids,
        })),
    ))
}

// ---------------------------------------------------------------------------
// Read-state mutation
// ---------------------------------------------------------------------------

/// PATCH /api/v1/notifications/{id}/read
///
/// Mark a single notification as read. Idempotent: repeating the call
/// returns the already-read row without error.
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<ApiResponse<Notification>>> {
    let notification = NotificationRepo::mark_read(&state.pool, id, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Notification",
            id,
        }))?;

    Ok(Json(ApiResponse::ok(notification)))
}

/// PATCH /api/v1/notifications/mark-all-read
///
/// Mark all of the caller's notifications as read; returns the count.
pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let modified = NotificationRepo::mark_all_read(&state.pool, auth.user_id).await?;

    Ok(Json(ApiResponse::ok(
        serde_json::json!({ "modifiedCount": modified }),
    )))
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

/// DELETE /api/v1/notifications/{id}
///
/// Delete a single notification owned by the caller.
pub async fn delete_notification(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<ApiResponse<Notification>>> {
    let notification = NotificationRepo::remove(&state.pool, id, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Notification",
            id,
        }))?;

    tracing::info!(notification_id = id, user_id = auth.user_id, "Notification deleted");

    Ok(Json(ApiResponse::ok(notification)))
}

/// DELETE /api/v1/notifications/clear-all
///
/// Delete all of the caller's notifications; returns the count.
pub async fn clear_all(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let deleted = NotificationRepo::remove_all(&state.pool, auth.user_id).await?;

    tracing::info!(deleted, user_id = auth.user_id, "Cleared all notifications");

    Ok(Json(ApiResponse::ok(
        serde_json::json!({ "deletedCount": deleted }),
    )))
}
