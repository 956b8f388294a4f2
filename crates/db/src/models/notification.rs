//! Notification entity model and DTOs.
//!
//! A notification is an immutable fact once written: only its read-state
//! changes afterwards, and only by its single recipient. Closed-set columns
//! map to PostgreSQL enum types created in the notifications migration.

use nephra_core::error::CoreError;
use nephra_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Visual/semantic severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    Info,
    Warning,
    Critical,
    Success,
}

/// Queueing/sort weight. Defaults to [`Medium`](NotificationPriority::Medium).
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "notification_priority", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Default for NotificationPriority {
    fn default() -> Self {
        Self::Medium
    }
}

/// Routing/filtering dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "notification_category", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationCategory {
    PatientAlert,
    LabResult,
    AppointmentReminder,
    DialysisAlert,
    AiPrediction,
    SystemAlert,
}

/// Closed set of entity kinds a notification may weakly reference.
///
/// Lookup-only: never an ownership edge, so deleting the referenced entity
/// does not touch the notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "related_entity_type", rename_all = "snake_case")]
pub enum RelatedEntityType {
    Patient,
    DialysisSession,
    MonthlyInvestigation,
    User,
}

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: DbId,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub priority: NotificationPriority,
    pub category: NotificationCategory,
    /// The single owning recipient. Each recipient gets its own row even
    /// when one triggering event fans out to many users.
    pub recipient_id: DbId,
    pub is_read: bool,
    /// Present iff `is_read` is true.
    pub read_at: Option<Timestamp>,
    pub related_entity_type: Option<RelatedEntityType>,
    pub related_entity_id: Option<DbId>,
    /// Free-form payload: `actionRequired`, `actionUrl`, `labValue`,
    /// `appointmentDate`/`appointmentType`.
    pub data: Option<serde_json::Value>,
    /// Issuing identity; `None` for system-generated notifications.
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    /// Once passed, the row is excluded from active inbox queries and is
    /// eligible for background reclamation.
    pub expires_at: Option<Timestamp>,
}

/// Maximum title length accepted at creation.
pub const MAX_TITLE_LEN: u64 = 200;

/// Maximum message length accepted at creation.
pub const MAX_MESSAGE_LEN: u64 = 500;

/// DTO for creating a notification.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 500))]
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    #[serde(default)]
    pub priority: NotificationPriority,
    pub category: NotificationCategory,
    pub recipient_id: DbId,
    pub related_entity_type: Option<RelatedEntityType>,
    pub related_entity_id: Option<DbId>,
    pub data: Option<serde_json::Value>,
    pub created_by: Option<DbId>,
    pub expires_at: Option<Timestamp>,
}

impl NewNotification {
    /// Validate bounded lengths and the expiry invariant.
    ///
    /// `expires_at`, when present, must be strictly after `now` (the
    /// creation timestamp the caller is about to assign).
    pub fn validated(&self, now: Timestamp) -> Result<(), CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;

        if let Some(expires_at) = self.expires_at {
            if expires_at <= now {
                return Err(CoreError::Validation(
                    "expiresAt must be strictly after creation time".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Optional filters for listing a recipient's notifications.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFilter {
    #[serde(rename = "type")]
    pub notification_type: Option<NotificationType>,
    pub category: Option<NotificationCategory>,
    pub priority: Option<NotificationPriority>,
    pub is_read: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn minimal(expires_at: Option<Timestamp>) -> NewNotification {
        NewNotification {
            title: "Critical Lab Result".to_string(),
            message: "Hemoglobin out of range".to_string(),
            notification_type: NotificationType::Critical,
            priority: NotificationPriority::Urgent,
            category: NotificationCategory::LabResult,
            recipient_id: 1,
            related_entity_type: None,
            related_entity_id: None,
            data: None,
            created_by: None,
            expires_at,
        }
    }

    #[test]
    fn valid_spec_passes() {
        let now = Utc::now();
        let input = minimal(Some(now + Duration::hours(24)));
        assert!(input.validated(now).is_ok());
    }

    #[test]
    fn overlong_title_is_rejected() {
        let now = Utc::now();
        let mut input = minimal(None);
        input.title = "x".repeat(201);
        assert!(matches!(
            input.validated(now),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn overlong_message_is_rejected() {
        let now = Utc::now();
        let mut input = minimal(None);
        input.message = "x".repeat(501);
        assert!(matches!(
            input.validated(now),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn expiry_not_after_creation_is_rejected() {
        let now = Utc::now();
        let input = minimal(Some(now));
        assert!(matches!(
            input.validated(now),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn enum_wire_names_match_api_format() {
        let json = serde_json::to_value(NotificationCategory::PatientAlert).unwrap();
        assert_eq!(json, "PATIENT_ALERT");
        let json = serde_json::to_value(NotificationType::Critical).unwrap();
        assert_eq!(json, "CRITICAL");
        let parsed: NotificationPriority = serde_json::from_value("URGENT".into()).unwrap();
        assert_eq!(parsed, NotificationPriority::Urgent);
    }
}
