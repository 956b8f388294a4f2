//! Lab alert dispatch engine.
//!
//! [`LabAlertDispatcher`] subscribes to the event bus and turns each
//! `investigation.recorded` event into durable notification rows: it screens
//! the lab panel, resolves who must be told, writes one row per
//! finding × recipient, and pushes a lightweight hint to connected
//! recipients. It runs entirely outside the triggering write's path: every
//! failure here is logged and contained, never surfaced to the writer.

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::ws::Message;
use chrono::{Duration, Utc};
use tokio::sync::broadcast;

use nephra_core::lab_params::display_name;
use nephra_core::labs::{evaluate, Finding, LabPanel, LabThresholds};
use nephra_core::recipients::{resolve, PatientRef, RecipientSpec};
use nephra_core::types::{DbId, Timestamp};
use nephra_db::models::notification::{
    NewNotification, NotificationCategory, NotificationPriority, NotificationType,
    RelatedEntityType,
};
use nephra_db::repositories::{NotificationRepo, PatientRepo, UserRepo};
use nephra_db::DbPool;
use nephra_events::{ClinicalEvent, EVENT_INVESTIGATION_RECORDED};

use crate::ws::WsManager;

/// Failures inside the asynchronous alerting pipeline.
///
/// Logged by the run loop; by contract never propagated to the code path
/// that triggered the clinical write, and never retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Invalid event payload: {0}")]
    Payload(String),

    #[error("Patient {0} not found")]
    PatientNotFound(DbId),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Payload of an `investigation.recorded` event.
#[derive(Debug, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestigationRecorded {
    pub patient_id: DbId,
    pub panel: LabPanel,
}

/// Routes recorded lab panels to clinical staff notifications.
pub struct LabAlertDispatcher {
    pool: DbPool,
    ws_manager: Arc<WsManager>,
    thresholds: LabThresholds,
}

impl LabAlertDispatcher {
    /// Create a dispatcher with the given pool, channel manager, and
    /// critical bands.
    pub fn new(pool: DbPool, ws_manager: Arc<WsManager>, thresholds: LabThresholds) -> Self {
        Self {
            pool,
            ws_manager,
            thresholds,
        }
    }

    /// Run the main dispatch loop.
    ///
    /// Subscribes to the event bus via `receiver` and processes each event.
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](nephra_events::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<ClinicalEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if event.event_type != EVENT_INVESTIGATION_RECORDED {
                        continue;
                    }
                    if let Err(e) = self.handle_investigation(&event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to dispatch lab alerts"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Alert dispatcher lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, alert dispatcher shutting down");
                    break;
                }
            }
        }
    }

    /// Process a single recorded investigation.
    ///
    /// No-op when the panel has no critical values. Recipients are resolved
    /// once per event from current patient/staff state; one failed insert
    /// does not prevent the remaining rows from being written.
    async fn handle_investigation(&self, event: &ClinicalEvent) -> Result<(), DispatchError> {
        let recorded: InvestigationRecorded = serde_json::from_value(event.payload.clone())
            .map_err(|e| DispatchError::Payload(e.to_string()))?;

        let findings = evaluate(&recorded.panel, &self.thresholds);
        if findings.is_empty() {
            return Ok(());
        }

        let patient = PatientRepo::find_by_id(&self.pool, recorded.patient_id)
            .await?
            .ok_or(DispatchError::PatientNotFound(recorded.patient_id))?;
        let patient_ref = PatientRef::from(&patient);

        let staff = UserRepo::list_active_alert_staff(&self.pool).await?;
        let recipients = resolve(&patient_ref, &staff);
        if recipients.is_empty() {
            tracing::warn!(
                patient_id = patient_ref.id,
                findings = findings.len(),
                "Critical findings with no eligible recipients"
            );
            return Ok(());
        }

        let rows = build_notifications(&patient_ref, &findings, &recipients, Utc::now());
        tracing::info!(
            patient_id = patient_ref.id,
            findings = findings.len(),
            recipients = recipients.len(),
            rows = rows.len(),
            "Dispatching critical lab alerts"
        );

        for row in &rows {
            match NotificationRepo::create(&self.pool, row).await {
                Ok(notification) => {
                    // Lightweight push hint; disconnected recipients poll
                    // the inbox instead.
                    let hint = serde_json::json!({
                        "type": "notification.new",
                        "notificationId": notification.id,
                        "category": notification.category,
                        "title": notification.title,
                    });
                    self.ws_manager
                        .send_to_user(
                            notification.recipient_id,
                            Message::Text(hint.to_string().into()),
                        )
                        .await;
                }
                Err(e) => {
                    tracing::error!(
                        recipient_id = row.recipient_id,
                        error = %e,
                        "Failed to persist lab alert notification"
                    );
                }
            }
        }

        Ok(())
    }
}

/// Assemble the notification rows for one triggering event.
///
/// Pure: one row per finding × recipient, deduplicated by
/// `(recipient, parameter)` so a recipient never gets the same parameter
/// twice from a single invocation. The primary clinician gets a
/// lab-result-titled row with the longer expiry; secondary recipients get a
/// patient-alert row.
pub fn build_notifications(
    patient: &PatientRef,
    findings: &[Finding],
    recipients: &[RecipientSpec],
    now: Timestamp,
) -> Vec<NewNotification> {
    let mut seen: HashSet<(DbId, &str)> = HashSet::new();
    let mut rows = Vec::with_capacity(findings.len() * recipients.len());

    for recipient in recipients {
        for finding in findings {
            if !seen.insert((recipient.user_id, finding.parameter.as_str())) {
                continue;
            }

            let parameter = display_name(&finding.parameter);
            let (category, title) = if recipient.is_primary {
                (
                    NotificationCategory::LabResult,
                    format!("Critical Lab Result: {parameter}"),
                )
            } else {
                (
                    NotificationCategory::PatientAlert,
                    format!("Critical Patient Alert: {parameter}"),
                )
            };

            rows.push(NewNotification {
                title,
                message: format!(
                    "{} has a critical {} of {} (normal range: {})",
                    patient.name, parameter, finding.value, finding.normal_range
                ),
                notification_type: NotificationType::Critical,
                priority: NotificationPriority::Urgent,
                category,
                recipient_id: recipient.user_id,
                related_entity_type: Some(RelatedEntityType::Patient),
                related_entity_id: Some(patient.id),
                data: Some(serde_json::json!({
                    "actionRequired": true,
                    "labValue": {
                        "parameter": finding.parameter,
                        "value": finding.value,
                        "normalRange": finding.normal_range,
                        "flag": finding.severity,
                    },
                })),
                created_by: None,
                expires_at: Some(now + Duration::hours(recipient.expiry_hours)),
            });
        }
    }

    rows
}
