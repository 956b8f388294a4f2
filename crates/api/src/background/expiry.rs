//! Periodic reclamation of expired notifications.
//!
//! Expired rows are already invisible to inbox queries; this task is the
//! best-effort garbage collector that physically removes them. Runs on a
//! fixed interval using `tokio::time::interval`.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use nephra_db::repositories::NotificationRepo;

/// How often the reclamation job runs by default (seconds).
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600; // 1 hour

/// Run the notification expiry reclamation loop.
///
/// Deletes rows whose `expires_at` has passed. The interval can be
/// overridden via `NOTIFICATION_SWEEP_INTERVAL_SECS`. Runs until `cancel`
/// is triggered.
pub async fn run(pool: PgPool, cancel: CancellationToken) {
    let sweep_interval_secs: u64 = std::env::var("NOTIFICATION_SWEEP_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS);

    tracing::info!(
        interval_secs = sweep_interval_secs,
        "Notification expiry reclamation started"
    );

    let mut interval = tokio::time::interval(Duration::from_secs(sweep_interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Notification expiry reclamation stopping");
                break;
            }
            _ = interval.tick() => {
                match NotificationRepo::delete_expired(&pool, Utc::now()).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::info!(deleted, "Expiry reclamation: purged expired notifications");
                        } else {
                            tracing::debug!("Expiry reclamation: nothing to purge");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Expiry reclamation: sweep failed");
                    }
                }
            }
        }
    }
}
