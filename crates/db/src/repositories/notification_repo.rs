//! Repository for the `notifications` table.
//!
//! Every query is scoped to a single recipient: a notification row is owned
//! by exactly one user, so there is never a cross-row locking concern. The
//! only contended mutation is read-state, handled with a compare-and-set
//! style UPDATE.

use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};

use nephra_core::types::{DbId, Timestamp};

use crate::models::notification::{NewNotification, Notification, NotificationFilter};

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, title, message, notification_type, priority, category, recipient_id, \
                       is_read, read_at, related_entity_type, related_entity_id, data, \
                       created_by, created_at, expires_at";

/// Provides CRUD operations for notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Insert a notification, returning the created row.
    ///
    /// The caller is responsible for running [`NewNotification::validated`]
    /// first; this method only performs the write.
    pub async fn create(pool: &PgPool, input: &NewNotification) -> Result<Notification, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications \
                 (title, message, notification_type, priority, category, recipient_id, \
                  related_entity_type, related_entity_id, data, created_by, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(&input.title)
            .bind(&input.message)
            .bind(input.notification_type)
            .bind(input.priority)
            .bind(input.category)
            .bind(input.recipient_id)
            .bind(input.related_entity_type)
            .bind(input.related_entity_id)
            .bind(&input.data)
            .bind(input.created_by)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Fan one message out to an explicit recipient list.
    ///
    /// Each recipient gets an independent row. A failed insert for one
    /// recipient never aborts the rest; failures are logged and the
    /// affected user ids returned alongside the created rows.
    pub async fn create_broadcast(
        pool: &PgPool,
        template: &NewNotification,
        user_ids: &[DbId],
    ) -> Result<(Vec<Notification>, Vec<DbId>), sqlx::Error> {
        let mut created = Vec::with_capacity(user_ids.len());
        let mut failed = Vec::new();

        for &user_id in user_ids {
            let mut input = template.clone();
            input.recipient_id = user_id;
            match Self::create(pool, &input).await {
                Ok(notification) => created.push(notification),
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "Broadcast insert failed for recipient");
                    failed.push(user_id);
                }
            }
        }

        Ok((created, failed))
    }

    /// List a recipient's active notifications, newest first.
    ///
    /// Expired rows are excluded. Returns the page of rows plus the total
    /// count matching the same filters.
    pub async fn list_for_recipient(
        pool: &PgPool,
        user_id: DbId,
        filter: &NotificationFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Notification>, i64), sqlx::Error> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM notifications"));
        Self::push_active_filters(&mut query, user_id, filter);
        query.push(" ORDER BY created_at DESC LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let items = query
            .build_query_as::<Notification>()
            .fetch_all(pool)
            .await?;

        let mut count_query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM notifications");
        Self::push_active_filters(&mut count_query, user_id, filter);
        let total: i64 = count_query.build_query_scalar().fetch_one(pool).await?;

        Ok((items, total))
    }

    /// Append the recipient scope, expiry exclusion, and optional filters.
    fn push_active_filters(
        query: &mut QueryBuilder<Postgres>,
        user_id: DbId,
        filter: &NotificationFilter,
    ) {
        query.push(" WHERE recipient_id = ");
        query.push_bind(user_id);
        query.push(" AND (expires_at IS NULL OR expires_at > ");
        query.push_bind(Utc::now());
        query.push(")");

        if let Some(notification_type) = filter.notification_type {
            query.push(" AND notification_type = ");
            query.push_bind(notification_type);
        }
        if let Some(category) = filter.category {
            query.push(" AND category = ");
            query.push_bind(category);
        }
        if let Some(priority) = filter.priority {
            query.push(" AND priority = ");
            query.push_bind(priority);
        }
        if let Some(is_read) = filter.is_read {
            query.push(" AND is_read = ");
            query.push_bind(is_read);
        }
    }

    /// Fetch a single notification owned by the given recipient.
    ///
    /// Returns `None` both for an unknown id and for a row owned by another
    /// user, so callers cannot distinguish "forbidden" from "absent".
    /// Expired rows are still returned here (audit read); active-inbox
    /// queries are where expiry is enforced.
    pub async fn get_by_id(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notifications WHERE id = $1 AND recipient_id = $2");
        sqlx::query_as::<_, Notification>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Mark a single notification as read.
    ///
    /// The update is a single atomic compare-and-set (`AND is_read = false`)
    /// so a concurrent `mark_all_read` cannot produce a lost update.
    /// Idempotent: if the row is already read, the existing row is returned
    /// unchanged. Returns `None` only when the row does not exist for this
    /// recipient.
    pub async fn mark_read(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let query = format!(
            "UPDATE notifications \
             SET is_read = true, read_at = NOW() \
             WHERE id = $1 AND recipient_id = $2 AND is_read = false \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Notification>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        match updated {
            Some(notification) => Ok(Some(notification)),
            // Already read, or absent: re-fetch to tell the two apart.
            None => Self::get_by_id(pool, id, user_id).await,
        }
    }

    /// Mark all unread notifications as read for a recipient.
    ///
    /// Returns the number of rows modified.
    pub async fn mark_all_read(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = true, read_at = NOW() \
             WHERE recipient_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete a single notification owned by the recipient, returning it.
    pub async fn remove(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let query = format!(
            "DELETE FROM notifications WHERE id = $1 AND recipient_id = $2 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete all of a recipient's notifications, returning the count.
    pub async fn remove_all(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notifications WHERE recipient_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Count a recipient's unread, unexpired notifications.
    pub async fn unread_count(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications \
             WHERE recipient_id = $1 AND is_read = false \
               AND (expires_at IS NULL OR expires_at > NOW())",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }

    /// Permanently delete rows whose expiry has passed.
    ///
    /// Used by the background reclamation task; returns the number of rows
    /// removed.
    pub async fn delete_expired(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notifications WHERE expires_at IS NOT NULL AND expires_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
