//! Read-only repository for the `users` table.

use sqlx::PgPool;

use nephra_core::recipients::StaffMember;
use nephra_core::roles::LAB_ALERT_ROLES;
use nephra_core::types::DbId;

use crate::models::user::User;

/// Column list shared across queries (role name resolved via join).
const COLUMNS: &str = "u.id, u.username, u.email, r.name AS role, u.is_active, u.created_at";

/// Provides user lookups for recipient validation and alert fan-out.
pub struct UserRepo;

impl UserRepo {
    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users u JOIN roles r ON u.role_id = r.id WHERE u.id = $1"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether a user exists and is currently active.
    ///
    /// Notification creation validates recipients with this at write time;
    /// a later deactivation does not retroactively affect existing rows.
    pub async fn is_active(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let found: Option<bool> =
            sqlx::query_scalar("SELECT is_active FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(found.unwrap_or(false))
    }

    /// All currently active staff holding an alert-eligible clinical role.
    pub async fn list_active_alert_staff(pool: &PgPool) -> Result<Vec<StaffMember>, sqlx::Error> {
        let roles: Vec<String> = LAB_ALERT_ROLES.iter().map(|r| r.to_string()).collect();
        let rows: Vec<(DbId, String)> = sqlx::query_as(
            "SELECT u.id, r.name FROM users u \
             JOIN roles r ON u.role_id = r.id \
             WHERE r.name = ANY($1) AND u.is_active = true",
        )
        .bind(&roles)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(user_id, role)| StaffMember { user_id, role })
            .collect())
    }
}
