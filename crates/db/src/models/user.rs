//! User entity model (read-only collaborator view).
//!
//! User CRUD and credential management live in the account service; this
//! crate only reads users to validate notification recipients and to expand
//! alert fan-out across active clinical staff.

use nephra_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `users` table joined with its role name.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: String,
    /// Resolved role name (e.g. `"doctor"`, `"nurse"`, `"admin"`).
    pub role: String,
    pub is_active: bool,
    pub created_at: Timestamp,
}
