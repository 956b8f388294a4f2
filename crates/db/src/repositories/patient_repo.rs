//! Read-only repository for the `patients` table.

use sqlx::PgPool;

use nephra_core::types::DbId;

use crate::models::patient::Patient;

const COLUMNS: &str = "id, name, assigned_doctor_id, is_active, created_at";

/// Provides patient lookups for recipient resolution.
pub struct PatientRepo;

impl PatientRepo {
    /// Find a patient by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Patient>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM patients WHERE id = $1");
        sqlx::query_as::<_, Patient>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
