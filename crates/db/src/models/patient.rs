//! Patient entity model (read-only collaborator view).
//!
//! Patient CRUD is owned by the records service; alerting only needs the
//! patient's display name and the assigned primary clinician.

use nephra_core::recipients::PatientRef;
use nephra_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `patients` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: DbId,
    pub name: String,
    /// The formally assigned primary clinician, if any.
    pub assigned_doctor_id: Option<DbId>,
    pub is_active: bool,
    pub created_at: Timestamp,
}

impl From<&Patient> for PatientRef {
    fn from(patient: &Patient) -> Self {
        PatientRef {
            id: patient.id,
            name: patient.name.clone(),
            assigned_doctor_id: patient.assigned_doctor_id,
        }
    }
}
