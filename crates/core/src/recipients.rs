//! Alert recipient resolution.
//!
//! Pure logic — the dispatcher fetches the patient and the currently active
//! staff and passes them in, so resolution always reflects state at
//! evaluation time (nothing here caches).

use crate::roles::can_receive_lab_alerts;
use crate::types::DbId;

/// Expiry for the assigned clinician's copy of an alert.
pub const PRIMARY_EXPIRY_HOURS: i64 = 24;

/// Expiry for every other eligible staff member's copy.
pub const SECONDARY_EXPIRY_HOURS: i64 = 12;

/// The slice of patient state recipient resolution needs.
#[derive(Debug, Clone)]
pub struct PatientRef {
    pub id: DbId,
    pub name: String,
    /// The formally assigned primary clinician, if any.
    pub assigned_doctor_id: Option<DbId>,
}

/// An active staff member, as returned by the user directory.
#[derive(Debug, Clone)]
pub struct StaffMember {
    pub user_id: DbId,
    pub role: String,
}

/// One resolved recipient for a triggering event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientSpec {
    pub user_id: DbId,
    pub expiry_hours: i64,
    pub is_primary: bool,
}

/// Compute who must be told about critical findings for a patient.
///
/// The assigned clinician (when present) is the single primary recipient
/// with a longer-lived alert. Every *other* active staff member whose role
/// passes [`can_receive_lab_alerts`] gets a secondary alert — the primary
/// is excluded from that set so one event never reaches them twice. With
/// no assigned clinician, all eligible staff are secondary recipients.
///
/// Recipients must be active users at creation time, so the assignment is
/// honoured only when the assigned clinician appears in `active_staff` — a
/// patient whose clinician has since been deactivated falls back to the
/// all-secondary fan-out.
pub fn resolve(patient: &PatientRef, active_staff: &[StaffMember]) -> Vec<RecipientSpec> {
    let mut recipients = Vec::new();

    let primary_id = patient
        .assigned_doctor_id
        .filter(|id| active_staff.iter().any(|staff| staff.user_id == *id));

    if let Some(doctor_id) = primary_id {
        recipients.push(RecipientSpec {
            user_id: doctor_id,
            expiry_hours: PRIMARY_EXPIRY_HOURS,
            is_primary: true,
        });
    }

    for staff in active_staff {
        if !can_receive_lab_alerts(&staff.role) {
            continue;
        }
        if primary_id == Some(staff.user_id) {
            continue;
        }
        recipients.push(RecipientSpec {
            user_id: staff.user_id,
            expiry_hours: SECONDARY_EXPIRY_HOURS,
            is_primary: false,
        });
    }

    recipients
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::{ROLE_ADMIN, ROLE_DOCTOR, ROLE_NURSE};

    fn staff(user_id: DbId, role: &str) -> StaffMember {
        StaffMember {
            user_id,
            role: role.to_string(),
        }
    }

    fn patient(assigned_doctor_id: Option<DbId>) -> PatientRef {
        PatientRef {
            id: 1,
            name: "Alia Hassan".to_string(),
            assigned_doctor_id,
        }
    }

    #[test]
    fn assigned_doctor_is_primary_with_long_expiry() {
        let staff_list = [staff(10, ROLE_DOCTOR), staff(11, ROLE_NURSE)];
        let recipients = resolve(&patient(Some(10)), &staff_list);

        let primary = recipients.iter().find(|r| r.is_primary).unwrap();
        assert_eq!(primary.user_id, 10);
        assert_eq!(primary.expiry_hours, PRIMARY_EXPIRY_HOURS);
    }

    #[test]
    fn primary_never_appears_in_secondary_set() {
        let staff_list = [
            staff(10, ROLE_DOCTOR),
            staff(11, ROLE_DOCTOR),
            staff(12, ROLE_NURSE),
        ];
        let recipients = resolve(&patient(Some(10)), &staff_list);

        assert_eq!(recipients.len(), 3);
        let secondary_ids: Vec<DbId> = recipients
            .iter()
            .filter(|r| !r.is_primary)
            .map(|r| r.user_id)
            .collect();
        assert!(!secondary_ids.contains(&10));
        assert!(secondary_ids.contains(&11));
        assert!(secondary_ids.contains(&12));
    }

    #[test]
    fn secondaries_get_short_expiry() {
        let staff_list = [staff(10, ROLE_DOCTOR), staff(11, ROLE_NURSE)];
        let recipients = resolve(&patient(Some(10)), &staff_list);

        for secondary in recipients.iter().filter(|r| !r.is_primary) {
            assert_eq!(secondary.expiry_hours, SECONDARY_EXPIRY_HOURS);
        }
    }

    #[test]
    fn no_assigned_doctor_means_all_eligible_staff_secondary() {
        let staff_list = [
            staff(10, ROLE_DOCTOR),
            staff(11, ROLE_NURSE),
            staff(12, ROLE_NURSE),
        ];
        let recipients = resolve(&patient(None), &staff_list);

        assert_eq!(recipients.len(), 3);
        assert!(recipients.iter().all(|r| !r.is_primary));
        assert!(recipients
            .iter()
            .all(|r| r.expiry_hours == SECONDARY_EXPIRY_HOURS));
    }

    #[test]
    fn ineligible_roles_are_skipped() {
        let staff_list = [staff(10, ROLE_ADMIN), staff(11, ROLE_NURSE)];
        let recipients = resolve(&patient(None), &staff_list);

        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].user_id, 11);
    }

    #[test]
    fn deactivated_assigned_doctor_is_dropped() {
        // The assignment is only honoured for a currently active clinician;
        // otherwise the event falls back to the all-secondary fan-out.
        let staff_list = [staff(11, ROLE_NURSE)];
        let recipients = resolve(&patient(Some(10)), &staff_list);

        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].user_id, 11);
        assert!(!recipients[0].is_primary);
        assert_eq!(recipients[0].expiry_hours, SECONDARY_EXPIRY_HOURS);
    }
}
