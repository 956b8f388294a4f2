//! Well-known role name constants and role capabilities.
//!
//! Role names must match the seed data in the `roles` migration. Alert
//! eligibility is expressed as a capability check rather than role-string
//! comparisons at call sites, so new roles can opt in here without touching
//! resolver or channel-layer code.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_DOCTOR: &str = "doctor";
pub const ROLE_NURSE: &str = "nurse";

/// The clinical roles that can act on lab results.
///
/// Used both for durable alert fan-out and for the real-time relay of
/// session/prediction events to role topics.
pub const LAB_ALERT_ROLES: [&str; 2] = [ROLE_DOCTOR, ROLE_NURSE];

/// Whether a role is eligible to receive critical lab alerts.
pub fn can_receive_lab_alerts(role: &str) -> bool {
    LAB_ALERT_ROLES.contains(&role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clinical_roles_receive_lab_alerts() {
        assert!(can_receive_lab_alerts(ROLE_DOCTOR));
        assert!(can_receive_lab_alerts(ROLE_NURSE));
    }

    #[test]
    fn admin_does_not_receive_lab_alerts() {
        assert!(!can_receive_lab_alerts(ROLE_ADMIN));
        assert!(!can_receive_lab_alerts("receptionist"));
    }
}
