//! Canonical lab parameter names.
//!
//! These are the keys shared between [`labs::LabPanel`](crate::labs::LabPanel),
//! the threshold configuration, and the notification payloads built from
//! findings. Display names are what clinicians see in alert titles.

/// Hemoglobin (g/dL).
pub const PARAM_HEMOGLOBIN: &str = "hemoglobin";

/// Pre-session serum creatinine (µmol/L).
pub const PARAM_CREATININE_PRE: &str = "serum_creatinine_pre";

/// Pre-session serum potassium (mmol/L).
pub const PARAM_POTASSIUM_PRE: &str = "serum_potassium_pre";

/// Serum phosphate (mmol/L).
pub const PARAM_PHOSPHATE: &str = "serum_phosphate";

/// Human-readable display name for a parameter key.
///
/// Unknown keys fall back to the key itself so alerts for parameters added
/// through threshold configuration still render.
pub fn display_name(parameter: &str) -> &str {
    match parameter {
        PARAM_HEMOGLOBIN => "Hemoglobin",
        PARAM_CREATININE_PRE => "Serum Creatinine (pre-session)",
        PARAM_POTASSIUM_PRE => "Serum Potassium (pre-session)",
        PARAM_PHOSPHATE => "Serum Phosphate",
        other => other,
    }
}
