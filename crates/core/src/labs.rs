//! Critical-value evaluation for lab panels.
//!
//! Pure logic — no database access. The caller supplies the panel and the
//! threshold configuration and receives zero or more [`Finding`]s. Bands are
//! data, not code: adding a parameter means adding a [`LabThreshold`] entry
//! and teaching [`LabPanel::value_of`] where the value lives, never touching
//! dispatch logic.

use serde::{Deserialize, Serialize};

use crate::lab_params::{
    PARAM_CREATININE_PRE, PARAM_HEMOGLOBIN, PARAM_PHOSPHATE, PARAM_POTASSIUM_PRE,
};

/// Severity of a detected abnormal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FindingSeverity {
    Warning,
    Critical,
}

/// A single out-of-range lab parameter detected in one panel.
///
/// Transient: consumed by the dispatcher to build notification rows, never
/// persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    /// Canonical parameter key (see [`crate::lab_params`]).
    pub parameter: String,
    /// The observed value that fell outside the critical band.
    pub value: f64,
    /// Human-readable normal range shown to the recipient.
    pub normal_range: String,
    pub severity: FindingSeverity,
}

/// A lab panel as recorded by the investigation-write collaborator.
///
/// Absent fields were not measured; absence never produces a finding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabPanel {
    /// Hemoglobin in g/dL.
    pub hemoglobin: Option<f64>,
    /// Pre-session serum creatinine in µmol/L.
    pub serum_creatinine_pre: Option<f64>,
    /// Pre-session serum potassium in mmol/L.
    pub serum_potassium_pre: Option<f64>,
    /// Serum phosphate in mmol/L.
    pub serum_phosphate: Option<f64>,
}

impl LabPanel {
    /// Look up a panel value by canonical parameter key.
    pub fn value_of(&self, parameter: &str) -> Option<f64> {
        match parameter {
            PARAM_HEMOGLOBIN => self.hemoglobin,
            PARAM_CREATININE_PRE => self.serum_creatinine_pre,
            PARAM_POTASSIUM_PRE => self.serum_potassium_pre,
            PARAM_PHOSPHATE => self.serum_phosphate,
            _ => None,
        }
    }
}

/// A critical band for one parameter.
///
/// The *normal* band is inclusive of the named bounds: a value is critical
/// only when strictly below `critical_below` or strictly above
/// `critical_above`.
#[derive(Debug, Clone)]
pub struct LabThreshold {
    pub parameter: String,
    /// Critical when the value is strictly below this bound.
    pub critical_below: Option<f64>,
    /// Critical when the value is strictly above this bound.
    pub critical_above: Option<f64>,
    /// Normal range string shown in notifications, e.g. `"12.0-15.5 g/dL"`.
    pub normal_range: String,
}

impl LabThreshold {
    fn is_critical(&self, value: f64) -> bool {
        let below = self.critical_below.is_some_and(|bound| value < bound);
        let above = self.critical_above.is_some_and(|bound| value > bound);
        below || above
    }
}

/// The full set of configured critical bands.
#[derive(Debug, Clone)]
pub struct LabThresholds {
    thresholds: Vec<LabThreshold>,
}

impl LabThresholds {
    /// Build a threshold set from caller-supplied bands.
    pub fn new(thresholds: Vec<LabThreshold>) -> Self {
        Self { thresholds }
    }

    /// Iterate over the configured bands.
    pub fn iter(&self) -> impl Iterator<Item = &LabThreshold> {
        self.thresholds.iter()
    }
}

impl Default for LabThresholds {
    /// The reference bands for dialysis patients.
    fn default() -> Self {
        Self::new(vec![
            LabThreshold {
                parameter: PARAM_HEMOGLOBIN.to_string(),
                critical_below: Some(7.0),
                critical_above: Some(18.0),
                normal_range: "12.0-15.5 g/dL".to_string(),
            },
            LabThreshold {
                parameter: PARAM_CREATININE_PRE.to_string(),
                critical_below: None,
                critical_above: Some(1200.0),
                normal_range: "60-120 µmol/L".to_string(),
            },
            LabThreshold {
                parameter: PARAM_POTASSIUM_PRE.to_string(),
                critical_below: Some(2.5),
                critical_above: Some(6.5),
                normal_range: "3.5-5.0 mmol/L".to_string(),
            },
            LabThreshold {
                parameter: PARAM_PHOSPHATE.to_string(),
                critical_below: None,
                critical_above: Some(2.5),
                normal_range: "0.8-1.5 mmol/L".to_string(),
            },
        ])
    }
}

/// Screen a panel against the configured bands.
///
/// Deterministic and pure. Each out-of-range parameter produces its own
/// independent [`Finding`]; findings are never merged.
pub fn evaluate(panel: &LabPanel, thresholds: &LabThresholds) -> Vec<Finding> {
    let mut findings = Vec::new();

    for threshold in thresholds.iter() {
        let Some(value) = panel.value_of(&threshold.parameter) else {
            continue;
        };
        if threshold.is_critical(value) {
            findings.push(Finding {
                parameter: threshold.parameter.clone(),
                value,
                normal_range: threshold.normal_range.clone(),
                severity: FindingSeverity::Critical,
            });
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel_with_hemoglobin(value: f64) -> LabPanel {
        LabPanel {
            hemoglobin: Some(value),
            ..Default::default()
        }
    }

    #[test]
    fn empty_panel_produces_no_findings() {
        let findings = evaluate(&LabPanel::default(), &LabThresholds::default());
        assert!(findings.is_empty());
    }

    #[test]
    fn normal_values_produce_no_findings() {
        let panel = LabPanel {
            hemoglobin: Some(13.0),
            serum_creatinine_pre: Some(800.0),
            serum_potassium_pre: Some(4.2),
            serum_phosphate: Some(1.4),
        };
        let findings = evaluate(&panel, &LabThresholds::default());
        assert!(findings.is_empty());
    }

    #[test]
    fn hemoglobin_boundaries_are_not_critical() {
        // The normal band is inclusive of the named bounds: exactly 7.0 and
        // exactly 18.0 must not fire.
        for boundary in [7.0, 18.0] {
            let findings = evaluate(&panel_with_hemoglobin(boundary), &LabThresholds::default());
            assert!(findings.is_empty(), "Hb {boundary} must not be critical");
        }
    }

    #[test]
    fn hemoglobin_outside_band_is_critical() {
        for (value, label) in [(6.9, "low"), (18.1, "high")] {
            let findings = evaluate(&panel_with_hemoglobin(value), &LabThresholds::default());
            assert_eq!(findings.len(), 1, "Hb {value} ({label}) must be critical");
            assert_eq!(findings[0].parameter, PARAM_HEMOGLOBIN);
            assert_eq!(findings[0].value, value);
            assert_eq!(findings[0].severity, FindingSeverity::Critical);
            assert_eq!(findings[0].normal_range, "12.0-15.5 g/dL");
        }
    }

    #[test]
    fn creatinine_has_no_lower_bound() {
        let panel = LabPanel {
            serum_creatinine_pre: Some(10.0),
            ..Default::default()
        };
        assert!(evaluate(&panel, &LabThresholds::default()).is_empty());

        let panel = LabPanel {
            serum_creatinine_pre: Some(1500.0),
            ..Default::default()
        };
        assert_eq!(evaluate(&panel, &LabThresholds::default()).len(), 1);
    }

    #[test]
    fn multiple_abnormal_parameters_produce_independent_findings() {
        let panel = LabPanel {
            hemoglobin: Some(6.5),
            serum_creatinine_pre: Some(1500.0),
            serum_potassium_pre: Some(7.0),
            serum_phosphate: Some(1.0),
        };
        let findings = evaluate(&panel, &LabThresholds::default());
        assert_eq!(findings.len(), 3);

        let parameters: Vec<&str> = findings.iter().map(|f| f.parameter.as_str()).collect();
        assert!(parameters.contains(&PARAM_HEMOGLOBIN));
        assert!(parameters.contains(&PARAM_CREATININE_PRE));
        assert!(parameters.contains(&PARAM_POTASSIUM_PRE));
    }

    #[test]
    fn custom_thresholds_extend_without_touching_dispatch() {
        // A tighter custom band for phosphate flags a value the defaults allow.
        let thresholds = LabThresholds::new(vec![LabThreshold {
            parameter: PARAM_PHOSPHATE.to_string(),
            critical_below: None,
            critical_above: Some(1.2),
            normal_range: "0.8-1.2 mmol/L".to_string(),
        }]);
        let panel = LabPanel {
            serum_phosphate: Some(1.4),
            ..Default::default()
        };
        let findings = evaluate(&panel, &thresholds);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].normal_range, "0.8-1.2 mmol/L");
    }
}
