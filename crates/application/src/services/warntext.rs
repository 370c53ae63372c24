//! Warning text generation
//!
//! Maps the aggregate risk score onto one of three fixed German message
//! templates, or no message at all below the info threshold.

use domain::DomainError;
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;

/// Escalation thresholds for the warning text
///
/// Each value must lie in [0, 1] and the three must be ascending
/// (`info <= warning <= critical`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WarnThresholds {
    #[serde(default = "default_info")]
    pub info: f64,
    #[serde(default = "default_warning")]
    pub warning: f64,
    #[serde(default = "default_critical")]
    pub critical: f64,
}

const fn default_info() -> f64 {
    0.3
}

const fn default_warning() -> f64 {
    0.6
}

const fn default_critical() -> f64 {
    0.9
}

impl Default for WarnThresholds {
    fn default() -> Self {
        Self {
            info: default_info(),
            warning: default_warning(),
            critical: default_critical(),
        }
    }
}

impl WarnThresholds {
    fn validate(&self) -> Result<(), ApplicationError> {
        for (name, value) in [
            ("info", self.info),
            ("warning", self.warning),
            ("critical", self.critical),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(DomainError::ValidationError(format!(
                    "warn threshold '{name}' must be between 0 and 1, got {value}"
                ))
                .into());
            }
        }
        if self.info > self.warning || self.warning > self.critical {
            return Err(DomainError::ValidationError(
                "warn thresholds must be ascending: info <= warning <= critical".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

/// Generate the warning text for a risk score
///
/// Returns `None` when the risk is below the info threshold. The
/// percentage in the text is the risk truncated to whole percent.
///
/// # Errors
///
/// Rejects non-finite or out-of-range risk values and inconsistent
/// thresholds.
pub fn generate_warntext(
    risk: f64,
    thresholds: &WarnThresholds,
) -> Result<Option<String>, ApplicationError> {
    if !risk.is_finite() || !(0.0..=1.0).contains(&risk) {
        return Err(
            DomainError::ValidationError(format!("risk must be between 0 and 1, got {risk}"))
                .into(),
        );
    }
    thresholds.validate()?;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let percent = (risk * 100.0) as u32;

    let text = if risk < thresholds.info {
        None
    } else if risk >= thresholds.critical {
        Some(format!("ALARM! Sehr hohes Wetterrisiko - {percent}%"))
    } else if risk >= thresholds.warning {
        Some(format!("WARNUNG: Das Wetter-Risiko liegt bei {percent}%"))
    } else {
        Some(format!(
            "WARNUNG: Leicht erhöhte Wettergefahr - Risiko: {percent}%"
        ))
    };

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_risk_produces_no_text() {
        let text = generate_warntext(0.0, &WarnThresholds::default()).unwrap();
        assert!(text.is_none());
    }

    #[test]
    fn below_info_produces_no_text() {
        let text = generate_warntext(0.29, &WarnThresholds::default()).unwrap();
        assert!(text.is_none());
    }

    #[test]
    fn info_tier_produces_mild_warning() {
        let text = generate_warntext(0.3, &WarnThresholds::default())
            .unwrap()
            .unwrap();
        assert_eq!(text, "WARNUNG: Leicht erhöhte Wettergefahr - Risiko: 30%");
    }

    #[test]
    fn warning_tier_produces_warning() {
        let text = generate_warntext(0.75, &WarnThresholds::default())
            .unwrap()
            .unwrap();
        assert_eq!(text, "WARNUNG: Das Wetter-Risiko liegt bei 75%");
    }

    #[test]
    fn critical_tier_produces_alarm_with_percentage() {
        let text = generate_warntext(0.9, &WarnThresholds::default())
            .unwrap()
            .unwrap();
        assert_eq!(text, "ALARM! Sehr hohes Wetterrisiko - 90%");
    }

    #[test]
    fn percentage_is_truncated() {
        let text = generate_warntext(0.999, &WarnThresholds::default())
            .unwrap()
            .unwrap();
        assert!(text.contains("99%"));
    }

    #[test]
    fn out_of_range_risk_is_rejected() {
        assert!(generate_warntext(-0.1, &WarnThresholds::default()).is_err());
        assert!(generate_warntext(1.1, &WarnThresholds::default()).is_err());
    }

    #[test]
    fn non_finite_risk_is_rejected() {
        assert!(generate_warntext(f64::NAN, &WarnThresholds::default()).is_err());
        assert!(generate_warntext(f64::INFINITY, &WarnThresholds::default()).is_err());
    }

    #[test]
    fn descending_thresholds_are_rejected() {
        let thresholds = WarnThresholds {
            info: 0.6,
            warning: 0.3,
            critical: 0.9,
        };
        assert!(generate_warntext(0.5, &thresholds).is_err());
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let thresholds = WarnThresholds {
            info: 0.3,
            warning: 0.6,
            critical: 1.5,
        };
        assert!(generate_warntext(0.5, &thresholds).is_err());
    }

    #[test]
    fn equal_thresholds_are_allowed() {
        let thresholds = WarnThresholds {
            info: 0.5,
            warning: 0.5,
            critical: 0.5,
        };
        let text = generate_warntext(0.5, &thresholds).unwrap().unwrap();
        assert!(text.starts_with("ALARM!"));
    }
}
