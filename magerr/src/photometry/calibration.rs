//! Survey calibration constants for the uncertainty model.
//!
//! The reference observation counts and noise floors are tied to the survey
//! release that produced the tabulated spline curves. They are stored here so a
//! different release can be plugged in without touching the model code.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::PerBand;
use crate::error::{MagErrError, Result};

/// Calibration data accompanying a reference spline table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyCalibration {
    /// Observation count at which each band's curve was tabulated
    pub reference_counts: PerBand<u32>,
    /// Systematic floor added in quadrature to the statistical uncertainty (mag)
    pub noise_floor: PerBand<f64>,
    /// Ratio between the curve's robust dispersion and a standard deviation
    pub robust_sigma_ratio: f64,
    /// Magnitude interval over which the curves may be evaluated
    pub magnitude_domain: (f64, f64),
}

impl SurveyCalibration {
    /// Gaia EDR3 calibration (reference counts 200/20/20)
    pub fn gaia_edr3() -> Self {
        Self {
            reference_counts: PerBand::new(200, 20, 20),
            noise_floor: PerBand::new(0.0027553202, 0.0027901700, 0.0037793818),
            robust_sigma_ratio: 0.67,
            magnitude_domain: (4.0, 21.0),
        }
    }

    /// Check that the constants describe a usable calibration
    pub fn validate(&self) -> Result<()> {
        for (band, &count) in self.reference_counts.iter() {
            if count == 0 {
                return Err(MagErrError::Configuration {
                    band: Some(band),
                    reason: "reference observation count must be positive".into(),
                });
            }
        }

        for (band, &floor) in self.noise_floor.iter() {
            if !floor.is_finite() || floor < 0.0 {
                return Err(MagErrError::Configuration {
                    band: Some(band),
                    reason: format!("noise floor must be finite and non-negative, got {floor}"),
                });
            }
        }

        if !self.robust_sigma_ratio.is_finite() || self.robust_sigma_ratio <= 0.0 {
            return Err(MagErrError::config(format!(
                "robust sigma ratio must be positive, got {}",
                self.robust_sigma_ratio
            )));
        }

        let (lo, hi) = self.magnitude_domain;
        if !lo.is_finite() || !hi.is_finite() || lo >= hi {
            return Err(MagErrError::config(format!(
                "magnitude domain [{lo}, {hi}] is malformed"
            )));
        }

        Ok(())
    }

    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> std::result::Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Load from JSON file
    pub fn load_from_file(path: &Path) -> std::result::Result<Self, std::io::Error> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

impl Default for SurveyCalibration {
    fn default() -> Self {
        Self::gaia_edr3()
    }
}
