//! Error taxonomy for the uncertainty model and synthetic sampler.

use std::fmt;

use thiserror::Error;

use crate::algo::{BSplineError, StatsError};
use crate::photometry::Band;

/// A star whose uncertainty could not be computed
#[derive(Debug, Clone, PartialEq)]
pub struct OffendingStar {
    /// Row index in the input sample
    pub index: usize,
    /// True magnitude of the star in the failing band
    pub magnitude: f64,
    /// Observation count used for the star in the failing band
    pub n_obs: u32,
}

impl fmt::Display for OffendingStar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} (mag={}, n_obs={})",
            self.index, self.magnitude, self.n_obs
        )
    }
}

fn band_suffix(band: &Option<Band>) -> String {
    band.map(|b| format!(" in band {b}")).unwrap_or_default()
}

fn summarize(stars: &[OffendingStar]) -> String {
    const SHOWN: usize = 5;
    let mut parts: Vec<String> = stars.iter().take(SHOWN).map(|s| s.to_string()).collect();
    if stars.len() > SHOWN {
        parts.push(format!("... {} more", stars.len() - SHOWN));
    }
    format!("{} star(s): {}", stars.len(), parts.join(", "))
}

/// Errors raised by the photometric uncertainty pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MagErrError {
    /// Reference table or calibration cannot produce a usable model
    #[error("Configuration error{}: {reason}", band_suffix(.band))]
    Configuration { band: Option<Band>, reason: String },

    /// Caller supplied an unusable argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Uncertainty computation hit a division by zero or a non-finite value
    #[error("Numerical error in band {band}: {reason} for {}", summarize(.stars))]
    Numerical {
        band: Band,
        reason: String,
        stars: Vec<OffendingStar>,
    },
}

impl MagErrError {
    pub(crate) fn spline(band: Band, err: BSplineError) -> Self {
        MagErrError::Configuration {
            band: Some(band),
            reason: err.to_string(),
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        MagErrError::Configuration {
            band: None,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        MagErrError::InvalidArgument(reason.into())
    }
}

impl From<StatsError> for MagErrError {
    fn from(err: StatsError) -> Self {
        MagErrError::InvalidArgument(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MagErrError>;
