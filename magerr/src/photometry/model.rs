//! Log-uncertainty vs magnitude model for the G, BP and RP bands.
//!
//! Each band owns a cubic B-spline giving log10(sigma_mag) as a function of
//! magnitude, tabulated at a fixed reference observation count N_ref. For any
//! other observation count N the curve is shifted by the sqrt(N) law:
//!
//! ```text
//! logU_N(mag) = logU_ref(mag) - log10(sqrt(N) / sqrt(N_ref))
//! ```
//!
//! so more observations always mean a smaller uncertainty.

use log::{debug, info};
use ndarray::Array1;

use super::{Band, PerBand, SurveyCalibration};
use crate::algo::BSpline;
use crate::error::{MagErrError, Result};

/// Polynomial degree of the tabulated curves
pub const SPLINE_DEGREE: usize = 3;

/// Default number of grid points for [`UncertaintyModel::evaluate`]
pub const DEFAULT_GRID_SAMPLES: usize = 1000;

/// One row of the reference spline table.
///
/// Either value may be missing: the table is padded for bands with fewer
/// spline points than the longest band.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SplineRow {
    pub knot: Option<f64>,
    pub coefficient: Option<f64>,
}

impl SplineRow {
    pub fn new(knot: f64, coefficient: f64) -> Self {
        Self {
            knot: Some(knot),
            coefficient: Some(coefficient),
        }
    }

    /// Both values, if present and finite
    fn valid(&self) -> Option<(f64, f64)> {
        match (self.knot, self.coefficient) {
            (Some(k), Some(c)) if k.is_finite() && c.is_finite() => Some((k, c)),
            _ => None,
        }
    }
}

/// Knot/coefficient rows for each band, as produced by an external spline fit
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SplineTable {
    pub rows: PerBand<Vec<SplineRow>>,
}

impl SplineTable {
    pub fn new(rows: PerBand<Vec<SplineRow>>) -> Self {
        Self { rows }
    }

    /// Knots and coefficients of `band` with incomplete rows removed
    pub fn valid_points(&self, band: Band) -> (Vec<f64>, Vec<f64>) {
        self.rows[band].iter().filter_map(SplineRow::valid).unzip()
    }
}

/// Reference log-uncertainty curve for a single band
#[derive(Debug, Clone)]
pub struct BandCurve {
    band: Band,
    spline: BSpline,
    reference_count: u32,
    domain: (f64, f64),
}

impl BandCurve {
    fn build(band: Band, table: &SplineTable, calibration: &SurveyCalibration) -> Result<Self> {
        let (knots, coefficients) = table.valid_points(band);
        if knots.len() < SPLINE_DEGREE + 1 {
            return Err(MagErrError::Configuration {
                band: Some(band),
                reason: format!(
                    "need at least {} valid knot/coefficient pairs, found {}",
                    SPLINE_DEGREE + 1,
                    knots.len()
                ),
            });
        }

        let spline = BSpline::new(knots, coefficients, SPLINE_DEGREE)
            .map_err(|e| MagErrError::spline(band, e))?;

        let (lo, hi) = spline.support();
        debug!(
            "Band {band}: {} basis functions, support [{lo}, {hi}], N_ref = {}",
            spline.basis_count(),
            calibration.reference_counts[band]
        );

        Ok(Self {
            band,
            spline,
            reference_count: calibration.reference_counts[band],
            domain: calibration.magnitude_domain,
        })
    }

    pub fn band(&self) -> Band {
        self.band
    }

    /// Observation count at which the curve was tabulated
    pub fn reference_count(&self) -> u32 {
        self.reference_count
    }

    /// log10 uncertainty at the reference observation count.
    ///
    /// NaN outside the magnitude domain or the spline support.
    pub fn log_uncertainty(&self, magnitude: f64) -> f64 {
        let (lo, hi) = self.domain;
        if !(lo..=hi).contains(&magnitude) {
            return f64::NAN;
        }
        self.spline.evaluate(magnitude)
    }

    /// Offset subtracted from the reference curve for `n_obs` observations.
    ///
    /// Infinite when `n_obs` is zero; callers that accept a zero count must
    /// handle it before calling.
    pub fn count_offset(&self, n_obs: u32) -> f64 {
        (f64::from(n_obs).sqrt() / f64::from(self.reference_count).sqrt()).log10()
    }

    /// log10 uncertainty rescaled to `n_obs` observations
    pub fn log_uncertainty_at(&self, magnitude: f64, n_obs: u32) -> f64 {
        self.log_uncertainty(magnitude) - self.count_offset(n_obs)
    }
}

/// One uncertainty column of a [`LogUncertaintyGrid`]
#[derive(Debug, Clone, PartialEq)]
pub struct LogUncertaintyColumn {
    /// Observation count the column is rescaled to
    pub n_obs: u32,
    /// log10 uncertainty at each grid magnitude
    pub values: Array1<f64>,
}

impl LogUncertaintyColumn {
    /// Column label, e.g. `logU_200`
    pub fn label(&self) -> String {
        format!("logU_{}", self.n_obs)
    }
}

/// Log-uncertainty evaluated over an evenly spaced magnitude grid
#[derive(Debug, Clone, PartialEq)]
pub struct LogUncertaintyGrid {
    pub band: Band,
    pub magnitudes: Array1<f64>,
    pub columns: Vec<LogUncertaintyColumn>,
}

impl LogUncertaintyGrid {
    /// Magnitude column label, e.g. `mag_bp`
    pub fn magnitude_label(&self) -> String {
        format!("mag_{}", self.band.slug())
    }

    /// Column rescaled to `n_obs`, if it was requested
    pub fn column(&self, n_obs: u32) -> Option<&Array1<f64>> {
        self.columns
            .iter()
            .find(|c| c.n_obs == n_obs)
            .map(|c| &c.values)
    }
}

/// Per-band log-uncertainty curves with their calibration.
///
/// Built once from the reference table and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct UncertaintyModel {
    curves: PerBand<BandCurve>,
    calibration: SurveyCalibration,
}

impl UncertaintyModel {
    /// Build the model from a reference spline table.
    ///
    /// # Errors
    /// `MagErrError::Configuration` if the calibration is invalid, or if any band
    /// has fewer than four valid rows or a knot vector that cannot define a
    /// cubic spline.
    pub fn new(table: &SplineTable, calibration: SurveyCalibration) -> Result<Self> {
        calibration.validate()?;

        let curves = PerBand::from_fn(|band| BandCurve::build(band, table, &calibration));
        let curves = curves.try_map(|_, curve| curve)?;

        info!(
            "Built uncertainty model (N_ref G/BP/RP = {}/{}/{})",
            calibration.reference_counts.g,
            calibration.reference_counts.bp,
            calibration.reference_counts.rp
        );

        Ok(Self {
            curves,
            calibration,
        })
    }

    /// Build the model with the Gaia EDR3 calibration
    pub fn gaia_edr3(table: &SplineTable) -> Result<Self> {
        Self::new(table, SurveyCalibration::gaia_edr3())
    }

    pub fn curve(&self, band: Band) -> &BandCurve {
        &self.curves[band]
    }

    pub fn calibration(&self) -> &SurveyCalibration {
        &self.calibration
    }

    /// Evaluate a band's log-uncertainty over a magnitude grid.
    ///
    /// # Arguments
    /// * `band` - Band to evaluate
    /// * `observation_counts` - Counts to rescale to; 0 means the band's reference count
    /// * `magnitude_range` - Grid bounds, defaults to the full magnitude domain
    /// * `samples` - Number of evenly spaced grid points (at least 2)
    ///
    /// # Returns
    /// A grid with one column per distinct count. Duplicate labels (including
    /// 0 alongside the reference count) keep the first position.
    ///
    /// # Errors
    /// `MagErrError::InvalidArgument` for negative counts, fewer than 2 samples,
    /// or a range that is non-finite, inverted or outside the magnitude domain.
    pub fn evaluate(
        &self,
        band: Band,
        observation_counts: &[i64],
        magnitude_range: Option<(f64, f64)>,
        samples: usize,
    ) -> Result<LogUncertaintyGrid> {
        let (lo, hi) = self.check_range(band, magnitude_range)?;
        if samples < 2 {
            return Err(MagErrError::invalid(format!(
                "need at least 2 magnitude samples, got {samples}"
            )));
        }

        let curve = self.curve(band);
        let resolved = observation_counts
            .iter()
            .map(|&n| match n {
                n if n < 0 => Err(MagErrError::invalid(format!(
                    "Number of observations should be non-negative, got {n}"
                ))),
                0 => Ok(curve.reference_count()),
                n => u32::try_from(n).map_err(|_| {
                    MagErrError::invalid(format!("Number of observations {n} is too large"))
                }),
            })
            .collect::<Result<Vec<u32>>>()?;

        let mut magnitudes = Array1::linspace(lo, hi, samples);
        // Pin the endpoint so rounding cannot push it outside the domain
        magnitudes[samples - 1] = hi;
        let reference = magnitudes.mapv(|m| curve.log_uncertainty(m));

        let mut columns: Vec<LogUncertaintyColumn> = Vec::with_capacity(resolved.len());
        for n_obs in resolved {
            if columns.iter().any(|c| c.n_obs == n_obs) {
                continue;
            }
            let offset = curve.count_offset(n_obs);
            columns.push(LogUncertaintyColumn {
                n_obs,
                values: reference.mapv(|v| v - offset),
            });
        }

        Ok(LogUncertaintyGrid {
            band,
            magnitudes,
            columns,
        })
    }

    /// [`UncertaintyModel::evaluate`] with the band given by name
    pub fn evaluate_by_name(
        &self,
        band: &str,
        observation_counts: &[i64],
        magnitude_range: Option<(f64, f64)>,
        samples: usize,
    ) -> Result<LogUncertaintyGrid> {
        let band: Band = band.parse()?;
        self.evaluate(band, observation_counts, magnitude_range, samples)
    }

    fn check_range(&self, band: Band, range: Option<(f64, f64)>) -> Result<(f64, f64)> {
        let (dom_lo, dom_hi) = self.calibration.magnitude_domain;
        let Some((lo, hi)) = range else {
            return Ok((dom_lo, dom_hi));
        };

        if !lo.is_finite() || !hi.is_finite() {
            return Err(MagErrError::invalid(format!(
                "Magnitude range ({lo}, {hi}) must be finite"
            )));
        }
        if lo < dom_lo || hi > dom_hi {
            return Err(MagErrError::invalid(format!(
                "Range ({lo}, {hi}) for {band} lies outside [{dom_lo}, {dom_hi}]"
            )));
        }
        if lo > hi {
            return Err(MagErrError::invalid(format!(
                "Malformed magnitude range ({lo}, {hi})"
            )));
        }
        Ok((lo, hi))
    }
}
