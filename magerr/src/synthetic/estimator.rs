//! Per-star photometric uncertainty from the model curve and noise floor.
//!
//! For a star of magnitude m observed N times in a band:
//!
//! ```text
//! sigma_model = 10^(logU_ref(m) - log10(sqrt(N) / sqrt(N_ref))) / r
//! sigma       = sqrt(sigma_model^2 + floor^2)
//! ```
//!
//! where r converts the curve's robust dispersion to a standard deviation.

use log::error;
use ndarray::{Array1, Zip};

use super::SyntheticSample;
use crate::error::{MagErrError, OffendingStar, Result};
use crate::photometry::{Band, PerBand, UncertaintyModel};

/// Uncertainty of every star in `band` given its observation count.
///
/// # Errors
/// `MagErrError::Numerical` if any star has a zero observation count (division
/// by zero in the sqrt(N) rescaling) or ends up with a non-finite uncertainty,
/// e.g. a magnitude outside the curve's domain. The error lists the offending
/// stars.
pub fn band_uncertainty(
    model: &UncertaintyModel,
    band: Band,
    magnitudes: &Array1<f64>,
    n_obs: &Array1<u32>,
) -> Result<Array1<f64>> {
    if magnitudes.len() != n_obs.len() {
        return Err(MagErrError::invalid(format!(
            "band {band}: {} magnitudes but {} observation counts",
            magnitudes.len(),
            n_obs.len()
        )));
    }

    let curve = model.curve(band);
    let calibration = model.calibration();
    let floor = calibration.noise_floor[band];
    let ratio = calibration.robust_sigma_ratio;

    let sigma = Zip::from(magnitudes).and(n_obs).par_map_collect(|&mag, &n| {
        if n == 0 {
            return f64::NAN;
        }
        let model_term = 10f64.powf(curve.log_uncertainty_at(mag, n)) / ratio;
        (model_term * model_term + floor * floor).sqrt()
    });

    let offending = |keep: &dyn Fn(usize) -> bool| -> Vec<OffendingStar> {
        (0..sigma.len())
            .filter(|&i| keep(i))
            .map(|i| OffendingStar {
                index: i,
                magnitude: magnitudes[i],
                n_obs: n_obs[i],
            })
            .collect()
    };

    let zero_counts = offending(&|i| n_obs[i] == 0);
    if !zero_counts.is_empty() {
        return Err(numerical_failure(
            band,
            "division by zero from a zero observation count",
            zero_counts,
        ));
    }

    let non_finite = offending(&|i| !sigma[i].is_finite());
    if !non_finite.is_empty() {
        return Err(numerical_failure(
            band,
            "non-finite uncertainty",
            non_finite,
        ));
    }

    Ok(sigma)
}

fn numerical_failure(band: Band, reason: &str, stars: Vec<OffendingStar>) -> MagErrError {
    error!("Band {band}: {reason} for {} star(s)", stars.len());
    for star in &stars {
        error!("  offending star {star}");
    }
    MagErrError::Numerical {
        band,
        reason: reason.to_string(),
        stars,
    }
}

/// Uncertainties for every band of `sample` using the supplied counts
pub fn estimate_uncertainty_with_counts(
    model: &UncertaintyModel,
    sample: &SyntheticSample,
    n_obs: &PerBand<Array1<u32>>,
) -> Result<PerBand<Array1<f64>>> {
    let sigma = |band: Band| band_uncertainty(model, band, sample.magnitudes(band), &n_obs[band]);
    Ok(PerBand {
        g: sigma(Band::G)?,
        bp: sigma(Band::Bp)?,
        rp: sigma(Band::Rp)?,
    })
}
