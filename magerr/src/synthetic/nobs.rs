//! Observation-count calibration and Poisson sampling.
//!
//! Each synthetic star gets a number of observations per band drawn from a
//! Poisson distribution whose mean is the median count of a real sample.

use log::{info, warn};
use ndarray::Array1;
use rand::Rng;
use rand_distr::{Distribution, Poisson};

use super::ObservedSample;
use crate::algo::finite_median;
use crate::error::{MagErrError, Result};
use crate::photometry::{Band, PerBand};

/// Median observation count per band, truncated to an integer.
///
/// # Errors
/// `MagErrError::InvalidArgument` if the sample is empty, a band has no finite
/// counts, or any count is negative.
pub fn derive_reference_counts(sample: &ObservedSample) -> Result<PerBand<u32>> {
    if sample.is_empty() {
        return Err(MagErrError::invalid(
            "Cannot derive observation counts from an empty sample",
        ));
    }

    let counts = PerBand::from_fn(|band| band_median(sample, band));
    let counts = counts.try_map(|_, median| median)?;

    info!(
        "Derived median observation counts G/BP/RP = {}/{}/{} from {} stars",
        counts.g,
        counts.bp,
        counts.rp,
        sample.len()
    );
    Ok(counts)
}

fn band_median(sample: &ObservedSample, band: Band) -> Result<u32> {
    let column = sample.n_obs(band);
    if let Some(negative) = column.iter().find(|&&n| n < 0.0) {
        return Err(MagErrError::invalid(format!(
            "Observation counts must be non-negative, band {band} has {negative}"
        )));
    }

    let values = column.to_vec();
    let median = finite_median(&values)
        .map_err(|e| MagErrError::invalid(format!("band {band} observation counts: {e}")))?;

    // Truncation, as when casting a float median to an integer count
    let median = median.trunc() as u32;
    if median == 0 {
        warn!("Median observation count for band {band} is 0; every draw will be 0");
    }
    Ok(median)
}

/// Draw `n_stars` Poisson counts with the given mean.
///
/// A zero mean yields all zeros, the limit of the distribution.
pub fn draw_poisson_counts<R: Rng + ?Sized>(
    rng: &mut R,
    mean: u32,
    n_stars: usize,
) -> Result<Array1<u32>> {
    if mean == 0 {
        return Ok(Array1::zeros(n_stars));
    }

    let poisson = Poisson::new(f64::from(mean))
        .map_err(|e| MagErrError::invalid(format!("Poisson mean {mean}: {e}")))?;
    let counts = Array1::from_shape_simple_fn(n_stars, || poisson.sample(&mut *rng) as u32);
    Ok(counts)
}

/// Draw per-star counts for every band, G then BP then RP
pub fn draw_observation_counts<R: Rng + ?Sized>(
    rng: &mut R,
    means: &PerBand<u32>,
    n_stars: usize,
) -> Result<PerBand<Array1<u32>>> {
    Ok(PerBand {
        g: draw_poisson_counts(rng, means.g, n_stars)?,
        bp: draw_poisson_counts(rng, means.bp, n_stars)?,
        rp: draw_poisson_counts(rng, means.rp, n_stars)?,
    })
}
