//! Star samples consumed and produced by the synthetic photometry pipeline

use ndarray::Array1;

use crate::error::{MagErrError, Result};
use crate::photometry::{Band, PerBand};

fn check_lengths<T>(what: &str, columns: &PerBand<Array1<T>>) -> Result<usize> {
    let len = columns.g.len();
    for (band, column) in columns.iter() {
        if column.len() != len {
            return Err(MagErrError::invalid(format!(
                "{what} column for band {band} has {} rows, expected {len}",
                column.len()
            )));
        }
    }
    Ok(len)
}

/// Observed catalog stars, used only to calibrate observation counts
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedSample {
    magnitudes: PerBand<Array1<f64>>,
    n_obs: PerBand<Array1<f64>>,
}

impl ObservedSample {
    /// Create an observed sample from per-band magnitude and count columns.
    ///
    /// Counts are kept as floats so that missing catalog entries can be
    /// carried as NaN.
    pub fn new(magnitudes: PerBand<Array1<f64>>, n_obs: PerBand<Array1<f64>>) -> Result<Self> {
        let mag_len = check_lengths("Magnitude", &magnitudes)?;
        let n_obs_len = check_lengths("Observation count", &n_obs)?;
        if mag_len != n_obs_len {
            return Err(MagErrError::invalid(format!(
                "Observed sample has {mag_len} magnitude rows but {n_obs_len} count rows"
            )));
        }
        Ok(Self { magnitudes, n_obs })
    }

    /// Sample carrying only observation counts
    pub fn from_counts(n_obs: PerBand<Array1<f64>>) -> Result<Self> {
        let len = check_lengths("Observation count", &n_obs)?;
        let magnitudes = PerBand::from_fn(|_| Array1::from_elem(len, f64::NAN));
        Self::new(magnitudes, n_obs)
    }

    pub fn len(&self) -> usize {
        self.n_obs.g.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn magnitudes(&self, band: Band) -> &Array1<f64> {
        &self.magnitudes[band]
    }

    pub fn n_obs(&self, band: Band) -> &Array1<f64> {
        &self.n_obs[band]
    }
}

/// Noise-free synthetic stars to be turned into simulated observations
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSample {
    magnitudes: PerBand<Array1<f64>>,
}

impl SyntheticSample {
    /// Create a synthetic sample from per-band true magnitudes
    pub fn new(magnitudes: PerBand<Array1<f64>>) -> Result<Self> {
        check_lengths("Magnitude", &magnitudes)?;
        Ok(Self { magnitudes })
    }

    pub fn len(&self) -> usize {
        self.magnitudes.g.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True magnitudes in `band`
    pub fn magnitudes(&self, band: Band) -> &Array1<f64> {
        &self.magnitudes[band]
    }
}

/// Per-star simulated observation for every band.
///
/// The observation counts are exactly the ones used to compute the
/// uncertainties, and the magnitudes were drawn with those uncertainties.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedPhotometry {
    pub n_obs: PerBand<Array1<u32>>,
    pub uncertainty: PerBand<Array1<f64>>,
    pub magnitude: PerBand<Array1<f64>>,
}

impl SimulatedPhotometry {
    pub fn len(&self) -> usize {
        self.magnitude.g.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mismatched_band_lengths_rejected() {
        let result = SyntheticSample::new(PerBand::new(
            array![10.0, 11.0],
            array![10.5],
            array![9.5, 9.7],
        ));
        assert!(matches!(result, Err(MagErrError::InvalidArgument(_))));
    }

    #[test]
    fn test_observed_rows_must_match() {
        let mags = PerBand::from_fn(|_| array![10.0, 11.0, 12.0]);
        let counts = PerBand::from_fn(|_| array![200.0, 210.0]);
        assert!(ObservedSample::new(mags, counts).is_err());
    }

    #[test]
    fn test_counts_only_sample() {
        let counts = PerBand::new(
            array![10.0, 20.0, 30.0],
            array![1.0, 2.0, 3.0],
            array![4.0, 5.0, 6.0],
        );
        let sample = ObservedSample::from_counts(counts).unwrap();
        assert_eq!(sample.len(), 3);
        assert!(sample.magnitudes(Band::G).iter().all(|m| m.is_nan()));
        assert_eq!(sample.n_obs(Band::Rp)[2], 6.0);
    }
}
