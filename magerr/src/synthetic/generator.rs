//! Synthetic noisy photometry from noise-free magnitudes.
//!
//! Every star gets a Poisson observation count per band, an uncertainty from
//! the model at that count, and a simulated magnitude
//! `m_sim = m_true + sigma * z` with `z` a standard-normal deviate.

use clap::ValueEnum;
use log::info;
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{rng, RngCore, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use super::estimator::estimate_uncertainty_with_counts;
use super::nobs::{derive_reference_counts, draw_observation_counts};
use super::{ObservedSample, SimulatedPhotometry, SyntheticSample};
use crate::error::Result;
use crate::photometry::{PerBand, UncertaintyModel};

/// How the Gaussian deviates of a star's three bands relate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseCoupling {
    /// One deviate per star reused for G, BP and RP.
    ///
    /// The offsets of a star are perfectly correlated across bands. Kept as
    /// the default for compatibility with existing synthetic catalogs.
    #[default]
    Shared,
    /// An independent deviate per star and band
    Independent,
}

/// Draws simulated observations for synthetic stars.
///
/// Owns the random source; a fixed seed makes every draw reproducible.
#[derive(Debug, Clone)]
pub struct PhotometrySimulator<'a> {
    model: &'a UncertaintyModel,
    poisson_means: PerBand<u32>,
    coupling: NoiseCoupling,
    rng: StdRng,
}

impl<'a> PhotometrySimulator<'a> {
    /// Create a simulator with explicit Poisson means for the observation counts.
    ///
    /// # Arguments
    /// * `model` - Uncertainty model shared by all draws
    /// * `poisson_means` - Mean observation count per band
    /// * `rng_seed` - Optional seed for reproducible results
    pub fn new(
        model: &'a UncertaintyModel,
        poisson_means: PerBand<u32>,
        rng_seed: Option<u64>,
    ) -> Self {
        let rng_seed = rng_seed.unwrap_or(rng().next_u64());
        Self {
            model,
            poisson_means,
            coupling: NoiseCoupling::default(),
            rng: StdRng::seed_from_u64(rng_seed),
        }
    }

    /// Create a simulator whose Poisson means are the median counts of `observed`
    pub fn from_observed(
        model: &'a UncertaintyModel,
        observed: &ObservedSample,
        rng_seed: Option<u64>,
    ) -> Result<Self> {
        let means = derive_reference_counts(observed)?;
        Ok(Self::new(model, means, rng_seed))
    }

    pub fn with_noise_coupling(mut self, coupling: NoiseCoupling) -> Self {
        self.coupling = coupling;
        self
    }

    pub fn poisson_means(&self) -> &PerBand<u32> {
        &self.poisson_means
    }

    pub fn noise_coupling(&self) -> NoiseCoupling {
        self.coupling
    }

    /// Draw one observation count per star and band
    pub fn draw_observation_counts(&mut self, n_stars: usize) -> Result<PerBand<Array1<u32>>> {
        draw_observation_counts(&mut self.rng, &self.poisson_means, n_stars)
    }

    /// Draw observation counts and return the resulting per-star uncertainties
    pub fn estimate_uncertainty(
        &mut self,
        sample: &SyntheticSample,
    ) -> Result<PerBand<Array1<f64>>> {
        let n_obs = self.draw_observation_counts(sample.len())?;
        estimate_uncertainty_with_counts(self.model, sample, &n_obs)
    }

    /// Simulated magnitudes for every star and band
    pub fn generate_noisy(&mut self, sample: &SyntheticSample) -> Result<PerBand<Array1<f64>>> {
        Ok(self.simulate(sample)?.magnitude)
    }

    /// Full simulated observation: counts, uncertainties and noisy magnitudes.
    ///
    /// Deviates are drawn before the observation counts. An empty sample
    /// yields empty columns.
    pub fn simulate(&mut self, sample: &SyntheticSample) -> Result<SimulatedPhotometry> {
        let n_stars = sample.len();

        let deviates = self.draw_deviates(n_stars);
        let n_obs = self.draw_observation_counts(n_stars)?;
        let uncertainty = estimate_uncertainty_with_counts(self.model, sample, &n_obs)?;

        let magnitude =
            PerBand::from_fn(|band| &uncertainty[band] * &deviates[band] + sample.magnitudes(band));

        info!(
            "Simulated {n_stars} stars (Poisson means G/BP/RP = {}/{}/{}, {:?} noise)",
            self.poisson_means.g,
            self.poisson_means.bp,
            self.poisson_means.rp,
            self.coupling
        );

        Ok(SimulatedPhotometry {
            n_obs,
            uncertainty,
            magnitude,
        })
    }

    fn draw_deviates(&mut self, n_stars: usize) -> PerBand<Array1<f64>> {
        let rng = &mut self.rng;
        let mut draw = || -> Array1<f64> {
            Array1::from_shape_simple_fn(n_stars, || StandardNormal.sample(&mut *rng))
        };

        match self.coupling {
            NoiseCoupling::Shared => {
                let z = draw();
                PerBand::new(z.clone(), z.clone(), z)
            }
            NoiseCoupling::Independent => {
                let g = draw();
                let bp = draw();
                let rp = draw();
                PerBand::new(g, bp, rp)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MagErrError;
    use crate::photometry::Band;
    use crate::testing::edr3_like_table;
    use ndarray::array;

    fn model() -> UncertaintyModel {
        UncertaintyModel::gaia_edr3(&edr3_like_table()).unwrap()
    }

    fn sample() -> SyntheticSample {
        let g = array![10.0, 12.0, 14.0, 16.0, 18.0];
        SyntheticSample::new(PerBand::new(g.clone(), &g + 0.3, &g - 0.5)).unwrap()
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let model = model();
        let sample = sample();
        let means = PerBand::new(200, 20, 20);

        let a = PhotometrySimulator::new(&model, means, Some(1234))
            .generate_noisy(&sample)
            .unwrap();
        let b = PhotometrySimulator::new(&model, means, Some(1234))
            .generate_noisy(&sample)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let model = model();
        let sample = sample();
        let means = PerBand::new(200, 20, 20);

        let a = PhotometrySimulator::new(&model, means, Some(1))
            .generate_noisy(&sample)
            .unwrap();
        let b = PhotometrySimulator::new(&model, means, Some(2))
            .generate_noisy(&sample)
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_shared_deviate_across_bands() {
        let model = model();
        let sample = sample();
        let mut sim = PhotometrySimulator::new(&model, PerBand::new(200, 20, 20), Some(99));
        let out = sim.simulate(&sample).unwrap();

        for i in 0..sample.len() {
            let z: Vec<f64> = Band::ALL
                .iter()
                .map(|&b| (out.magnitude[b][i] - sample.magnitudes(b)[i]) / out.uncertainty[b][i])
                .collect();
            assert!((z[0] - z[1]).abs() < 1e-9 && (z[0] - z[2]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_independent_deviates_differ_across_bands() {
        let model = model();
        let sample = sample();
        let mut sim = PhotometrySimulator::new(&model, PerBand::new(200, 20, 20), Some(99))
            .with_noise_coupling(NoiseCoupling::Independent);
        assert_eq!(sim.noise_coupling(), NoiseCoupling::Independent);
        let out = sim.simulate(&sample).unwrap();

        let z = |b: Band, i: usize| {
            (out.magnitude[b][i] - sample.magnitudes(b)[i]) / out.uncertainty[b][i]
        };
        let moved = |i: usize| (z(Band::G, i) - z(Band::Bp, i)).abs() > 1e-6;
        assert!((0..sample.len()).any(moved));
    }

    #[test]
    fn test_simulated_record_is_consistent() {
        let model = model();
        let sample = sample();
        let mut sim = PhotometrySimulator::new(&model, PerBand::new(200, 20, 20), Some(5));
        let out = sim.simulate(&sample).unwrap();

        let recomputed = estimate_uncertainty_with_counts(&model, &sample, &out.n_obs).unwrap();
        assert_eq!(recomputed, out.uncertainty);
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn test_zero_mean_counts_fail_numerically() {
        let model = model();
        let sample = sample();
        let mut sim = PhotometrySimulator::new(&model, PerBand::new(200, 0, 20), Some(5));
        let err = sim.estimate_uncertainty(&sample).unwrap_err();
        assert!(matches!(err, MagErrError::Numerical { band: Band::Bp, .. }));
    }

    #[test]
    fn test_from_observed_uses_medians() {
        let model = model();
        let observed = ObservedSample::from_counts(PerBand::new(
            array![10.0, 20.0, 30.0],
            array![5.0, 6.0, 7.0],
            array![8.0, 9.0, 10.0],
        ))
        .unwrap();
        let sim = PhotometrySimulator::from_observed(&model, &observed, Some(0)).unwrap();
        assert_eq!(*sim.poisson_means(), PerBand::new(20, 6, 9));
    }

    #[test]
    fn test_empty_sample_gives_empty_columns() {
        let model = model();
        let empty = SyntheticSample::new(PerBand::from_fn(|_| Array1::zeros(0))).unwrap();
        let mut sim = PhotometrySimulator::new(&model, PerBand::new(200, 20, 20), Some(5));

        let noisy = sim.generate_noisy(&empty).unwrap();
        for (_, column) in noisy.iter() {
            assert!(column.is_empty());
        }

        let simulated = sim.simulate(&empty).unwrap();
        assert!(simulated.is_empty());
        assert!(simulated.n_obs.rp.is_empty());

        let sigma = sim.estimate_uncertainty(&empty).unwrap();
        assert!(sigma.g.is_empty());
    }
}
