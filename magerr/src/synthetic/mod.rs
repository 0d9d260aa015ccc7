//! Synthetic photometry: observation-count sampling, per-star uncertainties
//! and noisy magnitudes for simulated catalogs.

pub mod estimator;
pub mod generator;
pub mod nobs;
pub mod sample;

pub use estimator::{band_uncertainty, estimate_uncertainty_with_counts};
pub use generator::{NoiseCoupling, PhotometrySimulator};
pub use nobs::{derive_reference_counts, draw_observation_counts, draw_poisson_counts};
pub use sample::{ObservedSample, SimulatedPhotometry, SyntheticSample};
