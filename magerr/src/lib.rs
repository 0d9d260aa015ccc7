//! Photometric uncertainty model for Gaia-like G/BP/RP photometry.
//!
//! The model evaluates tabulated log10-uncertainty curves (cubic B-splines in
//! magnitude), rescales them to an arbitrary number of observations, adds an
//! empirical noise floor in quadrature and uses the result to turn noise-free
//! synthetic magnitudes into simulated observations.
//!
//! # Example
//!
//! ```no_run
//! use magerr::io::{read_spline_table_path, BandColumns};
//! use magerr::photometry::{PerBand, UncertaintyModel};
//! use magerr::synthetic::{PhotometrySimulator, SyntheticSample};
//! use ndarray::array;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let table = read_spline_table_path("LogErrVsMagSpline.csv".as_ref(), &BandColumns::default())?;
//! let model = UncertaintyModel::gaia_edr3(&table)?;
//!
//! let g = array![10.0, 14.0, 18.0];
//! let sample = SyntheticSample::new(PerBand::new(g.clone(), &g + 0.4, &g - 0.6))?;
//! let mut simulator = PhotometrySimulator::new(&model, PerBand::new(200, 20, 20), Some(42));
//! let noisy = simulator.generate_noisy(&sample)?;
//! println!("G: {}", noisy.g);
//! # Ok(())
//! # }
//! ```

pub mod algo;
pub mod error;
pub mod io;
pub mod photometry;
pub mod synthetic;

#[cfg(any(test, feature = "test-fixtures"))]
#[doc(hidden)]
pub mod testing;

pub use error::{MagErrError, OffendingStar, Result};
pub use photometry::{Band, PerBand, SurveyCalibration, UncertaintyModel};
pub use synthetic::{NoiseCoupling, PhotometrySimulator, SimulatedPhotometry, SyntheticSample};
