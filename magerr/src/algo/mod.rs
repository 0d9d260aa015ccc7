//! Numerical kernels used by the uncertainty model
//!
//! This module provides B-spline evaluation for the tabulated log-uncertainty
//! curves and the order statistics used to calibrate observation counts.

pub mod bspline;
pub mod stats;

pub use bspline::{BSpline, BSplineError};
pub use stats::{finite_median, StatsError};
