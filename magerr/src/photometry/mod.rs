//! Photometric bands, survey calibration and the log-uncertainty model

pub mod band;
pub mod calibration;
pub mod model;

pub use band::{Band, PerBand};
pub use calibration::SurveyCalibration;
pub use model::{
    BandCurve, LogUncertaintyColumn, LogUncertaintyGrid, SplineRow, SplineTable, UncertaintyModel,
    DEFAULT_GRID_SAMPLES, SPLINE_DEGREE,
};
