//! Order statistics over observation-count columns.
//!
//! Handles NaN detection by skipping non-finite entries: catalog columns carry
//! missing values as NaN and those rows simply do not contribute.

use thiserror::Error;

/// Error types for statistics over sample columns
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("No data provided (empty slice)")]
    NoData,
    #[error("No finite values among {0} entries")]
    NoFiniteData(usize),
}

/// Median of the finite values in `data`.
///
/// Even-length inputs return the mean of the two middle values, matching the
/// usual numerical-library convention.
///
/// # Errors
/// * `StatsError::NoData` - `data` is empty
/// * `StatsError::NoFiniteData` - every entry is NaN or infinite
pub fn finite_median(data: &[f64]) -> Result<f64, StatsError> {
    if data.is_empty() {
        return Err(StatsError::NoData);
    }

    let mut values: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return Err(StatsError::NoFiniteData(data.len()));
    }

    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Ok((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Ok(values[mid])
    }
}
