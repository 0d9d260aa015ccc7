//! Fixtures shared by unit and integration tests.

use crate::photometry::{PerBand, SplineRow, SplineTable};

/// Clamped cubic knot vector over the Gaia magnitude domain [4, 21]
pub const EDR3_LIKE_KNOTS: [f64; 11] = [
    4.0, 4.0, 4.0, 4.0, 8.0, 12.0, 16.0, 21.0, 21.0, 21.0, 21.0,
];

/// log10(sigma_G) coefficients rising from ~0.3 mmag to ~0.1 mag
pub const EDR3_LIKE_COEFFS: [f64; 7] = [-3.5, -3.4, -3.3, -3.0, -2.5, -1.8, -1.0];

/// Spline table resembling the EDR3 log-uncertainty curves.
///
/// BP and RP sit above G, and every band carries the zero padding that
/// spline-fitting tools append to the coefficient column.
pub fn edr3_like_table() -> SplineTable {
    let band_rows = |offset: f64| -> Vec<SplineRow> {
        EDR3_LIKE_KNOTS
            .iter()
            .enumerate()
            .map(|(i, &knot)| {
                let coefficient = EDR3_LIKE_COEFFS.get(i).map_or(0.0, |c| c + offset);
                SplineRow::new(knot, coefficient)
            })
            .collect()
    };

    SplineTable::new(PerBand::new(band_rows(0.0), band_rows(0.2), band_rows(0.3)))
}
