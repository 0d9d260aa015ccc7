//! B-spline evaluation from a pre-fit knot vector and coefficient table.
//!
//! The spline is never fit here. Knots and coefficients come from an external
//! fit and are evaluated with de Boor's recursion. Extrapolation is disabled:
//! any abscissa outside the base interval `[t[k], t[n]]` evaluates to NaN so that
//! out-of-range magnitudes can never masquerade as valid uncertainties.

use thiserror::Error;

/// Errors that can occur while building a B-spline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BSplineError {
    #[error("Need {required} knots for a degree {degree} spline, got {found}")]
    InsufficientKnots {
        found: usize,
        required: usize,
        degree: usize,
    },
    #[error("Need at least {required} coefficients, got {found}")]
    InsufficientCoefficients { found: usize, required: usize },
    #[error("Unsorted knots: knot {index} = {value} is below {previous}")]
    UnsortedKnots {
        index: usize,
        value: f64,
        previous: f64,
    },
    #[error("Knot and coefficient values must be finite")]
    NonFinite,
    #[error("Spline base interval [{0}, {1}] is empty")]
    EmptySupport(f64, f64),
}

/// Piecewise polynomial in B-spline form.
///
/// Holds `n + k + 1` knots and `n` coefficients, where `k` is the degree.
/// Coefficients beyond `n` are dropped at construction; fitting tools commonly
/// pad the coefficient array to the knot length.
#[derive(Debug, Clone, PartialEq)]
pub struct BSpline {
    knots: Vec<f64>,
    coefficients: Vec<f64>,
    degree: usize,
}

impl BSpline {
    /// Build a spline from a knot vector and its coefficients.
    ///
    /// # Arguments
    /// * `knots` - Non-decreasing knot vector, at least `2 * (degree + 1)` long
    /// * `coefficients` - At least `knots.len() - degree - 1` coefficients
    /// * `degree` - Polynomial degree (3 for cubic)
    ///
    /// # Errors
    /// Returns a [`BSplineError`] if the knot vector is too short or unsorted,
    /// if there are too few coefficients, or if any value is non-finite.
    pub fn new(
        knots: Vec<f64>,
        mut coefficients: Vec<f64>,
        degree: usize,
    ) -> Result<Self, BSplineError> {
        let required = 2 * (degree + 1);
        if knots.len() < required {
            return Err(BSplineError::InsufficientKnots {
                found: knots.len(),
                required,
                degree,
            });
        }

        if knots.iter().chain(&coefficients).any(|v| !v.is_finite()) {
            return Err(BSplineError::NonFinite);
        }

        for i in 1..knots.len() {
            if knots[i] < knots[i - 1] {
                return Err(BSplineError::UnsortedKnots {
                    index: i,
                    value: knots[i],
                    previous: knots[i - 1],
                });
            }
        }

        let n = knots.len() - degree - 1;
        if coefficients.len() < n {
            return Err(BSplineError::InsufficientCoefficients {
                found: coefficients.len(),
                required: n,
            });
        }
        coefficients.truncate(n);

        let (lo, hi) = (knots[degree], knots[n]);
        if lo >= hi {
            return Err(BSplineError::EmptySupport(lo, hi));
        }

        Ok(Self {
            knots,
            coefficients,
            degree,
        })
    }

    /// Polynomial degree of the spline
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Number of basis functions (and therefore used coefficients)
    pub fn basis_count(&self) -> usize {
        self.coefficients.len()
    }

    /// Interval `[t[k], t[n]]` over which the spline is defined
    pub fn support(&self) -> (f64, f64) {
        let n = self.coefficients.len();
        (self.knots[self.degree], self.knots[n])
    }

    /// Evaluate the spline at `x`.
    ///
    /// Returns NaN when `x` is NaN or outside [`BSpline::support`].
    pub fn evaluate(&self, x: f64) -> f64 {
        let (lo, hi) = self.support();
        if !(lo..=hi).contains(&x) {
            return f64::NAN;
        }

        let k = self.degree;
        let span = self.find_span(x);
        let t = &self.knots;

        // de Boor: d[j] holds c[span - k + j] and is blended down to d[k]
        let mut d: Vec<f64> = self.coefficients[span - k..=span].to_vec();
        for r in 1..=k {
            for j in (r..=k).rev() {
                let left = t[j + span - k];
                let right = t[j + 1 + span - r];
                let alpha = (x - left) / (right - left);
                d[j] = (1.0 - alpha) * d[j - 1] + alpha * d[j];
            }
        }

        d[k]
    }

    /// Index `l` with `t[l] <= x < t[l + 1]`, restricted to `k <= l < n`.
    ///
    /// The right end of the support belongs to the last non-empty interval.
    fn find_span(&self, x: f64) -> usize {
        let k = self.degree;
        let n = self.coefficients.len();
        let t = &self.knots;

        let above = t[k..=n].partition_point(|&knot| knot <= x);
        let mut span = (k + above).saturating_sub(1).clamp(k, n - 1);
        while span > k && t[span] == t[span + 1] {
            span -= 1;
        }
        span
    }
}
