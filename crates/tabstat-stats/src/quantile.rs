use serde::Serialize;

use crate::sample::Sample;

/// Computes a single quantile from sorted data.
///
/// Uses linear interpolation between order statistics: the value at rank
/// `p * (n - 1)` (zero-based), interpolated between the two neighbouring
/// sorted values.
///
/// # Arguments
///
/// * `sorted_values` - Values sorted in ascending order
/// * `p` - The quantile to compute (0.0 to 1.0)
///
/// # Returns
///
/// The interpolated value. Returns `f64::NAN` if the input is empty.
///
/// # Panics
///
/// Panics in debug mode if `sorted_values` is not sorted in ascending order.
///
/// # Examples
///
/// ```
/// use tabstat_stats::quantile::quantile;
///
/// let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
/// assert_eq!(quantile(&values, 0.25), 2.25);
/// assert_eq!(quantile(&values, 0.5), 3.5);
/// assert_eq!(quantile(&values, 0.75), 4.75);
/// ```
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#[must_use]
pub fn quantile(sorted_values: &[f64], p: f64) -> f64 {
    debug_assert!(
        sorted_values.is_sorted_by(|a, b| a <= b),
        "values must be sorted in ascending order"
    );

    if sorted_values.is_empty() {
        return f64::NAN;
    }
    let rank = p.clamp(0.0, 1.0) * (sorted_values.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - rank.floor();
    sorted_values[lower] + (sorted_values[upper] - sorted_values[lower]) * fraction
}

/// First quartile, median, and third quartile of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quartiles {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
}

impl Quartiles {
    /// Computes quartiles from the observed values of a sample.
    ///
    /// Returns `None` if the sample has no observed values.
    #[must_use]
    pub fn new(sample: &Sample) -> Option<Self> {
        Self::from_sorted(&sample.sorted_observed())
    }

    /// Computes quartiles from pre-sorted values.
    ///
    /// Returns `None` if `sorted_values` is empty.
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        if sorted_values.is_empty() {
            return None;
        }
        Some(Self {
            q1: quantile(sorted_values, 0.25),
            median: quantile(sorted_values, 0.5),
            q3: quantile(sorted_values, 0.75),
        })
    }

    /// Inter-quartile range, `Q3 - Q1`.
    #[must_use]
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}
