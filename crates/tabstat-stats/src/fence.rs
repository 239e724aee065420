//! Inter-quartile-range fences for outlier removal.
//!
//! A fence is derived from the first and third quartiles of a sample:
//!
//! ```text
//! lower = Q1 - k * IQR
//! upper = Q3 + k * IQR
//! ```
//!
//! Both bounds are inclusive. The fence is computed from the sample it is
//! applied to, so filtering an already-filtered sample recomputes the
//! quartiles and may tighten the fence further.

use serde::Serialize;

use crate::{SummaryError, quantile::Quartiles, sample::Sample};

/// Conventional Tukey multiplier.
pub const DEFAULT_MULTIPLIER: f64 = 1.5;

/// An inclusive `[lower, upper]` outlier fence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fence {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl Fence {
    /// Computes the fence for the observed values of a sample.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::NumericalDomain`] if the sample has no observed
    /// values (quartiles are undefined), or [`SummaryError::InvalidMultiplier`]
    /// if `multiplier` is negative or not finite.
    ///
    /// # Examples
    ///
    /// ```
    /// use tabstat_stats::{fence::Fence, sample::Sample};
    ///
    /// let sample = Sample::from(vec![1.0, 2.0, 3.0, 4.0, 5.0, 100.0]);
    /// let fence = Fence::from_sample(&sample, 1.5).unwrap();
    /// assert_eq!(fence.lower, -1.5);
    /// assert_eq!(fence.upper, 8.5);
    /// ```
    pub fn from_sample(sample: &Sample, multiplier: f64) -> Result<Self, SummaryError> {
        let quartiles = Quartiles::new(sample)
            .ok_or_else(|| SummaryError::domain("quartiles of an empty sample are undefined"))?;
        Self::from_quartiles(&quartiles, multiplier)
    }

    /// Builds the fence from precomputed quartiles.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::InvalidMultiplier`] if `multiplier` is negative or not finite.
    pub fn from_quartiles(quartiles: &Quartiles, multiplier: f64) -> Result<Self, SummaryError> {
        check_multiplier(multiplier)?;
        let iqr = quartiles.iqr();
        Ok(Self {
            q1: quartiles.q1,
            q3: quartiles.q3,
            iqr,
            lower: quartiles.q1 - multiplier * iqr,
            upper: quartiles.q3 + multiplier * iqr,
        })
    }

    /// Whether `value` lies inside the fence, bounds included.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    /// Observed values inside the fence, in original order.
    #[must_use]
    pub fn filter(&self, sample: &Sample) -> Vec<f64> {
        sample.observed().filter(|&v| self.contains(v)).collect()
    }

    /// Splits observed values into `(retained, removed)`, both in original order.
    #[must_use]
    pub fn partition(&self, sample: &Sample) -> (Vec<f64>, Vec<f64>) {
        sample.observed().partition(|&v| self.contains(v))
    }
}

/// Drops values outside the IQR fence of the sample.
///
/// An empty sample (or one with only missing entries) yields an empty result.
///
/// # Errors
///
/// Returns [`SummaryError::InvalidMultiplier`] if `multiplier` is negative or not finite.
pub fn remove_outliers(sample: &Sample, multiplier: f64) -> Result<Vec<f64>, SummaryError> {
    check_multiplier(multiplier)?;
    let Some(quartiles) = Quartiles::new(sample) else {
        return Ok(vec![]);
    };
    let fence = Fence::from_quartiles(&quartiles, multiplier)?;
    let kept = fence.filter(sample);
    log::debug!(
        "fence [{}, {}] removed {} of {} values",
        fence.lower,
        fence.upper,
        sample.observed().count() - kept.len(),
        sample.observed().count()
    );
    Ok(kept)
}

fn check_multiplier(multiplier: f64) -> Result<(), SummaryError> {
    if multiplier.is_finite() && multiplier >= 0.0 {
        Ok(())
    } else {
        Err(SummaryError::InvalidMultiplier { multiplier })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_textbook_fence() {
        let sample = Sample::from(vec![1.0, 2.0, 3.0, 4.0, 5.0, 100.0]);
        let fence = Fence::from_sample(&sample, DEFAULT_MULTIPLIER).unwrap();
        assert_relative_eq!(fence.q1, 2.25);
        assert_relative_eq!(fence.q3, 4.75);
        assert_relative_eq!(fence.iqr, 2.5);
        assert_relative_eq!(fence.lower, -1.5);
        assert_relative_eq!(fence.upper, 8.5);
        assert_eq!(fence.filter(&sample), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        // Q1 = 2, Q3 = 4, IQR = 2, k = 1 -> fence [0, 6]
        let sample = Sample::from(vec![0.0, 2.0, 3.0, 4.0, 6.0]);
        let fence = Fence::from_sample(&sample, 1.0).unwrap();
        assert_eq!(fence.lower, 0.0);
        assert_eq!(fence.upper, 6.0);
        assert!(fence.contains(0.0));
        assert!(fence.contains(6.0));
        assert_eq!(fence.filter(&sample), vec![0.0, 2.0, 3.0, 4.0, 6.0]);
    }

    #[test]
    fn test_preserves_original_order() {
        let sample = Sample::from(vec![5.0, -50.0, 1.0, 4.0, 2.0, 3.0, 60.0]);
        let kept = remove_outliers(&sample, DEFAULT_MULTIPLIER).unwrap();
        assert_eq!(kept, vec![5.0, 1.0, 4.0, 2.0, 3.0]);
    }

    #[test]
    fn test_partition_respects_fence() {
        let sample = Sample::from(vec![-40.0, 1.0, 2.0, 2.5, 3.0, 3.5, 4.0, 9.0, 35.0]);
        let fence = Fence::from_sample(&sample, DEFAULT_MULTIPLIER).unwrap();
        let (retained, removed) = fence.partition(&sample);
        assert_eq!(retained.len() + removed.len(), 9);
        assert!(retained.iter().all(|&x| fence.lower <= x && x <= fence.upper));
        assert!(removed.iter().all(|&x| x < fence.lower || x > fence.upper));
        // Q1 = 2, Q3 = 4 -> fence [-1, 7]
        assert_eq!(removed, vec![-40.0, 9.0, 35.0]);
    }

    #[test]
    fn test_missing_values_are_ignored() {
        let sample = Sample::new(vec![Some(1.0), None, Some(2.0), Some(f64::NAN), Some(3.0)]);
        assert_eq!(
            remove_outliers(&sample, DEFAULT_MULTIPLIER).unwrap(),
            vec![1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn test_empty_sample_yields_empty_output() {
        assert_eq!(
            remove_outliers(&Sample::default(), DEFAULT_MULTIPLIER).unwrap(),
            Vec::<f64>::new()
        );
        assert!(matches!(
            Fence::from_sample(&Sample::default(), DEFAULT_MULTIPLIER),
            Err(SummaryError::NumericalDomain { .. })
        ));
    }

    #[test]
    fn test_invalid_multiplier() {
        let sample = Sample::from(vec![1.0, 2.0]);
        assert!(matches!(
            remove_outliers(&sample, -1.0),
            Err(SummaryError::InvalidMultiplier { .. })
        ));
        assert!(matches!(
            remove_outliers(&sample, f64::NAN),
            Err(SummaryError::InvalidMultiplier { .. })
        ));
    }

    #[test]
    fn test_refiltering_may_tighten_fence() {
        let sample = Sample::from(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 20.0, 30.0]);
        let once = remove_outliers(&sample, DEFAULT_MULTIPLIER).unwrap();
        let twice = remove_outliers(&Sample::from(once.clone()), DEFAULT_MULTIPLIER).unwrap();
        assert!(twice.len() <= once.len());
        assert!(!once.contains(&30.0));
    }
}
