//! Fixed-width binning for continuous data.
//!
//! The bin width (historically called the "amplitude") is a width, not a bin
//! count. Bins are laid out from the sample minimum:
//!
//! 1. `range = max - min`
//! 2. `num_bins = ceil(range / width)`
//! 3. `edges[0] = min`, `edges[i] = edges[i - 1] + width` for `i = 1..=num_bins`
//! 4. Each value is counted in the half-open bin `[edges[i], edges[i + 1])`
//!
//! Edges are accumulated by repeated addition and are not stretched to cover
//! the maximum. When `range` is an exact multiple of `width`, the maximum
//! value sits on the last edge and falls in no bin. Such values are reported
//! in [`BinnedCounts::outside`] instead of being folded into the last bin.
//!
//! # Examples
//!
//! ```
//! use tabstat_stats::{binning::BinnedCounts, sample::Sample};
//!
//! let sample = Sample::from(vec![0.0, 5.0, 10.0, 15.0, 20.0]);
//! let binned = BinnedCounts::from_sample(&sample, 10.0).unwrap();
//!
//! let counts = binned.bins.iter().map(|b| b.count).collect::<Vec<_>>();
//! assert_eq!(counts, vec![2, 2]);
//! assert_eq!(binned.outside, 1); // the maximum, 20, lies on the last edge
//! ```

use std::fmt;

use serde::Serialize;

use crate::{SummaryError, frequency::FrequencyTable, sample::Sample};

/// Largest number of bins a single call will lay out.
pub const MAX_BINS: u32 = 1 << 20;

/// A half-open interval `[lower, upper)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
}

impl Bin {
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value < self.upper
    }
}

impl fmt::Display for Bin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.lower, self.upper)
    }
}

/// A bin and the number of values that fall within it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BinCount {
    pub bin: Bin,
    #[serde(rename = "Frequency")]
    pub count: u64,
}

/// Counts of a continuous sample over fixed-width bins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinnedCounts {
    /// Bin edges, `bins.len() + 1` of them (or none for an empty sample).
    pub edges: Vec<f64>,
    /// Bins ordered ascending.
    pub bins: Vec<BinCount>,
    /// Observed values that fell in no bin.
    pub outside: usize,
}

impl BinnedCounts {
    /// Bins the observed values of a sample with the given width.
    ///
    /// A sample with no observed values yields an empty result.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::InvalidBinWidth`] if `width` is not a positive
    /// finite number, and [`SummaryError::NumericalDomain`] if the range would
    /// need more than [`MAX_BINS`] bins.
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_sample(sample: &Sample, width: f64) -> Result<Self, SummaryError> {
        if !width.is_finite() || width <= 0.0 {
            return Err(SummaryError::InvalidBinWidth { width });
        }

        let sorted = sample.sorted_observed();
        let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
            return Ok(Self {
                edges: vec![],
                bins: vec![],
                outside: 0,
            });
        };

        let num_bins = ((max - min) / width).ceil();
        if !num_bins.is_finite() || num_bins > f64::from(MAX_BINS) {
            return Err(SummaryError::domain(format!(
                "range {} over width {width} needs more than {MAX_BINS} bins",
                max - min
            )));
        }
        let num_bins = num_bins as usize;

        let mut edges = Vec::with_capacity(num_bins + 1);
        edges.push(min);
        for i in 1..=num_bins {
            edges.push(edges[i - 1] + width);
        }

        let mut bins = edges
            .windows(2)
            .map(|pair| BinCount {
                bin: Bin {
                    lower: pair[0],
                    upper: pair[1],
                },
                count: 0,
            })
            .collect::<Vec<_>>();

        let mut outside = 0;
        for value in sample.observed() {
            // Index of the first edge strictly greater than `value`
            let idx = edges.partition_point(|&edge| edge <= value);
            if idx == 0 || idx == edges.len() {
                outside += 1;
            } else {
                bins[idx - 1].count += 1;
            }
        }

        if outside > 0 {
            log::debug!("{outside} values fell outside the last bin edge {}", edges[num_bins]);
        }

        Ok(Self {
            edges,
            bins,
            outside,
        })
    }

    /// Total count across all bins, excluding values outside every bin.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.bins.iter().map(|b| b.count).sum()
    }

    /// Promotes the bin counts to a full frequency table keyed by bin.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::DivisionByZero`] if no value fell in any bin.
    #[expect(clippy::cast_precision_loss)]
    pub fn to_frequency_table(&self) -> Result<FrequencyTable<Bin>, SummaryError> {
        FrequencyTable::from_frequencies(self.bins.iter().map(|b| (b.bin, b.count as f64)))
    }
}
