//! Descriptive summaries for tabular numeric data.
//!
//! This crate provides the table-building side of exploratory analysis:
//!
//! - **Samples and tables**: Columns of numeric values with missing entries
//! - **Quantiles**: Linear-interpolation quantiles and quartiles
//! - **Outlier fences**: Inter-quartile-range fences and outlier removal
//! - **Frequency tables**: Frequency, relative, and cumulative summaries
//! - **Continuous binning**: Fixed-width bins for continuous variables
//!
//! Every missing entry (`None` or `NaN`) is dropped before any statistic is
//! computed over a sample.
//!
//! # Modules
//!
//! - [`sample`]: Samples, named columns, and column tables
//! - [`quantile`]: Quantile estimation and quartiles
//! - [`fence`]: IQR fences and outlier filtering
//! - [`frequency`]: Frequency distribution tables
//! - [`binning`]: Fixed-width binning of continuous values
//!
//! # Examples
//!
//! ## Building a frequency table
//!
//! ```
//! use tabstat_stats::{frequency::FrequencyTable, sample::Sample};
//!
//! let sample = Sample::from(vec![1.0, 1.0, 2.0, 3.0, 3.0, 3.0]);
//! let table = FrequencyTable::from_sample(&sample).unwrap();
//! assert_eq!(table.len(), 3);
//! assert_eq!(table.rows()[2].cumulative_frequency, 6.0);
//! ```
//!
//! ## Removing outliers
//!
//! ```
//! use tabstat_stats::{fence::remove_outliers, sample::Sample};
//!
//! let sample = Sample::from(vec![1.0, 2.0, 3.0, 4.0, 5.0, 100.0]);
//! let kept = remove_outliers(&sample, 1.5).unwrap();
//! assert_eq!(kept, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
//! ```
//!
//! ## Binning a continuous column
//!
//! ```
//! use tabstat_stats::{binning::BinnedCounts, sample::Sample};
//!
//! let sample = Sample::from(vec![0.0, 5.0, 10.0, 15.0, 20.0]);
//! let binned = BinnedCounts::from_sample(&sample, 10.0).unwrap();
//! assert_eq!(binned.edges, vec![0.0, 10.0, 20.0]);
//! assert_eq!(binned.outside, 1);
//! ```

pub mod binning;
pub mod fence;
pub mod frequency;
pub mod quantile;
pub mod sample;

/// Errors raised while building descriptive summaries.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum SummaryError {
    #[display("total frequency is zero, relative frequencies are undefined")]
    DivisionByZero,
    #[display("{reason}")]
    NumericalDomain { reason: String },
    #[display("bin width must be a positive finite number, got {width}")]
    InvalidBinWidth { width: f64 },
    #[display("outlier multiplier must be a non-negative finite number, got {multiplier}")]
    InvalidMultiplier { multiplier: f64 },
    #[display("column '{name}' not found in table")]
    UnknownColumn { name: String },
}

impl SummaryError {
    pub(crate) fn domain(reason: impl Into<String>) -> Self {
        Self::NumericalDomain {
            reason: reason.into(),
        }
    }
}
