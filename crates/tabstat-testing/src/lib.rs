//! Hypothesis-testing harness with uniform accept/reject reporting.
//!
//! Every test follows the same pipeline:
//!
//! 1. **Select samples** ([`tabstat_stats::sample::Table`]): Columns are
//!    passed in caller order and their arity is validated
//! 2. **Omit missing values**: Per sample, or per row for paired tests
//! 3. **Compute** ([`backend::StatisticsBackend`]): A backend returns the
//!    statistic and p-value
//! 4. **Decide** ([`decision::decide`]): `p <= alpha` rejects the null
//!    hypothesis
//! 5. **Report** ([`report::TestReport`]): Results are rendered as text on
//!    whatever sink the caller chooses
//!
//! # Modules
//!
//! - [`decision`]: Significance level, decisions, and test results
//! - [`backend`]: The statistics capability interface and its `statrs` implementation
//! - [`harness`]: The named test adapters
//! - [`report`]: Text rendering of test reports
//!
//! # Examples
//!
//! ```
//! use tabstat_stats::sample::Table;
//! use tabstat_testing::{
//!     backend::Alternative,
//!     decision::{Alpha, Decision},
//!     harness::HypothesisTestHarness,
//! };
//!
//! let table = Table::default()
//!     .with_column("control", vec![1.0, 2.0, 3.0, 4.0, 5.0])
//!     .with_column("treatment", vec![6.0, 7.0, 8.0, 9.0, 10.0]);
//!
//! let harness = HypothesisTestHarness::statrs();
//! let report = harness
//!     .independent_means(&table, Alpha::default(), true, Alternative::TwoSided)
//!     .unwrap();
//! assert_eq!(report.results[0].decision, Decision::RejectNull);
//! println!("{report}");
//! ```

use backend::Arity;

pub mod backend;
pub mod decision;
pub mod harness;
pub mod report;

/// Errors raised while running a hypothesis test.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum TestError {
    #[display("{test} expects {expected} columns, got {actual}")]
    InsufficientSamples {
        test: &'static str,
        expected: Arity,
        actual: usize,
    },
    #[display("{test} requires columns of equal length, got lengths {lengths:?}")]
    DimensionMismatch {
        test: &'static str,
        lengths: Vec<usize>,
    },
    #[display("{test}: {reason}")]
    NumericalDomain { test: &'static str, reason: String },
    #[display("significance level must lie strictly between 0 and 1, got {alpha}")]
    InvalidAlpha { alpha: f64 },
}

impl TestError {
    pub(crate) fn domain(test: &'static str, reason: impl Into<String>) -> Self {
        Self::NumericalDomain {
            test,
            reason: reason.into(),
        }
    }
}
