//! Thresholding and wording shared by every test adapter.
//!
//! A test outcome `(statistic, p_value)` is turned into a [`TestResult`] by
//! comparing the p-value with the significance level:
//!
//! ```text
//! p_value <= alpha  ->  RejectNull
//! p_value >  alpha  ->  FailToReject
//! ```
//!
//! Equality resolves to rejection. The result also carries the conclusion
//! sentence used by the two-line report.

use std::fmt;

use serde::Serialize;

use crate::TestError;

/// Significance level, strictly between 0 and 1.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Alpha(f64);

impl Alpha {
    pub const DEFAULT: Self = Self(0.05);

    /// # Errors
    ///
    /// Returns [`TestError::InvalidAlpha`] unless `0 < alpha < 1`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tabstat_testing::decision::Alpha;
    ///
    /// assert_eq!(Alpha::new(0.01).unwrap().get(), 0.01);
    /// assert!(Alpha::new(0.0).is_err());
    /// assert!(Alpha::new(1.0).is_err());
    /// ```
    pub fn new(alpha: f64) -> Result<Self, TestError> {
        if alpha > 0.0 && alpha < 1.0 {
            Ok(Self(alpha))
        } else {
            Err(TestError::InvalidAlpha { alpha })
        }
    }

    #[must_use]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for Alpha {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Alpha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Decision {
    RejectNull,
    FailToReject,
}

impl Decision {
    /// `RejectNull` iff `p_value <= alpha`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tabstat_testing::decision::{Alpha, Decision};
    ///
    /// let alpha = Alpha::default();
    /// assert_eq!(Decision::from_p_value(0.05, alpha), Decision::RejectNull);
    /// assert_eq!(Decision::from_p_value(0.06, alpha), Decision::FailToReject);
    /// ```
    #[must_use]
    pub fn from_p_value(p_value: f64, alpha: Alpha) -> Self {
        if p_value <= alpha.get() {
            Self::RejectNull
        } else {
            Self::FailToReject
        }
    }

    #[must_use]
    pub fn is_reject(self) -> bool {
        matches!(self, Self::RejectNull)
    }
}

/// The pair of hypotheses a test decides between, used for wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hypotheses {
    /// H0: the sample is drawn from a normal distribution.
    Normality,
    /// H0: all groups have equal variances.
    EqualVariances,
    /// Any other null hypothesis.
    Generic,
}

impl Hypotheses {
    /// The sentence naming which hypothesis is (not) rejected.
    #[must_use]
    pub fn conclusion(self, label: &str, decision: Decision) -> String {
        match (self, decision) {
            (Self::Normality, Decision::FailToReject) => {
                format!("{label} follows a normal distribution")
            }
            (Self::Normality, Decision::RejectNull) => {
                format!("{label} does not follow a normal distribution")
            }
            (Self::EqualVariances, Decision::FailToReject) => "Equal variances".to_owned(),
            (Self::EqualVariances, Decision::RejectNull) => {
                "At least one variance is different".to_owned()
            }
            (Self::Generic, Decision::FailToReject) => {
                "Fail to reject the null hypothesis".to_owned()
            }
            (Self::Generic, Decision::RejectNull) => "Reject the null hypothesis".to_owned(),
        }
    }
}

/// A thresholded test outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    /// Column name for per-column tests, test name otherwise.
    pub label: String,
    /// Symbol of the statistic, e.g. `W`, `t`, or `F`.
    pub statistic_name: &'static str,
    pub statistic: f64,
    pub p_value: f64,
    pub alpha: f64,
    pub decision: Decision,
    pub conclusion: String,
}

impl TestResult {
    /// The two report lines: the statistic, then the conclusion with its p-value.
    #[must_use]
    pub fn report_lines(&self) -> [String; 2] {
        [
            format!(
                "{}: {} = {:.3}",
                self.label, self.statistic_name, self.statistic
            ),
            format!("{} (p-value: {:.3})", self.conclusion, self.p_value),
        ]
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [statistic, conclusion] = self.report_lines();
        writeln!(f, "{statistic}")?;
        write!(f, "{conclusion}")
    }
}

/// Applies the decision policy to a computed statistic.
///
/// # Examples
///
/// ```
/// use tabstat_testing::decision::{Alpha, Decision, Hypotheses, decide};
///
/// let result = decide("height", "W", 0.912, 0.31, Alpha::default(), Hypotheses::Normality);
/// assert_eq!(result.decision, Decision::FailToReject);
/// assert_eq!(
///     result.to_string(),
///     "height: W = 0.912\nheight follows a normal distribution (p-value: 0.310)"
/// );
/// ```
#[must_use]
pub fn decide(
    label: impl Into<String>,
    statistic_name: &'static str,
    statistic: f64,
    p_value: f64,
    alpha: Alpha,
    hypotheses: Hypotheses,
) -> TestResult {
    let label = label.into();
    let decision = Decision::from_p_value(p_value, alpha);
    let conclusion = hypotheses.conclusion(&label, decision);
    TestResult {
        label,
        statistic_name,
        statistic,
        p_value,
        alpha: alpha.get(),
        decision,
        conclusion,
    }
}
