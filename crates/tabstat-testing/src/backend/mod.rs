//! The statistics capability the harness delegates to.
//!
//! A [`StatisticsBackend`] turns a [`TestKind`] and a list of samples into a
//! [`Statistic`]. The harness only depends on this trait, so a different
//! numeric library can be plugged in without touching the adapters.
//!
//! [`StatrsBackend`] is the default implementation. It computes each
//! statistic directly and takes reference distributions from `statrs`.

use std::{fmt, str::FromStr};

use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal, StudentsT};

use crate::{TestError, decision::Hypotheses};

mod normality;
mod parametric;
mod rank;

pub use self::rank::average_ranks;

/// Computes `(statistic, p_value)` for a named test.
pub trait StatisticsBackend {
    /// Runs `kind` over `samples`, given in caller order with missing values
    /// already omitted.
    fn compute(&self, kind: &TestKind, samples: &[&[f64]]) -> Result<Statistic, TestError>;
}

impl<B> StatisticsBackend for &B
where
    B: StatisticsBackend + ?Sized,
{
    fn compute(&self, kind: &TestKind, samples: &[&[f64]]) -> Result<Statistic, TestError> {
        (**self).compute(kind, samples)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistic {
    pub value: f64,
    pub p_value: f64,
}

/// How many columns a test accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    #[must_use]
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exactly(n) => count == n,
            Self::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "exactly {n}"),
            Self::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown {kind} `{value}` (expected one of: {expected})")]
pub struct ParseOptionError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

/// Direction of the alternative hypothesis.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alternative {
    #[default]
    TwoSided,
    /// The first sample is stochastically smaller.
    Less,
    /// The first sample is stochastically greater.
    Greater,
}

impl Alternative {
    /// Applies the alternative to a statistic whose null distribution has the
    /// given lower (`cdf`) and upper (`sf`) tails.
    fn p_value(self, statistic: f64, cdf: impl Fn(f64) -> f64, sf: impl Fn(f64) -> f64) -> f64 {
        match self {
            Self::TwoSided => (2.0 * sf(statistic.abs())).min(1.0),
            Self::Less => cdf(statistic),
            Self::Greater => sf(statistic),
        }
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TwoSided => "two-sided",
            Self::Less => "less",
            Self::Greater => "greater",
        })
    }
}

impl FromStr for Alternative {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "two-sided" => Ok(Self::TwoSided),
            "less" => Ok(Self::Less),
            "greater" => Ok(Self::Greater),
            _ => Err(ParseOptionError {
                kind: "alternative",
                value: s.to_owned(),
                expected: "two-sided, less, greater",
            }),
        }
    }
}

/// Location used by Levene's test to measure spread.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Center {
    #[default]
    Mean,
    Median,
    /// Mean after cutting 5% of the values from each end of the group.
    Trimmed,
}

impl fmt::Display for Center {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Trimmed => "trimmed",
        })
    }
}

impl FromStr for Center {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "trimmed" => Ok(Self::Trimmed),
            _ => Err(ParseOptionError {
                kind: "center",
                value: s.to_owned(),
                expected: "mean, median, trimmed",
            }),
        }
    }
}

/// A named test together with its options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestKind {
    ShapiroWilk,
    Levene {
        center: Center,
    },
    IndependentT {
        equal_variances: bool,
        alternative: Alternative,
    },
    PairedT {
        alternative: Alternative,
    },
    OneWayAnova,
    WilcoxonSignedRank {
        alternative: Alternative,
    },
    MannWhitneyU {
        alternative: Alternative,
    },
    Friedman,
    KruskalWallis,
}

impl TestKind {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ShapiroWilk => "Shapiro-Wilk",
            Self::Levene { .. } => "Levene",
            Self::IndependentT {
                equal_variances: true,
                ..
            } => "Student t",
            Self::IndependentT {
                equal_variances: false,
                ..
            } => "Welch t",
            Self::PairedT { .. } => "Paired t",
            Self::OneWayAnova => "One-way ANOVA",
            Self::WilcoxonSignedRank { .. } => "Wilcoxon signed-rank",
            Self::MannWhitneyU { .. } => "Mann-Whitney U",
            Self::Friedman => "Friedman",
            Self::KruskalWallis => "Kruskal-Wallis",
        }
    }

    /// Symbol of the reported statistic.
    #[must_use]
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::ShapiroWilk => "W",
            Self::Levene { .. } | Self::OneWayAnova => "F",
            Self::IndependentT { .. } | Self::PairedT { .. } => "t",
            Self::WilcoxonSignedRank { .. } => "T",
            Self::MannWhitneyU { .. } => "U",
            Self::Friedman => "chi2",
            Self::KruskalWallis => "H",
        }
    }

    /// Number of columns the test takes from a table.
    ///
    /// Shapiro-Wilk runs once per column, so it accepts any non-empty table.
    #[must_use]
    pub fn arity(&self) -> Arity {
        match self {
            Self::ShapiroWilk => Arity::AtLeast(1),
            Self::Levene { .. } | Self::OneWayAnova | Self::KruskalWallis => Arity::AtLeast(2),
            Self::IndependentT { .. }
            | Self::PairedT { .. }
            | Self::WilcoxonSignedRank { .. }
            | Self::MannWhitneyU { .. } => Arity::Exactly(2),
            Self::Friedman => Arity::AtLeast(3),
        }
    }

    /// Whether samples are related row by row.
    #[must_use]
    pub fn is_paired(&self) -> bool {
        matches!(
            self,
            Self::PairedT { .. } | Self::WilcoxonSignedRank { .. } | Self::Friedman
        )
    }

    #[must_use]
    pub fn hypotheses(&self) -> Hypotheses {
        match self {
            Self::ShapiroWilk => Hypotheses::Normality,
            Self::Levene { .. } => Hypotheses::EqualVariances,
            _ => Hypotheses::Generic,
        }
    }
}

/// Why a procedure could not produce a statistic from its input.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("{_0}")]
struct Degenerate(String);

impl Degenerate {
    fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    fn from_display(err: impl fmt::Display) -> Self {
        Self(err.to_string())
    }
}

/// Default backend built on `statrs` distributions.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatrsBackend;

impl StatisticsBackend for StatrsBackend {
    fn compute(&self, kind: &TestKind, samples: &[&[f64]]) -> Result<Statistic, TestError> {
        let test = kind.name();
        let expected = match kind {
            TestKind::ShapiroWilk => Arity::Exactly(1),
            _ => kind.arity(),
        };
        if !expected.accepts(samples.len()) {
            return Err(TestError::InsufficientSamples {
                test,
                expected,
                actual: samples.len(),
            });
        }
        if kind.is_paired() && samples.iter().any(|s| s.len() != samples[0].len()) {
            return Err(TestError::DimensionMismatch {
                test,
                lengths: samples.iter().map(|s| s.len()).collect(),
            });
        }

        if let Some((idx, value)) = samples.iter().enumerate().find_map(|(i, sample)| {
            sample.iter().find(|x| !x.is_finite()).map(|&x| (i, x))
        }) {
            return Err(TestError::domain(
                test,
                format!("sample {idx} contains the non-finite value {value}"),
            ));
        }

        log::debug!(
            "{test}: computing over sample sizes {:?}",
            samples.iter().map(|s| s.len()).collect::<Vec<_>>()
        );

        let result = match *kind {
            TestKind::ShapiroWilk => normality::shapiro_wilk(samples[0]),
            TestKind::Levene { center } => parametric::levene(samples, center),
            TestKind::IndependentT {
                equal_variances,
                alternative,
            } => parametric::ttest_ind(samples[0], samples[1], equal_variances, alternative),
            TestKind::PairedT { alternative } => {
                parametric::ttest_rel(samples[0], samples[1], alternative)
            }
            TestKind::OneWayAnova => parametric::one_way_anova(samples),
            TestKind::WilcoxonSignedRank { alternative } => {
                rank::wilcoxon(samples[0], samples[1], alternative)
            }
            TestKind::MannWhitneyU { alternative } => {
                rank::mann_whitney(samples[0], samples[1], alternative)
            }
            TestKind::Friedman => rank::friedman(samples),
            TestKind::KruskalWallis => rank::kruskal_wallis(samples),
        };
        result.map_err(|err| TestError::domain(test, err.0))
    }
}

fn standard_normal() -> Result<Normal, Degenerate> {
    Normal::new(0.0, 1.0).map_err(Degenerate::from_display)
}

/// Passes `value` through unless it overflowed or is undefined.
fn finite(what: &str, value: f64) -> Result<f64, Degenerate> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Degenerate::new(format!("{what} is not finite ({value})")))
    }
}

fn normal_p_value(z: f64, alternative: Alternative) -> Result<f64, Degenerate> {
    let z = finite("z statistic", z)?;
    let dist = standard_normal()?;
    Ok(alternative.p_value(z, |x| dist.cdf(x), |x| dist.sf(x)))
}

fn t_p_value(t: f64, df: f64, alternative: Alternative) -> Result<f64, Degenerate> {
    let t = finite("t statistic", t)?;
    let df = finite("degrees of freedom", df)?;
    let dist = StudentsT::new(0.0, 1.0, df).map_err(Degenerate::from_display)?;
    Ok(alternative.p_value(t, |x| dist.cdf(x), |x| dist.sf(x)))
}

fn f_sf(f: f64, df_num: f64, df_den: f64) -> Result<f64, Degenerate> {
    let f = finite("F statistic", f)?;
    let dist = FisherSnedecor::new(df_num, df_den).map_err(Degenerate::from_display)?;
    Ok(dist.sf(f))
}

fn chi_squared_sf(x: f64, df: f64) -> Result<f64, Degenerate> {
    let x = finite("chi-square statistic", x)?;
    let dist = ChiSquared::new(df).map_err(Degenerate::from_display)?;
    Ok(dist.sf(x))
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / len_f64(values.len())
}

/// Unbiased sample variance (`n - 1` denominator).
fn variance(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (len_f64(values.len()) - 1.0)
}

#[expect(clippy::cast_precision_loss)]
fn len_f64(len: usize) -> f64 {
    len as f64
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_option_parsing() {
        assert_eq!("two-sided".parse(), Ok(Alternative::TwoSided));
        assert_eq!("greater".parse(), Ok(Alternative::Greater));
        assert_eq!("trimmed".parse(), Ok(Center::Trimmed));
        let err = "sideways".parse::<Alternative>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown alternative `sideways` (expected one of: two-sided, less, greater)"
        );
        for alternative in [Alternative::TwoSided, Alternative::Less, Alternative::Greater] {
            assert_eq!(alternative.to_string().parse(), Ok(alternative));
        }
    }

    #[test]
    fn test_arity() {
        assert!(Arity::Exactly(2).accepts(2));
        assert!(!Arity::Exactly(2).accepts(3));
        assert!(Arity::AtLeast(3).accepts(4));
        assert!(!Arity::AtLeast(3).accepts(2));
        assert_eq!(Arity::Exactly(2).to_string(), "exactly 2");
    }

    #[test]
    fn test_backend_rejects_wrong_arity() {
        let a = [1.0, 2.0, 3.0];
        let kind = TestKind::MannWhitneyU {
            alternative: Alternative::TwoSided,
        };
        let err = StatrsBackend.compute(&kind, &[&a, &a, &a]).unwrap_err();
        assert_eq!(
            err,
            TestError::InsufficientSamples {
                test: "Mann-Whitney U",
                expected: Arity::Exactly(2),
                actual: 3,
            }
        );
        let err = StatrsBackend
            .compute(&TestKind::ShapiroWilk, &[&a, &a])
            .unwrap_err();
        assert!(matches!(err, TestError::InsufficientSamples { .. }));
    }

    #[test]
    fn test_backend_rejects_unequal_pairs() {
        let kind = TestKind::PairedT {
            alternative: Alternative::TwoSided,
        };
        let err = StatrsBackend
            .compute(&kind, &[&[1.0, 2.0, 3.0], &[1.0, 2.0]])
            .unwrap_err();
        assert_eq!(
            err,
            TestError::DimensionMismatch {
                test: "Paired t",
                lengths: vec![3, 2],
            }
        );
    }

    #[test]
    fn test_backend_by_reference() {
        fn run(backend: impl StatisticsBackend) -> Statistic {
            backend
                .compute(&TestKind::OneWayAnova, &[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]])
                .unwrap()
        }
        let backend = StatrsBackend;
        assert_eq!(run(&backend), run(backend));
    }

    #[test]
    fn test_backend_rejects_non_finite_values() {
        let finite = [1.0, 2.0, 3.0, 4.0, 5.0];
        let infinite = [1.0, 2.0, f64::INFINITY, 4.0, 5.0];
        let alternative = Alternative::TwoSided;
        let kinds = [
            TestKind::ShapiroWilk,
            TestKind::Levene {
                center: Center::Median,
            },
            TestKind::IndependentT {
                equal_variances: true,
                alternative,
            },
            TestKind::PairedT { alternative },
            TestKind::OneWayAnova,
            TestKind::WilcoxonSignedRank { alternative },
            TestKind::MannWhitneyU { alternative },
            TestKind::KruskalWallis,
        ];
        for kind in kinds {
            let samples = if matches!(kind, TestKind::ShapiroWilk) {
                vec![infinite.as_slice()]
            } else {
                vec![finite.as_slice(), infinite.as_slice()]
            };
            let err = StatrsBackend.compute(&kind, &samples).unwrap_err();
            assert!(
                matches!(err, TestError::NumericalDomain { .. }),
                "{}: {err}",
                kind.name()
            );
        }
        let err = StatrsBackend
            .compute(&TestKind::Friedman, &[&finite, &finite, &[f64::NEG_INFINITY; 5]])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            TestError::domain("Friedman", "sample 2 contains the non-finite value -inf").to_string()
        );
    }

    #[test]
    fn test_p_value_helpers_reject_non_finite_statistics() {
        assert!(f_sf(f64::NAN, 1.0, 4.0).is_err());
        assert!(f_sf(f64::INFINITY, 1.0, 4.0).is_err());
        assert!(chi_squared_sf(f64::NAN, 2.0).is_err());
        assert!(t_p_value(f64::NAN, 4.0, Alternative::TwoSided).is_err());
        assert!(t_p_value(1.0, f64::NAN, Alternative::Less).is_err());
        assert!(normal_p_value(f64::NEG_INFINITY, Alternative::Greater).is_err());
        assert_abs_diff_eq!(f_sf(0.0, 1.0, 4.0).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_variance() {
        assert_abs_diff_eq!(variance(&[1.0, 2.0, 3.0, 4.0, 5.0]), 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(mean(&[2.0, 4.0]), 3.0, epsilon = 1e-12);
    }
}
