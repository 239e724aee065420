//! Named hypothesis-test adapters over column tables.
//!
//! Each adapter takes the columns of a [`Table`] in the order the caller
//! supplied them. It validates how many columns the test takes before
//! anything is computed, so a two-sample test never silently uses the first
//! two of three columns.
//!
//! # Missing values
//!
//! Independent-sample tests drop missing values from each column on its own.
//! Paired tests (paired t, Wilcoxon, Friedman) need columns of equal length
//! and drop every row in which any column is missing, so the surviving values
//! stay paired.
//!
//! | Adapter | Columns | Options |
//! |---|---|---|
//! | [`normality`](HypothesisTestHarness::normality) | each column | |
//! | [`variance_homogeneity`](HypothesisTestHarness::variance_homogeneity) | at least 2 | center |
//! | [`independent_means`](HypothesisTestHarness::independent_means) | exactly 2 | equal variances, alternative |
//! | [`paired_means`](HypothesisTestHarness::paired_means) | exactly 2 | alternative |
//! | [`one_way_anova`](HypothesisTestHarness::one_way_anova) | at least 2 | |
//! | [`wilcoxon_signed_rank`](HypothesisTestHarness::wilcoxon_signed_rank) | exactly 2 | alternative |
//! | [`mann_whitney`](HypothesisTestHarness::mann_whitney) | exactly 2 | alternative |
//! | [`friedman`](HypothesisTestHarness::friedman) | at least 3 | |
//! | [`kruskal_wallis`](HypothesisTestHarness::kruskal_wallis) | at least 2 | |

use tabstat_stats::sample::{Column, Table};

use crate::{
    TestError,
    backend::{Alternative, Center, StatisticsBackend, StatrsBackend, TestKind},
    decision::{Alpha, decide},
    report::TestReport,
};

/// Runs named tests through a [`StatisticsBackend`].
#[derive(Debug, Default, Clone)]
pub struct HypothesisTestHarness<B = StatrsBackend> {
    backend: B,
}

impl HypothesisTestHarness {
    /// A harness backed by [`StatrsBackend`].
    #[must_use]
    pub fn statrs() -> Self {
        Self::new(StatrsBackend)
    }
}

impl<B> HypothesisTestHarness<B>
where
    B: StatisticsBackend,
{
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Runs any test over the columns of `table`.
    ///
    /// Shapiro-Wilk yields one result per column, labelled by column name.
    /// Every other test yields a single result labelled by the column names.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::InsufficientSamples`] if the table has the wrong
    /// number of columns, [`TestError::DimensionMismatch`] if a paired test
    /// gets columns of different lengths, or any error from the backend.
    pub fn run(&self, kind: TestKind, table: &Table, alpha: Alpha) -> Result<TestReport, TestError> {
        let test = kind.name();
        let expected = kind.arity();
        if !expected.accepts(table.len()) {
            return Err(TestError::InsufficientSamples {
                test,
                expected,
                actual: table.len(),
            });
        }

        let results = if kind == TestKind::ShapiroWilk {
            table
                .columns()
                .iter()
                .map(|column| {
                    let values = observed(test, column);
                    let stat = self.backend.compute(&kind, &[values.as_slice()])?;
                    Ok(decide(
                        column.name.clone(),
                        kind.symbol(),
                        stat.value,
                        stat.p_value,
                        alpha,
                        kind.hypotheses(),
                    ))
                })
                .collect::<Result<Vec<_>, TestError>>()?
        } else {
            let samples = if kind.is_paired() {
                complete_rows(test, table)?
            } else {
                table.columns().iter().map(|c| observed(test, c)).collect()
            };
            let views = samples.iter().map(Vec::as_slice).collect::<Vec<_>>();
            let stat = self.backend.compute(&kind, &views)?;
            vec![decide(
                table.names().join(" vs "),
                kind.symbol(),
                stat.value,
                stat.p_value,
                alpha,
                kind.hypotheses(),
            )]
        };

        log::debug!("{test}: {} result(s) at alpha {alpha}", results.len());
        Ok(TestReport::new(test, results))
    }

    /// Shapiro-Wilk test on every column independently.
    ///
    /// # Examples
    ///
    /// ```
    /// use tabstat_stats::sample::Table;
    /// use tabstat_testing::{decision::Alpha, harness::HypothesisTestHarness};
    ///
    /// let table = Table::default()
    ///     .with_column("a", vec![2.1, 3.4, 1.9, 5.6, 4.4, 3.3, 2.8, 3.9])
    ///     .with_column("b", vec![1.0, 1.1, 0.9, 1.2, 9.5, 1.0, 1.1, 0.8]);
    /// let report = HypothesisTestHarness::statrs()
    ///     .normality(&table, Alpha::default())
    ///     .unwrap();
    /// assert_eq!(report.results.len(), 2);
    /// assert_eq!(report.results[1].label, "b");
    /// ```
    pub fn normality(&self, table: &Table, alpha: Alpha) -> Result<TestReport, TestError> {
        self.run(TestKind::ShapiroWilk, table, alpha)
    }

    /// Levene's test for equal variances across all columns.
    pub fn variance_homogeneity(
        &self,
        table: &Table,
        alpha: Alpha,
        center: Center,
    ) -> Result<TestReport, TestError> {
        self.run(TestKind::Levene { center }, table, alpha)
    }

    /// Independent two-sample t-test (Student's when `equal_variances`, else Welch's).
    pub fn independent_means(
        &self,
        table: &Table,
        alpha: Alpha,
        equal_variances: bool,
        alternative: Alternative,
    ) -> Result<TestReport, TestError> {
        self.run(
            TestKind::IndependentT {
                equal_variances,
                alternative,
            },
            table,
            alpha,
        )
    }

    pub fn paired_means(
        &self,
        table: &Table,
        alpha: Alpha,
        alternative: Alternative,
    ) -> Result<TestReport, TestError> {
        self.run(TestKind::PairedT { alternative }, table, alpha)
    }

    pub fn one_way_anova(&self, table: &Table, alpha: Alpha) -> Result<TestReport, TestError> {
        self.run(TestKind::OneWayAnova, table, alpha)
    }

    pub fn wilcoxon_signed_rank(
        &self,
        table: &Table,
        alpha: Alpha,
        alternative: Alternative,
    ) -> Result<TestReport, TestError> {
        self.run(TestKind::WilcoxonSignedRank { alternative }, table, alpha)
    }

    pub fn mann_whitney(
        &self,
        table: &Table,
        alpha: Alpha,
        alternative: Alternative,
    ) -> Result<TestReport, TestError> {
        self.run(TestKind::MannWhitneyU { alternative }, table, alpha)
    }

    pub fn friedman(&self, table: &Table, alpha: Alpha) -> Result<TestReport, TestError> {
        self.run(TestKind::Friedman, table, alpha)
    }

    pub fn kruskal_wallis(&self, table: &Table, alpha: Alpha) -> Result<TestReport, TestError> {
        self.run(TestKind::KruskalWallis, table, alpha)
    }

    /// Normality of each column followed by Levene's test across them.
    ///
    /// The usual assumption check before choosing between parametric and
    /// rank-based comparisons.
    pub fn normality_and_variance(
        &self,
        table: &Table,
        alpha: Alpha,
        center: Center,
    ) -> Result<Vec<TestReport>, TestError> {
        Ok(vec![
            self.normality(table, alpha)?,
            self.variance_homogeneity(table, alpha, center)?,
        ])
    }
}

fn observed(test: &str, column: &Column) -> Vec<f64> {
    let missing = column.sample.missing_count();
    if missing > 0 {
        log::warn!(
            "{test}: omitted {missing} missing values from column `{}`",
            column.name
        );
    }
    column.sample.observed_values()
}

/// Keeps the rows in which every column has a value.
fn complete_rows(test: &'static str, table: &Table) -> Result<Vec<Vec<f64>>, TestError> {
    let lengths = table.columns().iter().map(|c| c.sample.len()).collect::<Vec<_>>();
    if lengths.iter().any(|&len| len != lengths[0]) {
        return Err(TestError::DimensionMismatch { test, lengths });
    }

    let mut samples = vec![Vec::with_capacity(lengths[0]); table.len()];
    let mut dropped = 0;
    for i in 0..lengths[0] {
        let row = table
            .columns()
            .iter()
            .map(|c| c.sample.get(i))
            .collect::<Option<Vec<_>>>();
        match row {
            Some(row) => {
                for (sample, value) in samples.iter_mut().zip(row) {
                    sample.push(value);
                }
            }
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        log::warn!("{test}: omitted {dropped} rows with missing values");
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use approx::assert_abs_diff_eq;
    use rand::{Rng as _, SeedableRng as _};
    use rand_distr::Normal;
    use rand_pcg::Pcg64Mcg;

    use super::*;
    use crate::{
        backend::{Arity, Statistic},
        decision::Decision,
    };

    fn two_columns() -> Table {
        Table::default()
            .with_column("control", vec![1.0, 2.0, 3.0, 4.0, 5.0])
            .with_column("treatment", vec![6.0, 7.0, 8.0, 9.0, 10.0])
    }

    fn three_columns() -> Table {
        two_columns().with_column("placebo", vec![2.0, 3.0, 3.5, 4.0, 6.0])
    }

    /// Records the samples it receives and returns a fixed outcome.
    #[derive(Default)]
    struct RecordingBackend {
        calls: RefCell<Vec<Vec<Vec<f64>>>>,
    }

    impl StatisticsBackend for RecordingBackend {
        fn compute(&self, _kind: &TestKind, samples: &[&[f64]]) -> Result<Statistic, TestError> {
            self.calls
                .borrow_mut()
                .push(samples.iter().map(|s| s.to_vec()).collect());
            Ok(Statistic {
                value: 1.5,
                p_value: 0.05,
            })
        }
    }

    #[test]
    fn test_independent_means_rejects_three_columns() {
        let harness = HypothesisTestHarness::statrs();
        let err = harness
            .independent_means(&three_columns(), Alpha::default(), true, Alternative::TwoSided)
            .unwrap_err();
        assert_eq!(
            err,
            TestError::InsufficientSamples {
                test: "Student t",
                expected: Arity::Exactly(2),
                actual: 3,
            }
        );
        assert_eq!(err.to_string(), "Student t expects exactly 2 columns, got 3");
    }

    #[test]
    fn test_two_sample_adapters_check_arity() {
        let harness = HypothesisTestHarness::statrs();
        let alpha = Alpha::default();
        let alt = Alternative::TwoSided;
        let one = Table::default().with_column("only", vec![1.0, 2.0, 3.0]);
        for table in [one, three_columns()] {
            let results = [
                harness.independent_means(&table, alpha, false, alt),
                harness.paired_means(&table, alpha, alt),
                harness.wilcoxon_signed_rank(&table, alpha, alt),
                harness.mann_whitney(&table, alpha, alt),
            ];
            for result in results {
                assert!(matches!(
                    result,
                    Err(TestError::InsufficientSamples {
                        expected: Arity::Exactly(2),
                        ..
                    })
                ));
            }
        }
    }

    #[test]
    fn test_group_adapters_check_arity() {
        let harness = HypothesisTestHarness::statrs();
        let alpha = Alpha::default();
        let one = Table::default().with_column("only", vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            harness.one_way_anova(&one, alpha),
            Err(TestError::InsufficientSamples { .. })
        ));
        assert!(matches!(
            harness.kruskal_wallis(&one, alpha),
            Err(TestError::InsufficientSamples { .. })
        ));
        assert!(matches!(
            harness.variance_homogeneity(&one, alpha, Center::Median),
            Err(TestError::InsufficientSamples { .. })
        ));
        assert!(matches!(
            harness.friedman(&two_columns(), alpha),
            Err(TestError::InsufficientSamples {
                expected: Arity::AtLeast(3),
                actual: 2,
                ..
            })
        ));
        assert!(matches!(
            harness.normality(&Table::default(), alpha),
            Err(TestError::InsufficientSamples { .. })
        ));
    }

    #[test]
    fn test_column_order_is_preserved() {
        let harness = HypothesisTestHarness::statrs();
        let alpha = Alpha::default();
        let report = harness
            .independent_means(&two_columns(), alpha, true, Alternative::TwoSided)
            .unwrap();
        let result = &report.results[0];
        assert_eq!(report.title, "Student t");
        assert_eq!(result.label, "control vs treatment");
        assert_abs_diff_eq!(result.statistic, -5.0, epsilon = 1e-12);
        assert_eq!(result.decision, Decision::RejectNull);

        let swapped = two_columns().select(&["treatment", "control"]).unwrap();
        let report = harness
            .independent_means(&swapped, alpha, true, Alternative::TwoSided)
            .unwrap();
        assert_abs_diff_eq!(report.results[0].statistic, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_backend_receives_observed_values_in_order() {
        let harness = HypothesisTestHarness::new(RecordingBackend::default());
        let table = Table::default()
            .with_column("b", vec![Some(3.0), None, Some(1.0)])
            .with_column("a", vec![Some(f64::NAN), Some(2.0)]);
        let report = harness.kruskal_wallis(&table, Alpha::default()).unwrap();
        assert_eq!(
            *harness.backend().calls.borrow(),
            vec![vec![vec![3.0, 1.0], vec![2.0]]]
        );
        // p == alpha rejects
        assert_eq!(report.results[0].decision, Decision::RejectNull);
        assert_eq!(report.results[0].statistic_name, "H");
    }

    #[test]
    fn test_paired_tests_omit_incomplete_rows() {
        let harness = HypothesisTestHarness::new(RecordingBackend::default());
        let table = Table::default()
            .with_column("before", vec![Some(1.0), None, Some(3.0), Some(4.0)])
            .with_column("after", vec![Some(1.5), Some(2.5), Some(f64::NAN), Some(4.5)]);
        harness
            .paired_means(&table, Alpha::default(), Alternative::TwoSided)
            .unwrap();
        harness
            .wilcoxon_signed_rank(&table, Alpha::default(), Alternative::Less)
            .unwrap();
        let calls = harness.backend().calls.borrow();
        for call in calls.iter() {
            assert_eq!(*call, vec![vec![1.0, 4.0], vec![1.5, 4.5]]);
        }
    }

    #[test]
    fn test_paired_tests_require_equal_lengths() {
        let harness = HypothesisTestHarness::statrs();
        let table = Table::default()
            .with_column("before", vec![1.0, 2.0, 3.0])
            .with_column("after", vec![1.0, 2.0]);
        assert_eq!(
            harness.paired_means(&table, Alpha::default(), Alternative::TwoSided),
            Err(TestError::DimensionMismatch {
                test: "Paired t",
                lengths: vec![3, 2],
            })
        );
    }

    #[test]
    fn test_normality_reports_each_column() {
        let mut rng = Pcg64Mcg::seed_from_u64(7);
        let normal = Normal::new(50.0, 5.0).unwrap();
        let table = Table::default()
            .with_column("x", (0..100).map(|_| rng.sample(normal)).collect::<Vec<_>>())
            .with_column("y", (0..100).map(|_| rng.sample(normal)).collect::<Vec<_>>())
            .with_column(
                "skewed",
                (1..=60).map(|i| f64::from(i).powi(4)).collect::<Vec<_>>(),
            );
        let alpha = Alpha::new(0.001).unwrap();
        let report = HypothesisTestHarness::statrs()
            .normality(&table, alpha)
            .unwrap();
        let labels = report.results.iter().map(|r| r.label.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, vec!["x", "y", "skewed"]);
        assert_eq!(report.results[0].decision, Decision::FailToReject);
        assert_eq!(report.results[1].decision, Decision::FailToReject);
        assert_eq!(report.results[2].decision, Decision::RejectNull);
        assert_eq!(
            report.results[2].conclusion,
            "skewed does not follow a normal distribution"
        );
    }

    #[test]
    fn test_normality_and_variance() {
        let table = Table::default()
            .with_column("a", vec![1.0, 2.0, 3.0, 4.0, 5.0])
            .with_column("b", vec![2.0, 4.0, 6.0, 8.0, 10.0]);
        let reports = HypothesisTestHarness::statrs()
            .normality_and_variance(&table, Alpha::default(), Center::Mean)
            .unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].title, "Shapiro-Wilk");
        assert_eq!(reports[0].results.len(), 2);
        assert_eq!(reports[1].title, "Levene");
        let levene = &reports[1].results[0];
        assert_abs_diff_eq!(levene.statistic, 2.057_143, epsilon = 1e-6);
        assert_eq!(levene.decision, Decision::FailToReject);
        assert_eq!(levene.conclusion, "Equal variances");
    }

    #[test]
    fn test_nonparametric_adapters() {
        let harness = HypothesisTestHarness::statrs();
        let alpha = Alpha::default();
        let report = harness
            .mann_whitney(&two_columns(), alpha, Alternative::TwoSided)
            .unwrap();
        assert_abs_diff_eq!(report.results[0].p_value, 2.0 / 252.0, epsilon = 1e-12);

        let table = Table::default()
            .with_column("low", vec![1.0, 2.0, 3.0, 4.0])
            .with_column("mid", vec![5.0, 6.0, 7.0, 8.0])
            .with_column("high", vec![9.0, 10.0, 11.0, 12.0]);
        let report = harness.friedman(&table, alpha).unwrap();
        assert_abs_diff_eq!(report.results[0].statistic, 8.0, epsilon = 1e-9);
        assert_eq!(report.results[0].decision, Decision::RejectNull);

        let report = harness.one_way_anova(&table, alpha).unwrap();
        assert_eq!(report.results[0].statistic_name, "F");
        assert!(report.any_rejected());
    }

    #[test]
    fn test_backend_errors_propagate() {
        let table = Table::default()
            .with_column("a", vec![1.0, 1.0, 1.0])
            .with_column("b", vec![2.0, 2.0, 2.0]);
        let err = HypothesisTestHarness::statrs()
            .one_way_anova(&table, Alpha::default())
            .unwrap_err();
        assert!(matches!(
            err,
            TestError::NumericalDomain {
                test: "One-way ANOVA",
                ..
            }
        ));
    }
}
