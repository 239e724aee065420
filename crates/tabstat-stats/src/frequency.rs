//! Frequency distribution tables.
//!
//! A [`FrequencyTable`] holds one [`FrequencyRow`] per category with four
//! columns: frequency, relative frequency, and the running sums of both.
//!
//! Tables are built in one of two modes:
//!
//! - **Raw** ([`FrequencyTable::from_sample`]): distinct values are counted
//!   and rows are ordered by value, ascending.
//! - **Precomputed** ([`FrequencyTable::from_frequencies`],
//!   [`FrequencyTable::from_frequency_column`]): the input already holds
//!   aggregated frequencies, and rows keep the order the caller supplied.
//!   No sorting is applied in this mode.
//!
//! In both modes the cumulative columns are running sums over the final row
//! order, so they are non-decreasing and the last cumulative relative
//! frequency is 1.

use std::fmt;

use serde::Serialize;

use crate::{SummaryError, sample::Sample};

/// A single row of a frequency table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FrequencyRow<K> {
    /// The category value or label this row describes.
    pub key: K,
    pub frequency: f64,
    pub relative_frequency: f64,
    pub cumulative_frequency: f64,
    pub cumulative_relative_frequency: f64,
}

/// Frequency, relative, and cumulative summary of a categorical breakdown.
///
/// # Examples
///
/// ```
/// use tabstat_stats::frequency::FrequencyTable;
///
/// // Precomputed mode keeps the supplied order.
/// let table = FrequencyTable::from_frequencies([("b", 1.0), ("a", 3.0)]).unwrap();
/// assert_eq!(table.rows()[0].key, "b");
/// assert_eq!(table.rows()[1].cumulative_relative_frequency, 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FrequencyTable<K> {
    rows: Vec<FrequencyRow<K>>,
}

impl<K> FrequencyTable<K> {
    /// Builds a table from already-aggregated `(key, frequency)` pairs.
    ///
    /// Rows keep the order of `entries`.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::DivisionByZero`] if the frequencies sum to zero
    /// (including an empty input), or [`SummaryError::NumericalDomain`] if any
    /// frequency is negative or not finite.
    pub fn from_frequencies<I>(entries: I) -> Result<Self, SummaryError>
    where
        I: IntoIterator<Item = (K, f64)>,
    {
        let entries = entries.into_iter().collect::<Vec<_>>();
        if let Some((_, bad)) = entries
            .iter()
            .find(|(_, freq)| !freq.is_finite() || *freq < 0.0)
        {
            return Err(SummaryError::domain(format!(
                "frequencies must be non-negative finite numbers, got {bad}"
            )));
        }

        let total = entries.iter().map(|(_, freq)| freq).sum::<f64>();
        if total <= 0.0 {
            return Err(SummaryError::DivisionByZero);
        }

        let mut cumulative_frequency = 0.0;
        let mut cumulative_relative_frequency = 0.0;
        let rows = entries
            .into_iter()
            .map(|(key, frequency)| {
                let relative_frequency = frequency / total;
                cumulative_frequency += frequency;
                cumulative_relative_frequency += relative_frequency;
                FrequencyRow {
                    key,
                    frequency,
                    relative_frequency,
                    cumulative_frequency,
                    cumulative_relative_frequency,
                }
            })
            .collect::<Vec<_>>();

        log::debug!(
            "built frequency table with {} rows, total {total}",
            rows.len()
        );
        Ok(Self { rows })
    }

    #[must_use]
    pub fn rows(&self) -> &[FrequencyRow<K>] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrequencyRow<K>> {
        self.rows.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of all frequencies.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.rows.last().map_or(0.0, |row| row.cumulative_frequency)
    }

    /// Replaces each key, keeping all frequency columns.
    #[must_use]
    pub fn map_keys<L, F>(self, mut f: F) -> FrequencyTable<L>
    where
        F: FnMut(K) -> L,
    {
        FrequencyTable {
            rows: self
                .rows
                .into_iter()
                .map(|row| FrequencyRow {
                    key: f(row.key),
                    frequency: row.frequency,
                    relative_frequency: row.relative_frequency,
                    cumulative_frequency: row.cumulative_frequency,
                    cumulative_relative_frequency: row.cumulative_relative_frequency,
                })
                .collect(),
        }
    }
}

impl FrequencyTable<f64> {
    /// Counts the distinct observed values of a sample (raw mode).
    ///
    /// Rows are ordered by value, ascending. Missing entries are not counted.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::DivisionByZero`] if the sample has no observed values.
    ///
    /// # Examples
    ///
    /// ```
    /// use tabstat_stats::{frequency::FrequencyTable, sample::Sample};
    ///
    /// let sample = Sample::from(vec![3.0, 1.0, 3.0]);
    /// let table = FrequencyTable::from_sample(&sample).unwrap();
    /// let keys = table.iter().map(|row| row.key).collect::<Vec<_>>();
    /// assert_eq!(keys, vec![1.0, 3.0]);
    /// ```
    pub fn from_sample(sample: &Sample) -> Result<Self, SummaryError> {
        let sorted = sample.sorted_observed();
        let mut counts: Vec<(f64, f64)> = vec![];
        for value in sorted {
            match counts.last_mut() {
                Some((last, count)) if *last == value => *count += 1.0,
                _ => counts.push((value, 1.0)),
            }
        }
        Self::from_frequencies(counts)
    }
}

impl FrequencyTable<usize> {
    /// Treats a column as already-aggregated frequencies (precomputed mode).
    ///
    /// Each row is keyed by its position in the column. Rows keep the column
    /// order; missing entries are dropped along with their position.
    ///
    /// # Errors
    ///
    /// Same as [`FrequencyTable::from_frequencies`].
    pub fn from_frequency_column(sample: &Sample) -> Result<Self, SummaryError> {
        let missing = sample.missing_count();
        if missing > 0 {
            log::warn!("dropping {missing} missing frequencies");
        }
        Self::from_frequencies(
            sample
                .raw()
                .iter()
                .enumerate()
                .filter_map(|(i, v)| v.filter(|x| !x.is_nan()).map(|x| (i, x))),
        )
    }
}

impl<K> fmt::Display for FrequencyTable<K>
where
    K: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<20} {:>12} {:>18} {:>20} {:>28}",
            "", "Frequency", "RelativeFrequency", "CumulativeFrequency", "CumulativeRelativeFrequency"
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<20} {:>12} {:>18.4} {:>20} {:>28.4}",
                row.key.to_string(),
                row.frequency,
                row.relative_frequency,
                row.cumulative_frequency,
                row.cumulative_relative_frequency,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::*;

    fn assert_monotonic<K>(table: &FrequencyTable<K>) {
        for pair in table.rows().windows(2) {
            assert!(pair[0].cumulative_frequency <= pair[1].cumulative_frequency);
            assert!(pair[0].cumulative_relative_frequency <= pair[1].cumulative_relative_frequency);
        }
    }

    #[test]
    fn test_raw_mode_textbook() {
        let sample = Sample::from(vec![1.0, 1.0, 2.0, 3.0, 3.0, 3.0]);
        let table = FrequencyTable::from_sample(&sample).unwrap();
        let rows = table.rows();
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].key, 1.0);
        assert_eq!(rows[0].frequency, 2.0);
        assert_relative_eq!(rows[0].relative_frequency, 1.0 / 3.0);
        assert_eq!(rows[0].cumulative_frequency, 2.0);
        assert_relative_eq!(rows[0].cumulative_relative_frequency, 1.0 / 3.0);

        assert_eq!(rows[1].key, 2.0);
        assert_eq!(rows[1].frequency, 1.0);
        assert_relative_eq!(rows[1].relative_frequency, 1.0 / 6.0);
        assert_eq!(rows[1].cumulative_frequency, 3.0);
        assert_relative_eq!(rows[1].cumulative_relative_frequency, 0.5);

        assert_eq!(rows[2].key, 3.0);
        assert_eq!(rows[2].frequency, 3.0);
        assert_relative_eq!(rows[2].relative_frequency, 0.5);
        assert_eq!(rows[2].cumulative_frequency, 6.0);
        assert_relative_eq!(rows[2].cumulative_relative_frequency, 1.0);
    }

    #[test]
    fn test_raw_mode_sorts_and_skips_missing() {
        let sample = Sample::new(vec![Some(5.0), None, Some(-2.0), Some(5.0), Some(f64::NAN)]);
        let table = FrequencyTable::from_sample(&sample).unwrap();
        let keys = table.iter().map(|row| row.key).collect::<Vec<_>>();
        assert_eq!(keys, vec![-2.0, 5.0]);
        assert_eq!(table.total(), 3.0);
    }

    #[test]
    fn test_relative_frequencies_sum_to_one() {
        let sample = Sample::from(vec![0.1, 0.2, 0.2, 0.7, 0.7, 0.7, 1.3, 2.9, 2.9]);
        let table = FrequencyTable::from_sample(&sample).unwrap();
        let sum = table.iter().map(|row| row.relative_frequency).sum::<f64>();
        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            table.rows().last().unwrap().cumulative_relative_frequency,
            1.0,
            epsilon = 1e-12
        );
        assert_monotonic(&table);
    }

    #[test]
    fn test_precomputed_mode_keeps_order() {
        let sample = Sample::from(vec![5.0, 1.0, 4.0]);
        let table = FrequencyTable::from_frequency_column(&sample).unwrap();
        let keys = table.iter().map(|row| row.key).collect::<Vec<_>>();
        assert_eq!(keys, vec![0, 1, 2]);
        let freqs = table.iter().map(|row| row.frequency).collect::<Vec<_>>();
        assert_eq!(freqs, vec![5.0, 1.0, 4.0]);
        let cumulative = table
            .iter()
            .map(|row| row.cumulative_frequency)
            .collect::<Vec<_>>();
        assert_eq!(cumulative, vec![5.0, 6.0, 10.0]);
        assert_relative_eq!(table.rows()[0].relative_frequency, 0.5);
        assert_monotonic(&table);
    }

    #[test]
    fn test_precomputed_mode_drops_missing_rows() {
        let sample = Sample::new(vec![Some(2.0), None, Some(2.0)]);
        let table = FrequencyTable::from_frequency_column(&sample).unwrap();
        let keys = table.iter().map(|row| row.key).collect::<Vec<_>>();
        assert_eq!(keys, vec![0, 2]);
    }

    #[test]
    fn test_zero_total_is_division_by_zero() {
        assert_eq!(
            FrequencyTable::from_frequencies([("a", 0.0), ("b", 0.0)]),
            Err(SummaryError::DivisionByZero)
        );
        assert_eq!(
            FrequencyTable::from_sample(&Sample::default()),
            Err(SummaryError::DivisionByZero)
        );
    }

    #[test]
    fn test_negative_frequency_is_rejected() {
        assert!(matches!(
            FrequencyTable::from_frequencies([("a", 2.0), ("b", -1.0)]),
            Err(SummaryError::NumericalDomain { .. })
        ));
    }

    #[test]
    fn test_map_keys() {
        let table = FrequencyTable::from_frequencies([(1, 1.0), (2, 3.0)])
            .unwrap()
            .map_keys(|k| format!("#{k}"));
        assert_eq!(table.rows()[1].key, "#2");
        assert_eq!(table.rows()[1].cumulative_frequency, 4.0);
    }

    #[test]
    fn test_serializes_with_named_columns() {
        let table = FrequencyTable::from_frequencies([("a", 1.0)]).unwrap();
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json[0]["Key"], "a");
        assert_eq!(json[0]["Frequency"], 1.0);
        assert_eq!(json[0]["CumulativeRelativeFrequency"], 1.0);
    }
}
