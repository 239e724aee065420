//! Samples, named columns, and column tables.
//!
//! A [`Sample`] is an ordered sequence of numeric values in which any entry
//! may be missing. Missing entries are `None` or `NaN`; both are dropped by
//! [`Sample::observed`], which is the view every statistic works on.
//!
//! A [`Table`] is an ordered list of named [`Column`]s. Column order is kept
//! exactly as supplied, since several consumers treat it as sample order.
//!
//! # Examples
//!
//! ```
//! use tabstat_stats::sample::{Column, Sample, Table};
//!
//! let table = Table::new(vec![
//!     Column::new("before", Sample::new(vec![Some(5.0), None, Some(7.0)])),
//!     Column::new("after", Sample::from(vec![5.5, 6.1, 7.2])),
//! ]);
//!
//! assert_eq!(table.names(), vec!["before", "after"]);
//! assert_eq!(table.columns()[0].sample.observed_values(), vec![5.0, 7.0]);
//! ```

use serde::{Deserialize, Serialize};

use crate::SummaryError;

/// An ordered sequence of numeric values, possibly containing missing entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sample {
    values: Vec<Option<f64>>,
}

impl Sample {
    #[must_use]
    pub fn new(values: Vec<Option<f64>>) -> Self {
        Self { values }
    }

    /// Number of entries, missing ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the entry at `index`, or `None` when it is missing or out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values
            .get(index)
            .copied()
            .flatten()
            .filter(|v| !v.is_nan())
    }

    /// Raw entries in their original order.
    #[must_use]
    pub fn raw(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Iterates over the non-missing values, preserving order.
    pub fn observed(&self) -> impl Iterator<Item = f64> + '_ {
        self.values
            .iter()
            .filter_map(|v| v.filter(|x| !x.is_nan()))
    }

    #[must_use]
    pub fn observed_values(&self) -> Vec<f64> {
        self.observed().collect()
    }

    /// Non-missing values sorted in ascending order.
    #[must_use]
    pub fn sorted_observed(&self) -> Vec<f64> {
        let mut sorted = self.observed_values();
        sorted.sort_by(f64::total_cmp);
        sorted
    }

    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.len() - self.observed().count()
    }
}

impl From<Vec<f64>> for Sample {
    fn from(values: Vec<f64>) -> Self {
        values.into_iter().collect()
    }
}

impl From<Vec<Option<f64>>> for Sample {
    fn from(values: Vec<Option<f64>>) -> Self {
        Self::new(values)
    }
}

impl FromIterator<f64> for Sample {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Some).collect())
    }
}

impl FromIterator<Option<f64>> for Sample {
    fn from_iter<I: IntoIterator<Item = Option<f64>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A named sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "values")]
    pub sample: Sample,
}

impl Column {
    #[must_use]
    pub fn new(name: impl Into<String>, sample: Sample) -> Self {
        Self {
            name: name.into(),
            sample,
        }
    }
}

/// An ordered collection of named samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    #[must_use]
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Appends a column, keeping the existing order.
    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, sample: impl Into<Sample>) -> Self {
        self.columns.push(Column::new(name, sample.into()));
        self
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Looks up a column by name.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::UnknownColumn`] if no column has that name.
    pub fn require(&self, name: &str) -> Result<&Column, SummaryError> {
        self.column(name).ok_or_else(|| SummaryError::UnknownColumn {
            name: name.to_owned(),
        })
    }

    /// Builds a sub-table holding the named columns in the requested order.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::UnknownColumn`] for the first name that is not present.
    ///
    /// # Examples
    ///
    /// ```
    /// use tabstat_stats::sample::Table;
    ///
    /// let table = Table::default()
    ///     .with_column("a", vec![1.0])
    ///     .with_column("b", vec![2.0])
    ///     .with_column("c", vec![3.0]);
    /// let selected = table.select(&["c", "a"]).unwrap();
    /// assert_eq!(selected.names(), vec!["c", "a"]);
    /// assert!(table.select(&["z"]).is_err());
    /// ```
    pub fn select<S>(&self, names: &[S]) -> Result<Self, SummaryError>
    where
        S: AsRef<str>,
    {
        let columns = names
            .iter()
            .map(|name| self.require(name.as_ref()).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { columns })
    }
}
