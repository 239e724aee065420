//! Text rendering of test reports.
//!
//! Computing a test never prints anything. A [`TestReport`] is a plain value
//! that callers render with [`fmt::Display`] or write to any [`io::Write`]
//! sink with [`write_reports`].

use std::{fmt, io};

use serde::Serialize;

use crate::decision::TestResult;

/// The results of one adapter invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestReport {
    /// Name of the test that produced the results.
    pub title: String,
    pub results: Vec<TestResult>,
}

impl TestReport {
    #[must_use]
    pub fn new(title: impl Into<String>, results: Vec<TestResult>) -> Self {
        Self {
            title: title.into(),
            results,
        }
    }

    /// Whether any result rejected its null hypothesis.
    #[must_use]
    pub fn any_rejected(&self) -> bool {
        self.results.iter().any(|r| r.decision.is_reject())
    }
}

impl fmt::Display for TestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        for result in &self.results {
            write!(f, "\n{result}")?;
        }
        Ok(())
    }
}

/// Writes reports separated by blank lines.
pub fn write_reports<W>(mut writer: W, reports: &[TestReport]) -> io::Result<()>
where
    W: io::Write,
{
    for (i, report) in reports.iter().enumerate() {
        if i > 0 {
            writeln!(writer)?;
        }
        writeln!(writer, "{report}")?;
    }
    writer.flush()
}
