use anyhow::Context as _;
use clap::Args;
use tabstat_stats::{frequency::FrequencyTable, sample::Table};

use crate::{command::IoArg, util};

#[derive(Debug, Clone, Args)]
pub(crate) struct FrequencyArg {
    #[clap(flatten)]
    pub io: IoArg,

    /// Column to summarize
    #[arg(long)]
    pub column: String,

    /// Treat the column as already-aggregated frequencies, one row per entry
    #[arg(long)]
    pub precomputed: bool,

    /// Column holding the row labels of precomputed frequencies
    #[arg(long, requires = "precomputed")]
    pub labels: Option<String>,
}

pub(crate) fn run(arg: &FrequencyArg) -> anyhow::Result<()> {
    let table = util::read_table_file(&arg.io.table)?;
    let frequencies = build(arg, &table)?;
    let mut output = util::Output::from_output_path(arg.io.output.clone())?;
    output.emit(&frequencies, arg.io.json)
}

fn build(arg: &FrequencyArg, table: &Table) -> anyhow::Result<FrequencyTable<String>> {
    let column = table.require(&arg.column)?;
    let context = || format!("Failed to build frequency table for column `{}`", arg.column);

    if !arg.precomputed {
        let frequencies = FrequencyTable::from_sample(&column.sample).with_context(context)?;
        return Ok(frequencies.map_keys(|value| value.to_string()));
    }

    let frequencies = FrequencyTable::from_frequency_column(&column.sample).with_context(context)?;
    match &arg.labels {
        Some(name) => {
            let labels = &table.require(name)?.sample;
            Ok(frequencies.map_keys(|i| {
                labels
                    .get(i)
                    .map_or_else(|| "-".to_owned(), |label| label.to_string())
            }))
        }
        None => Ok(frequencies.map_keys(|i| i.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn arg(column: &str, precomputed: bool, labels: Option<&str>) -> FrequencyArg {
        FrequencyArg {
            io: IoArg {
                table: PathBuf::from("unused.json"),
                json: false,
                output: None,
            },
            column: column.to_owned(),
            precomputed,
            labels: labels.map(str::to_owned),
        }
    }

    fn table() -> Table {
        Table::default()
            .with_column("score", vec![3.0, 1.0, 3.0, 2.0])
            .with_column("count", vec![Some(4.0), None, Some(6.0)])
            .with_column("grade", vec![10.0, 20.0, 30.0])
    }

    #[test]
    fn test_raw_mode() {
        let frequencies = build(&arg("score", false, None), &table()).unwrap();
        let keys = frequencies.iter().map(|r| r.key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["1", "2", "3"]);
        assert_eq!(frequencies.rows()[2].frequency, 2.0);
    }

    #[test]
    fn test_precomputed_with_labels() {
        let frequencies = build(&arg("count", true, Some("grade")), &table()).unwrap();
        let keys = frequencies.iter().map(|r| r.key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["10", "30"]);
        assert_eq!(frequencies.rows()[0].relative_frequency, 0.4);
    }

    #[test]
    fn test_unknown_column() {
        let err = build(&arg("nope", false, None), &table()).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}
