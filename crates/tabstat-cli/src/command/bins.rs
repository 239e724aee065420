use std::fmt;

use anyhow::Context as _;
use clap::Args;
use serde::Serialize;
use tabstat_stats::binning::BinnedCounts;

use crate::{command::IoArg, util};

#[derive(Debug, Clone, Args)]
pub(crate) struct BinsArg {
    #[clap(flatten)]
    pub io: IoArg,

    /// Column to bin
    #[arg(long)]
    pub column: String,

    /// Width of each bin
    #[arg(long)]
    pub width: f64,

    /// Print the full frequency table of the bins instead of bare counts
    #[arg(long = "table", id = "full_table")]
    pub full_table: bool,
}

pub(crate) fn run(arg: &BinsArg) -> anyhow::Result<()> {
    let table = util::read_table_file(&arg.io.table)?;
    let column = table.require(&arg.column)?;
    let binned = BinnedCounts::from_sample(&column.sample, arg.width)
        .with_context(|| format!("Failed to bin column `{}`", arg.column))?;
    if binned.outside > 0 {
        log::info!(
            "{} values of `{}` lie on or beyond the last bin edge",
            binned.outside,
            arg.column
        );
    }

    let mut output = util::Output::from_output_path(arg.io.output.clone())?;
    if arg.full_table {
        let frequencies = binned
            .to_frequency_table()
            .with_context(|| format!("No value of `{}` fell in any bin", arg.column))?;
        output.emit(&frequencies, arg.io.json)
    } else {
        output.emit(&BinTable(&binned), arg.io.json)
    }
}

/// Text rendering of bin counts, one row per bin.
#[derive(Serialize)]
#[serde(transparent)]
struct BinTable<'a>(&'a BinnedCounts);

impl fmt::Display for BinTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<24} {:>10}", "Bin", "Frequency")?;
        writeln!(f, "{}", "-".repeat(35))?;
        for row in &self.0.bins {
            writeln!(f, "{:<24} {:>10}", row.bin.to_string(), row.count)?;
        }
        write!(f, "{:<24} {:>10}", "(outside)", self.0.outside)
    }
}
