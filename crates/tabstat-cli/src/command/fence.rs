use std::fmt;

use anyhow::Context as _;
use clap::Args;
use serde::Serialize;
use tabstat_stats::{
    fence::{DEFAULT_MULTIPLIER, Fence},
    sample::Sample,
};

use crate::{command::IoArg, util};

#[derive(Debug, Clone, Args)]
pub(crate) struct FenceArg {
    #[clap(flatten)]
    pub io: IoArg,

    /// Column to filter
    #[arg(long)]
    pub column: String,

    /// IQR multiplier of the fence
    #[arg(long, default_value_t = DEFAULT_MULTIPLIER)]
    pub k: f64,
}

#[derive(Debug, Serialize)]
struct FenceOutcome {
    fence: Fence,
    retained: Vec<f64>,
    removed: Vec<f64>,
}

impl FenceOutcome {
    fn new(sample: &Sample, k: f64) -> anyhow::Result<Self> {
        let fence = Fence::from_sample(sample, k)?;
        let (retained, removed) = fence.partition(sample);
        Ok(Self {
            fence,
            retained,
            removed,
        })
    }
}

impl fmt::Display for FenceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fence = &self.fence;
        writeln!(
            f,
            "Q1 = {:.3}, Q3 = {:.3}, IQR = {:.3}",
            fence.q1, fence.q3, fence.iqr
        )?;
        writeln!(f, "Fence: [{:.3}, {:.3}]", fence.lower, fence.upper)?;
        writeln!(f, "Retained ({}): {:?}", self.retained.len(), self.retained)?;
        write!(f, "Removed ({}): {:?}", self.removed.len(), self.removed)
    }
}

pub(crate) fn run(arg: &FenceArg) -> anyhow::Result<()> {
    let table = util::read_table_file(&arg.io.table)?;
    let column = table.require(&arg.column)?;
    let outcome = FenceOutcome::new(&column.sample, arg.k)
        .with_context(|| format!("Failed to fence column `{}`", arg.column))?;
    let mut output = util::Output::from_output_path(arg.io.output.clone())?;
    output.emit(&outcome, arg.io.json)
}
