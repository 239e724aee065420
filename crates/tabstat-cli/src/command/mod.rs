use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use self::{bins::BinsArg, fence::FenceArg, frequency::FrequencyArg, test::TestArg};

mod bins;
mod fence;
mod frequency;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Frequency table of a column
    Frequency(#[clap(flatten)] FrequencyArg),
    /// Fixed-width bin counts of a continuous column
    Bins(#[clap(flatten)] BinsArg),
    /// Remove outliers outside an IQR fence
    Fence(#[clap(flatten)] FenceArg),
    /// Run a hypothesis test over columns
    Test(#[clap(flatten)] TestArg),
}

/// Input and output options shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub(crate) struct IoArg {
    /// Path to the table JSON file
    pub table: PathBuf,

    /// Write JSON instead of a text table
    #[arg(long)]
    pub json: bool,

    /// Write to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Frequency(arg) => frequency::run(&arg)?,
        Mode::Bins(arg) => bins::run(&arg)?,
        Mode::Fence(arg) => fence::run(&arg)?,
        Mode::Test(arg) => test::run(&arg)?,
    }
    Ok(())
}
