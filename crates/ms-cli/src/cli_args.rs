use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "ms-cli")]
#[command(about = "Automation script runner for line-oriented remote sessions")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Compile and execute a script. Display output goes to stdout; network
    /// output goes to the connected session, or to stderr without --connect.
    Run(RunArgs),
    /// Compile a script and report load errors without executing it.
    Check(CheckArgs),
    /// List .mscript files under a directory.
    List(ListArgs),
}

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    pub(crate) script: PathBuf,
    /// JSON state file backing saveVar/loadVar across runs.
    #[arg(long = "state")]
    pub(crate) state: Option<PathBuf>,
    /// Abort after this many executed instructions.
    #[arg(long = "max-steps")]
    pub(crate) max_steps: Option<usize>,
    /// host:port of the remote session to transmit to.
    #[arg(long = "connect")]
    pub(crate) connect: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct CheckArgs {
    pub(crate) script: PathBuf,
}

#[derive(Debug, Args)]
pub(crate) struct ListArgs {
    pub(crate) dir: PathBuf,
}
