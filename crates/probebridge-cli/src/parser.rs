//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Supervise an OpenOCD debug bridge.
#[derive(Parser)]
#[command(name = "probebridge")]
#[command(about = "Start, watch and stop an OpenOCD debug bridge")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Project directory holding the generated configuration
    #[arg(long, global = true, env = "PROBEBRIDGE_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Settings file to use instead of the per-user default
    #[arg(long = "settings-file", global = true, env = "PROBEBRIDGE_SETTINGS")]
    pub settings_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
