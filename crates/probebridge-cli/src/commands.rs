//! Subcommand definitions.

use std::path::PathBuf;

use clap::Subcommand;
use probebridge_core::TransportKind;

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Start the bridge and supervise it until Ctrl-C
    Run {
        /// OpenOCD executable (defaults to $PROBEBRIDGE_OPENOCD, then PATH)
        #[arg(long)]
        executable: Option<PathBuf>,
        /// Adapter transport for this run: jtag, ftdi or custom
        #[arg(long)]
        transport: Option<TransportKind>,
        /// Remote-protocol port for this run (0 = pick a free port)
        #[arg(long)]
        port: Option<u16>,
        /// Extra OpenOCD arguments for this run
        #[arg(long = "extra-args", allow_hyphen_values = true)]
        extra_args: Option<String>,
    },
    /// Print the configuration the next start would write
    Config {
        /// Port to render (defaults to the configured port or a free one)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print a free TCP port
    Port,
    /// View or change persisted settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

/// Settings command variants.
#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Show the effective settings
    Show,
    /// Set the adapter transport
    SetTransport {
        /// jtag, ftdi or custom
        transport: TransportKind,
    },
    /// Set the remote-protocol port (0 = pick a free port on each start)
    SetPort { port: u16 },
    /// Set extra OpenOCD arguments (empty string clears them)
    SetExtraArgs {
        #[arg(allow_hyphen_values = true)]
        args: String,
    },
}
