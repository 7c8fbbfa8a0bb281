//! Config command handler.
//!
//! Prints the configuration the next start would write, without spawning
//! anything or touching the workspace.

use anyhow::Result;
use probebridge_core::{BridgeConfig, BridgeError, BridgeSettings, BridgeSettingsPort, PortSetting};
use probebridge_runtime::allocate_free_port;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Execute the config command.
pub async fn execute(ctx: &CliContext, port: Option<u16>) -> Result<()> {
    let settings = ctx.settings.load().await.map_err(CliError::from)?;
    let text = preview(&settings, port).map_err(CliError::from)?;
    print!("{text}");
    Ok(())
}

/// Render the configuration for `port`, falling back to the configured port
/// and then to a free one.
fn preview(settings: &BridgeSettings, port: Option<u16>) -> Result<String, BridgeError> {
    let port = match port.map(PortSetting::from).unwrap_or(settings.port) {
        PortSetting::Fixed(port) => port,
        PortSetting::Auto => {
            allocate_free_port().map_err(|e| BridgeError::PortAllocation(e.to_string()))?
        }
    };
    Ok(BridgeConfig::from_settings(settings, port)?.render()?)
}
