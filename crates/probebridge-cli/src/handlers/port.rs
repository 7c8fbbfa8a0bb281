//! Port command handler.

use anyhow::Result;
use probebridge_runtime::allocate_free_port;

use crate::error::CliError;

/// Print a currently free TCP port.
pub fn execute() -> Result<()> {
    let port = allocate_free_port().map_err(CliError::from)?;
    println!("{port}");
    Ok(())
}
