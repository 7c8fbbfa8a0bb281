//! Command handlers.
//!
//! Handlers follow the canonical pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Thin wrappers that:
//!   1. Parse/validate CLI-specific input
//!   2. Call the supervisor or the settings store
//!   3. Format output for the terminal

pub mod config;
pub mod port;
pub mod run;
pub mod settings;
