//! Command-line adapter for probebridge.
//!
//! `main.rs` parses arguments, builds a [`CliContext`] through [`bootstrap`]
//! and dispatches to [`handlers`].

#![deny(unused_crate_dependencies)]

// Used by main.rs only
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;

pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::{Commands, SettingsCommand};
pub use error::CliError;
pub use parser::Cli;
