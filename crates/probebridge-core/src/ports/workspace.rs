//! Workspace accessor port.

use std::path::PathBuf;

use crate::error::WorkspaceError;

/// Where the bridge runs and where its generated config lives.
pub trait WorkspacePort: Send + Sync {
    /// Working directory for the spawned process.
    fn working_dir(&self) -> Result<PathBuf, WorkspaceError>;

    /// Writable path for the generated configuration file.
    fn config_file_path(&self) -> Result<PathBuf, WorkspaceError>;
}
