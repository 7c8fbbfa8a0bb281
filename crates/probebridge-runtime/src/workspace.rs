//! Directory-backed workspace accessor.

use std::path::{Path, PathBuf};

use probebridge_core::{WorkspaceError, WorkspacePort};
use tracing::debug;

/// Directory holding generated files inside the workspace.
pub const STATE_DIR: &str = ".probebridge";

/// Generated configuration file name.
pub const CONFIG_FILE: &str = "openocd.cfg";

/// A workspace rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryWorkspace {
    root: PathBuf,
}

impl DirectoryWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl WorkspacePort for DirectoryWorkspace {
    fn working_dir(&self) -> Result<PathBuf, WorkspaceError> {
        if self.root.is_dir() {
            Ok(self.root.clone())
        } else {
            Err(WorkspaceError::NoWorkspace)
        }
    }

    fn config_file_path(&self) -> Result<PathBuf, WorkspaceError> {
        Ok(self.working_dir()?.join(STATE_DIR).join(CONFIG_FILE))
    }
}

/// Write `contents` to `path` unless the file already holds exactly that.
///
/// Returns whether the file was written.
pub async fn write_if_changed(path: &Path, contents: &str) -> Result<bool, WorkspaceError> {
    let not_writable = |e: std::io::Error| WorkspaceError::NotWritable {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    if let Ok(existing) = tokio::fs::read_to_string(path).await {
        if existing == contents {
            debug!(path = %path.display(), "Config unchanged, not rewriting");
            return Ok(false);
        }
    }
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(not_writable)?;
    }
    tokio::fs::write(path, contents).await.map_err(not_writable)?;
    debug!(path = %path.display(), "Wrote config");
    Ok(true)
}
