//! Locating the OpenOCD executable.

use std::env;
use std::path::{Path, PathBuf};

use probebridge_core::BridgeError;
use tracing::debug;

/// Environment variable overriding the executable path.
pub const EXECUTABLE_ENV: &str = "PROBEBRIDGE_OPENOCD";

/// Executable name searched on `PATH`.
pub const DEFAULT_EXECUTABLE: &str = "openocd";

/// Resolve the bridge executable.
///
/// Order: `explicit`, then [`EXECUTABLE_ENV`], then `openocd` on `PATH`.
pub fn resolve_bridge_executable(explicit: Option<&Path>) -> Result<PathBuf, BridgeError> {
    if let Some(path) = explicit {
        return check_file(path);
    }

    if let Some(path) = env::var_os(EXECUTABLE_ENV).filter(|value| !value.is_empty()) {
        debug!(var = EXECUTABLE_ENV, "Using executable from environment");
        return check_file(Path::new(&path));
    }

    which::which(DEFAULT_EXECUTABLE).map_err(|e| {
        BridgeError::ExecutableNotFound(format!("{DEFAULT_EXECUTABLE} not found on PATH: {e}"))
    })
}

fn check_file(path: &Path) -> Result<PathBuf, BridgeError> {
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(BridgeError::ExecutableNotFound(path.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn explicit_path_must_exist() {
        let file = NamedTempFile::new().unwrap();
        assert_eq!(
            resolve_bridge_executable(Some(file.path())).unwrap(),
            file.path()
        );
        assert!(matches!(
            resolve_bridge_executable(Some(Path::new("/nonexistent/openocd"))),
            Err(BridgeError::ExecutableNotFound(_))
        ));
    }
}
