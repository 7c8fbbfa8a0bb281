//! Layered settings storage.
//!
//! Persisted settings live in a JSON file; session settings are an in-memory
//! overlay that disappears with the process. `load` returns the persisted
//! values with the overlay applied on top.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use probebridge_core::{
    BridgeSettings, BridgeSettingsPort, SettingsError, SettingsScope, SettingsUpdate,
    validate_settings,
};
use tracing::{debug, info};

/// Directory name under the platform config dir.
const APP_DIR: &str = "probebridge";

/// Settings file name.
const SETTINGS_FILE: &str = "settings.json";

/// Location of the persisted settings file.
pub fn default_settings_path() -> Result<PathBuf, SettingsError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
        .ok_or_else(|| SettingsError::Io("cannot determine user config directory".to_string()))
}

enum Backing {
    File(PathBuf),
    Memory(Mutex<BridgeSettings>),
}

/// [`BridgeSettingsPort`] with a persisted layer and a session overlay.
pub struct LayeredSettingsStore {
    backing: Backing,
    session: Mutex<SettingsUpdate>,
}

impl LayeredSettingsStore {
    /// Store persisted settings at `path`.
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            backing: Backing::File(path.into()),
            session: Mutex::new(SettingsUpdate::default()),
        }
    }

    /// Keep both layers in memory.
    pub fn in_memory(initial: BridgeSettings) -> Self {
        Self {
            backing: Backing::Memory(Mutex::new(initial)),
            session: Mutex::new(SettingsUpdate::default()),
        }
    }

    /// The persisted layer without session overrides.
    pub async fn persisted(&self) -> Result<BridgeSettings, SettingsError> {
        match &self.backing {
            Backing::File(path) => read_settings_file(path).await,
            Backing::Memory(settings) => Ok(lock(settings).clone()),
        }
    }

    /// Session overrides currently in effect.
    pub fn session_overrides(&self) -> SettingsUpdate {
        lock(&self.session).clone()
    }

    async fn write_persisted(&self, update: &SettingsUpdate) -> Result<(), SettingsError> {
        let mut settings = self.persisted().await?;
        settings.merge(update);
        validate_settings(&settings)?;

        match &self.backing {
            Backing::File(path) => write_settings_file(path, &settings).await,
            Backing::Memory(stored) => {
                *lock(stored) = settings;
                Ok(())
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

async fn read_settings_file(path: &Path) -> Result<BridgeSettings, SettingsError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) if text.trim().is_empty() => Ok(BridgeSettings::default()),
        Ok(text) => serde_json::from_str(&text).map_err(|e| SettingsError::Parse(e.to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No settings file yet, using defaults");
            Ok(BridgeSettings::default())
        }
        Err(e) => Err(SettingsError::Io(format!("{}: {e}", path.display()))),
    }
}

async fn write_settings_file(path: &Path, settings: &BridgeSettings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| SettingsError::Io(format!("{}: {e}", parent.display())))?;
    }
    let json =
        serde_json::to_string_pretty(settings).map_err(|e| SettingsError::Parse(e.to_string()))?;
    tokio::fs::write(path, json + "\n")
        .await
        .map_err(|e| SettingsError::Io(format!("{}: {e}", path.display())))?;
    info!(path = %path.display(), "Saved settings");
    Ok(())
}

#[async_trait]
impl BridgeSettingsPort for LayeredSettingsStore {
    async fn load(&self) -> Result<BridgeSettings, SettingsError> {
        let mut settings = self.persisted().await?;
        settings.merge(&self.session_overrides());
        Ok(settings)
    }

    async fn update(
        &self,
        scope: SettingsScope,
        update: SettingsUpdate,
    ) -> Result<(), SettingsError> {
        if update.is_empty() {
            return Ok(());
        }
        match scope {
            SettingsScope::Session => {
                lock(&self.session).absorb(&update);
                debug!(?update, "Updated session settings");
                Ok(())
            }
            SettingsScope::Persisted => self.write_persisted(&update).await,
        }
    }
}
