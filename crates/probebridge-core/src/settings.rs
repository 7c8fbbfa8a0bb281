//! Settings domain types and validation.
//!
//! These are the values the supervisor reads from the configuration accessor
//! before every start attempt. They are pure domain types; storage lives in
//! the runtime crate behind [`crate::ports::BridgeSettingsPort`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ftdi::parse_vid_pid;
use crate::transport::TransportKind;

/// Adapter clock used when none is configured.
pub const DEFAULT_ADAPTER_SPEED_KHZ: u32 = 3000;

/// Configured remote-protocol port.
///
/// Serialized as a plain number where `0` means "pick a free port".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub enum PortSetting {
    #[default]
    Auto,
    Fixed(u16),
}

impl PortSetting {
    pub const fn is_auto(self) -> bool {
        matches!(self, Self::Auto)
    }

    /// The concrete port, if one is configured.
    pub const fn fixed(self) -> Option<u16> {
        match self {
            Self::Auto => None,
            Self::Fixed(port) => Some(port),
        }
    }
}

impl From<u16> for PortSetting {
    fn from(value: u16) -> Self {
        if value == 0 { Self::Auto } else { Self::Fixed(value) }
    }
}

impl From<PortSetting> for u16 {
    fn from(value: PortSetting) -> Self {
        value.fixed().unwrap_or(0)
    }
}

impl fmt::Display for PortSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Fixed(port) => write!(f, "{port}"),
        }
    }
}

/// Where a settings change is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsScope {
    /// Lives only as long as the current session.
    Session,
    /// Written to the user's settings file.
    Persisted,
}

/// Debug bridge settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeSettings {
    /// Adapter family.
    pub transport: TransportKind,

    /// Remote-protocol port, `0` for automatic.
    pub port: PortSetting,

    /// JTAG adapter clock in kHz.
    pub jtag_speed: u32,

    /// Serial number selecting one of several connected JTAG probes.
    pub jtag_serial: Option<u64>,

    /// FTDI adapter clock in kHz.
    pub ftdi_speed: u32,

    /// `ftdi_layout_init` data/direction words, e.g. `0x0c08 0x0f1b`.
    pub ftdi_layout_init: Option<String>,

    /// USB ids as `VVVV:PPPP` hex.
    pub ftdi_vid_pid: Option<String>,

    /// Sample TDO on the falling clock edge.
    pub ftdi_tdo_sample_falling_edge: bool,

    /// Extra configuration lines appended verbatim for FTDI adapters.
    pub ftdi_extra: Option<String>,

    /// Full configuration text for the custom transport.
    /// `{port}` is replaced with the resolved port.
    pub custom_config: Option<String>,

    /// Extra bridge arguments, whitespace separated.
    pub extra_args: Option<String>,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            port: PortSetting::Auto,
            jtag_speed: DEFAULT_ADAPTER_SPEED_KHZ,
            jtag_serial: None,
            ftdi_speed: DEFAULT_ADAPTER_SPEED_KHZ,
            ftdi_layout_init: None,
            ftdi_vid_pid: None,
            ftdi_tdo_sample_falling_edge: false,
            ftdi_extra: None,
            custom_config: None,
            extra_args: None,
        }
    }
}

impl BridgeSettings {
    /// Merge a partial update into these settings.
    pub fn merge(&mut self, other: &SettingsUpdate) {
        if let Some(transport) = other.transport {
            self.transport = transport;
        }
        if let Some(port) = other.port {
            self.port = port;
        }
        if let Some(speed) = other.jtag_speed {
            self.jtag_speed = speed;
        }
        if let Some(serial) = other.jtag_serial {
            self.jtag_serial = serial;
        }
        if let Some(speed) = other.ftdi_speed {
            self.ftdi_speed = speed;
        }
        if let Some(ref layout) = other.ftdi_layout_init {
            self.ftdi_layout_init.clone_from(layout);
        }
        if let Some(ref vid_pid) = other.ftdi_vid_pid {
            self.ftdi_vid_pid.clone_from(vid_pid);
        }
        if let Some(falling) = other.ftdi_tdo_sample_falling_edge {
            self.ftdi_tdo_sample_falling_edge = falling;
        }
        if let Some(ref extra) = other.ftdi_extra {
            self.ftdi_extra.clone_from(extra);
        }
        if let Some(ref text) = other.custom_config {
            self.custom_config.clone_from(text);
        }
        if let Some(ref args) = other.extra_args {
            self.extra_args.clone_from(args);
        }
    }

    /// Extra bridge arguments split on whitespace.
    pub fn extra_args_list(&self) -> Vec<String> {
        self.extra_args
            .as_deref()
            .map(|args| args.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default()
    }
}

/// Partial settings update.
///
/// `None` leaves a field untouched; for optional fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub transport: Option<TransportKind>,
    pub port: Option<PortSetting>,
    pub jtag_speed: Option<u32>,
    pub jtag_serial: Option<Option<u64>>,
    pub ftdi_speed: Option<u32>,
    pub ftdi_layout_init: Option<Option<String>>,
    pub ftdi_vid_pid: Option<Option<String>>,
    pub ftdi_tdo_sample_falling_edge: Option<bool>,
    pub ftdi_extra: Option<Option<String>>,
    pub custom_config: Option<Option<String>>,
    pub extra_args: Option<Option<String>>,
}

impl SettingsUpdate {
    /// An update that only changes the port.
    pub fn port(port: PortSetting) -> Self {
        Self {
            port: Some(port),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fold a later update into this one; fields set in `other` win.
    pub fn absorb(&mut self, other: &Self) {
        fn take<T: Clone>(slot: &mut Option<T>, newer: Option<&T>) {
            if let Some(value) = newer {
                *slot = Some(value.clone());
            }
        }
        take(&mut self.transport, other.transport.as_ref());
        take(&mut self.port, other.port.as_ref());
        take(&mut self.jtag_speed, other.jtag_speed.as_ref());
        take(&mut self.jtag_serial, other.jtag_serial.as_ref());
        take(&mut self.ftdi_speed, other.ftdi_speed.as_ref());
        take(&mut self.ftdi_layout_init, other.ftdi_layout_init.as_ref());
        take(&mut self.ftdi_vid_pid, other.ftdi_vid_pid.as_ref());
        take(
            &mut self.ftdi_tdo_sample_falling_edge,
            other.ftdi_tdo_sample_falling_edge.as_ref(),
        );
        take(&mut self.ftdi_extra, other.ftdi_extra.as_ref());
        take(&mut self.custom_config, other.custom_config.as_ref());
        take(&mut self.extra_args, other.extra_args.as_ref());
    }
}

/// Settings validation and storage error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Adapter speed must be greater than 0 kHz")]
    InvalidSpeed,

    #[error("Invalid FTDI vid:pid '{0}', expected hex pair like 0403:6014")]
    InvalidVidPid(String),

    #[error("Failed to access settings file: {0}")]
    Io(String),

    #[error("Failed to parse settings file: {0}")]
    Parse(String),
}

/// Validate settings values.
pub fn validate_settings(settings: &BridgeSettings) -> Result<(), SettingsError> {
    if settings.jtag_speed == 0 || settings.ftdi_speed == 0 {
        return Err(SettingsError::InvalidSpeed);
    }

    if let Some(ref vid_pid) = settings.ftdi_vid_pid {
        if !vid_pid.trim().is_empty() && parse_vid_pid(vid_pid).is_none() {
            return Err(SettingsError::InvalidVidPid(vid_pid.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_setting_serializes_auto_as_zero() {
        let json = serde_json::to_string(&PortSetting::Auto).unwrap();
        assert_eq!(json, "0");
        let fixed: PortSetting = serde_json::from_str("3333").unwrap();
        assert_eq!(fixed, PortSetting::Fixed(3333));
        let auto: PortSetting = serde_json::from_str("0").unwrap();
        assert!(auto.is_auto());
    }

    #[test]
    fn test_default_settings() {
        let settings = BridgeSettings::default();
        assert_eq!(settings.transport, TransportKind::Jtag);
        assert_eq!(settings.port, PortSetting::Auto);
        assert_eq!(settings.jtag_speed, DEFAULT_ADAPTER_SPEED_KHZ);
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: BridgeSettings =
            serde_json::from_str(r#"{"transport":"ftdi","port":4444}"#).unwrap();
        assert_eq!(settings.transport, TransportKind::Ftdi);
        assert_eq!(settings.port, PortSetting::Fixed(4444));
        assert_eq!(settings.ftdi_speed, DEFAULT_ADAPTER_SPEED_KHZ);
    }

    #[test]
    fn test_merge_leaves_untouched_fields() {
        let mut settings = BridgeSettings {
            extra_args: Some("-d2".to_string()),
            ..BridgeSettings::default()
        };
        settings.merge(&SettingsUpdate::port(PortSetting::Fixed(3333)));
        assert_eq!(settings.port, PortSetting::Fixed(3333));
        assert_eq!(settings.extra_args.as_deref(), Some("-d2"));
    }

    #[test]
    fn test_merge_can_clear_optional_fields() {
        let mut settings = BridgeSettings {
            ftdi_vid_pid: Some("0403:6014".to_string()),
            ..BridgeSettings::default()
        };
        settings.merge(&SettingsUpdate {
            ftdi_vid_pid: Some(None),
            ..SettingsUpdate::default()
        });
        assert!(settings.ftdi_vid_pid.is_none());
    }

    #[test]
    fn test_absorb_prefers_newer_fields() {
        let mut overlay = SettingsUpdate {
            transport: Some(TransportKind::Ftdi),
            port: Some(PortSetting::Fixed(4000)),
            ..SettingsUpdate::default()
        };
        overlay.absorb(&SettingsUpdate::port(PortSetting::Auto));
        assert_eq!(overlay.transport, Some(TransportKind::Ftdi));
        assert_eq!(overlay.port, Some(PortSetting::Auto));
    }

    #[test]
    fn test_extra_args_split_on_whitespace() {
        let settings = BridgeSettings {
            extra_args: Some("  -d3\t-c  \"init\" ".to_string()),
            ..BridgeSettings::default()
        };
        assert_eq!(settings.extra_args_list(), vec!["-d3", "-c", "\"init\""]);
    }

    #[test]
    fn test_validate_rejects_zero_speed() {
        let settings = BridgeSettings {
            ftdi_speed: 0,
            ..BridgeSettings::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidSpeed)
        ));
    }

    #[test]
    fn test_validate_rejects_bad_vid_pid() {
        let settings = BridgeSettings {
            ftdi_vid_pid: Some("nope".to_string()),
            ..BridgeSettings::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidVidPid(_))
        ));
    }
}
