//! Bridge configuration generation.
//!
//! [`BridgeConfig::render`] turns a transport kind, a resolved port and the
//! transport parameters into the text handed to the bridge with `-f`. Each
//! transport has its own policy module; all of them are pure and emit the
//! remote-protocol port exactly once.

pub mod custom;
pub mod ftdi;
pub mod jtag;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::BridgeSettings;
use crate::transport::TransportKind;

pub use custom::CustomParams;
pub use ftdi::FtdiParams;
pub use jtag::JtagParams;

/// First line of every generated file.
pub const GENERATED_HEADER: &str = "# generated by probebridge, changes are overwritten on start";

/// Errors raised while producing a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("port must be resolved to a concrete value before generating config")]
    UnresolvedPort,

    #[error("missing required setting: {0}")]
    MissingIdentifier(&'static str),

    #[error("invalid vid:pid '{0}', expected hex pair like 0403:6014")]
    InvalidVidPid(String),

    #[error("adapter speed must be greater than 0 kHz")]
    InvalidSpeed,

    #[error("custom configuration text is empty")]
    EmptyCustomConfig,

    #[error("custom configuration uses the {{port}} placeholder {0} times, expected at most once")]
    RepeatedPortPlaceholder(usize),

    #[error("parameters for {actual} given to the {expected} transport")]
    ParamsMismatch {
        expected: TransportKind,
        actual: TransportKind,
    },
}

/// Per-transport parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransportParams {
    Jtag(JtagParams),
    Ftdi(FtdiParams),
    Custom(CustomParams),
}

impl TransportParams {
    pub const fn kind(&self) -> TransportKind {
        match self {
            Self::Jtag(_) => TransportKind::Jtag,
            Self::Ftdi(_) => TransportKind::Ftdi,
            Self::Custom(_) => TransportKind::Custom,
        }
    }

    /// Pick the parameters for `kind` out of the user settings.
    pub fn from_settings(kind: TransportKind, settings: &BridgeSettings) -> Self {
        match kind {
            TransportKind::Jtag => Self::Jtag(JtagParams {
                speed_khz: settings.jtag_speed,
                serial_number: settings.jtag_serial,
            }),
            TransportKind::Ftdi => Self::Ftdi(FtdiParams {
                speed_khz: settings.ftdi_speed,
                layout_init: settings.ftdi_layout_init.clone().unwrap_or_default(),
                vid_pid: settings.ftdi_vid_pid.clone().unwrap_or_default(),
                tdo_sample_falling_edge: settings.ftdi_tdo_sample_falling_edge,
                extra: settings.ftdi_extra.clone(),
            }),
            TransportKind::Custom => Self::Custom(CustomParams {
                template: settings.custom_config.clone().unwrap_or_default(),
            }),
        }
    }
}

/// A fully resolved configuration for one start attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    transport: TransportKind,
    port: u16,
    params: TransportParams,
}

impl BridgeConfig {
    /// Build a configuration; `port` must already be resolved.
    pub fn new(
        transport: TransportKind,
        port: u16,
        params: TransportParams,
    ) -> Result<Self, ConfigError> {
        if port == 0 {
            return Err(ConfigError::UnresolvedPort);
        }
        if params.kind() != transport {
            return Err(ConfigError::ParamsMismatch {
                expected: transport,
                actual: params.kind(),
            });
        }
        Ok(Self {
            transport,
            port,
            params,
        })
    }

    pub fn from_settings(settings: &BridgeSettings, port: u16) -> Result<Self, ConfigError> {
        let params = TransportParams::from_settings(settings.transport, settings);
        Self::new(settings.transport, port, params)
    }

    pub const fn transport(&self) -> TransportKind {
        self.transport
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    pub const fn params(&self) -> &TransportParams {
        &self.params
    }

    /// Render the configuration file text.
    pub fn render(&self) -> Result<String, ConfigError> {
        build(self.transport, self.port, &self.params)
    }
}

/// Produce configuration text for `kind` listening on `port`.
pub fn build(
    kind: TransportKind,
    port: u16,
    params: &TransportParams,
) -> Result<String, ConfigError> {
    if port == 0 {
        return Err(ConfigError::UnresolvedPort);
    }
    match (kind, params) {
        (TransportKind::Jtag, TransportParams::Jtag(p)) => jtag::render(port, p),
        (TransportKind::Ftdi, TransportParams::Ftdi(p)) => ftdi::render(port, p),
        (TransportKind::Custom, TransportParams::Custom(p)) => custom::render(port, p),
        (expected, other) => Err(ConfigError::ParamsMismatch {
            expected,
            actual: other.kind(),
        }),
    }
}

/// Trailing block shared by the generated policies.
///
/// Only the remote-protocol server listens; telnet and TCL stay closed so no
/// second port is ever bound.
pub(crate) fn server_block(out: &mut String, port: u16) {
    out.push('\n');
    out.push_str(&format!("gdb_port {port}\n"));
    out.push_str("telnet_port disabled\n");
    out.push_str("tcl_port disabled\n");
}


#[cfg(test)]
mod tests {
    use super::test_support::{port_directives, port_mentions};
    use super::*;

    fn jtag() -> TransportParams {
        TransportParams::Jtag(JtagParams {
            speed_khz: 1000,
            serial_number: None,
        })
    }

    #[test]
    fn rejects_unresolved_port() {
        assert_eq!(
            BridgeConfig::new(TransportKind::Jtag, 0, jtag()),
            Err(ConfigError::UnresolvedPort)
        );
        assert_eq!(
            build(TransportKind::Jtag, 0, &jtag()),
            Err(ConfigError::UnresolvedPort)
        );
    }

    #[test]
    fn rejects_mismatched_params() {
        let err = BridgeConfig::new(TransportKind::Ftdi, 3333, jtag()).unwrap_err();
        assert!(matches!(err, ConfigError::ParamsMismatch { .. }));
    }

    #[test]
    fn every_transport_emits_the_port_once() {
        let settings = BridgeSettings {
            ftdi_vid_pid: Some("0403:6014".to_string()),
            ftdi_layout_init: Some("0x0c08 0x0f1b".to_string()),
            custom_config: Some("interface dummy\ngdb_port {port}\n".to_string()),
            ..BridgeSettings::default()
        };

        for kind in [
            TransportKind::Jtag,
            TransportKind::Ftdi,
            TransportKind::Custom,
        ] {
            let settings = BridgeSettings {
                transport: kind,
                ..settings.clone()
            };
            let text = BridgeConfig::from_settings(&settings, 45123)
                .unwrap()
                .render()
                .unwrap();
            assert_eq!(port_mentions(&text, 45123), 1, "{kind}: {text}");
            let gdb: Vec<_> = port_directives(&text)
                .into_iter()
                .filter(|(d, _)| d == "gdb_port")
                .collect();
            assert_eq!(gdb, vec![("gdb_port".to_string(), "45123".to_string())]);
        }
    }

    #[test]
    fn from_settings_uses_selected_transport() {
        let settings = BridgeSettings {
            transport: TransportKind::Custom,
            custom_config: Some("x".to_string()),
            ..BridgeSettings::default()
        };
        let config = BridgeConfig::from_settings(&settings, 4000).unwrap();
        assert_eq!(config.transport(), TransportKind::Custom);
        assert_eq!(config.port(), 4000);
        assert!(matches!(config.params(), TransportParams::Custom(_)));
    }
}
