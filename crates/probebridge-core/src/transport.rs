//! Hardware adapter families.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The adapter family selecting which configuration policy is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Dedicated JTAG probe (J-Link class).
    #[default]
    Jtag,
    /// FTDI MPSSE based adapter.
    Ftdi,
    /// User-supplied configuration text.
    Custom,
}

impl TransportKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Jtag => "jtag",
            Self::Ftdi => "ftdi",
            Self::Custom => "custom",
        }
    }

    /// Parse a transport name leniently.
    ///
    /// Unknown names map to [`TransportKind::Custom`], which renders exactly
    /// what the user wrote instead of guessing at adapter commands.
    pub fn from_name_lossy(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!(transport = %name, "unknown transport kind, using custom config");
            Self::Custom
        })
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jtag" => Ok(Self::Jtag),
            "ftdi" => Ok(Self::Ftdi),
            "custom" => Ok(Self::Custom),
            other => Err(format!("unknown transport kind '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names_case_insensitively() {
        assert_eq!("JTAG".parse::<TransportKind>(), Ok(TransportKind::Jtag));
        assert_eq!(" ftdi ".parse::<TransportKind>(), Ok(TransportKind::Ftdi));
        assert_eq!("custom".parse::<TransportKind>(), Ok(TransportKind::Custom));
    }

    #[test]
    fn unknown_name_falls_back_to_custom() {
        assert!("stlink".parse::<TransportKind>().is_err());
        assert_eq!(TransportKind::from_name_lossy("stlink"), TransportKind::Custom);
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&TransportKind::Ftdi).unwrap();
        assert_eq!(json, "\"ftdi\"");
        let back: TransportKind = serde_json::from_str("\"jtag\"").unwrap();
        assert_eq!(back, TransportKind::Jtag);
    }
}
