//! Dedicated JTAG probe policy.

use serde::{Deserialize, Serialize};

use super::{ConfigError, GENERATED_HEADER, server_block};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JtagParams {
    pub speed_khz: u32,
    /// Selects one probe when several are plugged in.
    pub serial_number: Option<u64>,
}

pub(crate) fn render(port: u16, params: &JtagParams) -> Result<String, ConfigError> {
    if params.speed_khz == 0 {
        return Err(ConfigError::InvalidSpeed);
    }

    let mut out = String::new();
    out.push_str(GENERATED_HEADER);
    out.push('\n');
    out.push_str("interface jlink\n");
    if let Some(serial) = params.serial_number {
        out.push_str(&format!("jlink serial {serial}\n"));
    }
    out.push_str("transport select jtag\n");
    out.push_str(&format!("adapter_khz {}\n", params.speed_khz));
    server_block(&mut out, port);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::port_mentions;
    use super::*;

    #[test]
    fn renders_speed_and_serial() {
        let text = render(
            3333,
            &JtagParams {
                speed_khz: 12000,
                serial_number: Some(59_000_123),
            },
        )
        .unwrap();
        assert!(text.starts_with(GENERATED_HEADER));
        assert!(text.contains("interface jlink\n"));
        assert!(text.contains("jlink serial 59000123\n"));
        assert!(text.contains("adapter_khz 12000\n"));
        assert_eq!(port_mentions(&text, 3333), 1);
    }

    #[test]
    fn omits_serial_when_unset() {
        let text = render(
            3333,
            &JtagParams {
                speed_khz: 1000,
                serial_number: None,
            },
        )
        .unwrap();
        assert!(!text.contains("jlink serial"));
    }

    #[test]
    fn rejects_zero_speed() {
        let err = render(
            3333,
            &JtagParams {
                speed_khz: 0,
                serial_number: None,
            },
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::InvalidSpeed);
    }
}
