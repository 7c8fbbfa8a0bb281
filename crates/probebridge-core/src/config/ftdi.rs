//! FTDI (MPSSE) adapter policy.

use serde::{Deserialize, Serialize};

use super::{ConfigError, GENERATED_HEADER, server_block};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FtdiParams {
    pub speed_khz: u32,
    /// Data and direction words for `ftdi_layout_init`.
    pub layout_init: String,
    /// `VVVV:PPPP` in hex.
    pub vid_pid: String,
    pub tdo_sample_falling_edge: bool,
    /// Appended verbatim after the generated adapter block.
    pub extra: Option<String>,
}

/// Parse `0403:6014` (optionally `0x` prefixed) into a vendor/product pair.
pub fn parse_vid_pid(raw: &str) -> Option<(u16, u16)> {
    let (vid, pid) = raw.trim().split_once(':')?;
    Some((parse_hex(vid)?, parse_hex(pid)?))
}

fn parse_hex(part: &str) -> Option<u16> {
    let part = part.trim();
    let digits = part
        .strip_prefix("0x")
        .or_else(|| part.strip_prefix("0X"))
        .unwrap_or(part);
    if digits.is_empty() || digits.len() > 4 {
        return None;
    }
    u16::from_str_radix(digits, 16).ok()
}

pub(crate) fn render(port: u16, params: &FtdiParams) -> Result<String, ConfigError> {
    if params.speed_khz == 0 {
        return Err(ConfigError::InvalidSpeed);
    }
    if params.vid_pid.trim().is_empty() {
        return Err(ConfigError::MissingIdentifier("ftdi vid:pid"));
    }
    let (vid, pid) = parse_vid_pid(&params.vid_pid)
        .ok_or_else(|| ConfigError::InvalidVidPid(params.vid_pid.clone()))?;
    let layout = params.layout_init.trim();
    if layout.is_empty() {
        return Err(ConfigError::MissingIdentifier("ftdi layout init"));
    }

    let mut out = String::new();
    out.push_str(GENERATED_HEADER);
    out.push('\n');
    out.push_str("interface ftdi\n");
    out.push_str(&format!("ftdi_vid_pid 0x{vid:04x} 0x{pid:04x}\n"));
    out.push_str(&format!("ftdi_layout_init {layout}\n"));
    if params.tdo_sample_falling_edge {
        out.push_str("ftdi_tdo_sample_edge falling\n");
    }
    out.push_str("transport select jtag\n");
    out.push_str(&format!("adapter_khz {}\n", params.speed_khz));
    if let Some(extra) = params.extra.as_deref().map(str::trim) {
        if !extra.is_empty() {
            out.push('\n');
            out.push_str(extra);
            out.push('\n');
        }
    }
    server_block(&mut out, port);
    Ok(out)
}
