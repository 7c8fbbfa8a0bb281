//! User-supplied configuration text.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Placeholder replaced with the resolved port.
pub const PORT_PLACEHOLDER: &str = "{port}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomParams {
    pub template: String,
}

/// Substitute the port into the user's text.
///
/// Text without the placeholder gets a `gdb_port` line appended so the bridge
/// still listens where the supervisor expects it. The placeholder may appear
/// at most once.
pub(crate) fn render(port: u16, params: &CustomParams) -> Result<String, ConfigError> {
    if params.template.trim().is_empty() {
        return Err(ConfigError::EmptyCustomConfig);
    }

    let placeholders = params.template.matches(PORT_PLACEHOLDER).count();
    if placeholders > 1 {
        return Err(ConfigError::RepeatedPortPlaceholder(placeholders));
    }

    if placeholders == 1 {
        let mut out = params.template.replacen(PORT_PLACEHOLDER, &port.to_string(), 1);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        return Ok(out);
    }

    let mut out = params.template.clone();
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&format!("gdb_port {port}\n"));
    Ok(out)
}
