//! Configuration file loading.

use std::path::Path;

use fakemodem_core::ModemConfig;
use tracing::debug;

use crate::error::RunnerError;

/// Load and validate a configuration file.
///
/// The format follows the extension: `.yaml`/`.yml` or `.json`.
pub fn load_config(path: &Path) -> Result<ModemConfig, RunnerError> {
    let content = std::fs::read_to_string(path).map_err(|source| RunnerError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let config: ModemConfig = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
        Some("json") => serde_json::from_str(&content)?,
        _ => return Err(RunnerError::UnsupportedFormat(path.display().to_string())),
    };
    config.validate()?;

    debug!(
        path = %path.display(),
        extra_commands = config.commands.len(),
        "configuration loaded"
    );
    Ok(config)
}
