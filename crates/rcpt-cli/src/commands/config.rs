//! Configuration lookup for the CLI.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use rcpt_core::ScanConfig;

/// `<config dir>/rcpt/config.json`, or `./rcpt/config.json` without a config dir.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rcpt")
        .join("config.json")
}

/// Load the explicit config file, else the default one if it exists, else defaults.
///
/// An explicit path that cannot be read or parsed is an error.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<ScanConfig> {
    if let Some(path) = explicit {
        return read(Path::new(path));
    }

    let default_path = default_config_path();
    if default_path.exists() {
        return read(&default_path);
    }

    debug!("No config file found, using defaults");
    Ok(ScanConfig::default())
}

fn read(path: &Path) -> anyhow::Result<ScanConfig> {
    let config = ScanConfig::from_file(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    debug!("Loaded config from {}", path.display());
    Ok(config)
}
