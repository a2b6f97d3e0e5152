pub mod state;

pub use state::{ChartConfig, FrontierConfig, ViewBox};

use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Reads a chart configuration; a missing file yields the defaults.
pub fn load(path: &Path) -> Result<ChartConfig, ConfigError> {
    if !path.exists() {
        log::info!("No config at {}, using defaults", path.display());
        return Ok(ChartConfig::default());
    }

    let contents = std::fs::read_to_string(path)?;
    let config: ChartConfig = serde_json::from_str(&contents)?;
    log::debug!("Loaded chart config from {}", path.display());

    Ok(config)
}
