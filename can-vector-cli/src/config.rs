//! Configuration loading and parsing

use anyhow::{Context, Result};
use can_vector_gen::GeneratorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    #[serde(default)]
    pub dbc_files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// JSON lines destination (stdout when absent)
    pub file: Option<PathBuf>,
}

/// Load configuration from a TOML file
///
/// Relative DBC paths are resolved against the directory holding the config
/// file, so a config can travel with its catalogues.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if let Some(base) = path.parent() {
        for dbc in &mut config.input.dbc_files {
            if dbc.is_relative() {
                *dbc = base.join(&*dbc);
            }
        }
    }

    Ok(config)
}

/// Parse a CAN identifier given in decimal or `0x` hex
pub fn parse_can_id(text: &str) -> std::result::Result<u32, String> {
    let text = text.trim();
    let parsed = match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse::<u32>(),
    };
    parsed.map_err(|e| format!("invalid CAN id '{}': {}", text, e))
}
