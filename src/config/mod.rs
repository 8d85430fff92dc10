//! Scanner Configuration
//!
//! Settings stored in TOML format. Every section is optional on disk.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::vision::DEFAULT_TEMPLATE;

/// Scanner settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Recognition engine settings
    pub engine: EngineConfig,
    /// Async pipeline settings
    pub pipeline: PipelineConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

/// Recognition engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Template applied on every recognition call
    pub template: String,
    /// Settings file appended to every new scanner
    pub settings: Option<PathBuf>,
    /// License key activated by `ScannerModule::from_config`
    pub license: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            settings: None,
            license: None,
        }
    }
}

/// Async pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// The queue is cleared before a push once it holds more than this many tasks
    pub evict_above: usize,
    /// Name of the worker thread
    pub thread_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            evict_above: 1,
            thread_name: "mrz-decode".to_string(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Colored output
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<ScannerConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {:?}", path))?;
    let config: ScannerConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config {:?}", path))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &ScannerConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Default location of the configuration file
pub fn default_config_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "mrzscanner", "MrzScanner")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

/// Load from `path` if it exists, else defaults
pub fn load_or_default(path: &Path) -> Result<ScannerConfig> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(ScannerConfig::default())
    }
}
