//! Simulation configuration: the electric-charge resource name and the
//! numeric thresholds used by the resolution passes.
//!
//! With the `config-loader` feature a [`SimConfig`] can be read from RON,
//! TOML or JSON; the format is chosen by file extension.

use serde::{Deserialize, Serialize};
#[cfg(feature = "config-loader")]
use std::path::Path;
use std::path::PathBuf;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A value is out of range.
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ===========================================================================
// Configuration
// ===========================================================================

/// Thresholds below which changes are treated as noise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    /// Broker rates smaller than this are hidden from the per-tag report.
    pub broker_rate: f64,
    /// Amount changes smaller than this between two ticks are not attributed
    /// to an external producer.
    pub external_change: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            broker_rate: 1e-7,
            external_change: 1e-5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Resource that gates processes.
    pub electric_charge: String,
    /// Ratios below this skip the recipe or process entirely.
    pub rate_epsilon: f64,
    pub tolerances: Tolerances,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            electric_charge: "ElectricCharge".to_string(),
            rate_epsilon: 1e-10,
            tolerances: Tolerances::default(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.electric_charge.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "electric_charge",
                reason: "resource name is empty".to_string(),
            });
        }
        check_threshold("rate_epsilon", self.rate_epsilon)?;
        check_threshold("tolerances.broker_rate", self.tolerances.broker_rate)?;
        check_threshold("tolerances.external_change", self.tolerances.external_change)?;
        Ok(())
    }
}

fn check_threshold(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a finite positive number, got {value}"),
        })
    }
}

// ===========================================================================
// Loading
// ===========================================================================

/// Supported configuration file formats.
#[cfg(feature = "config-loader")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
#[cfg(feature = "config-loader")]
pub fn detect_format(path: &Path) -> Result<ConfigFormat, ConfigError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(ConfigFormat::Ron),
        Some("toml") => Ok(ConfigFormat::Toml),
        Some("json") => Ok(ConfigFormat::Json),
        _ => Err(ConfigError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

/// Read, parse and validate a configuration file.
#[cfg(feature = "config-loader")]
pub fn load_config(path: &Path) -> Result<SimConfig, ConfigError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    parse_from(&content, format, path)
}

/// Parse and validate a configuration held in memory.
#[cfg(feature = "config-loader")]
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<SimConfig, ConfigError> {
    parse_from(content, format, Path::new("<memory>"))
}

#[cfg(feature = "config-loader")]
fn parse_from(content: &str, format: ConfigFormat, file: &Path) -> Result<SimConfig, ConfigError> {
    let parse_err = |detail: String| ConfigError::Parse {
        file: file.to_path_buf(),
        detail,
    };
    let config: SimConfig = match format {
        ConfigFormat::Ron => ron::from_str(content).map_err(|e| parse_err(e.to_string()))?,
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string()))?,
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| parse_err(e.to_string()))?
        }
    };
    config.validate()?;
    Ok(config)
}
