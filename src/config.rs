//! Configuration for the conformance checker.
//!
//! Read from a JSON file. Every field has a default, so a partial file (or
//! none at all) is valid.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Environment variable naming a config file for [`CheckConfig::load_or_default`].
pub const CONFIG_ENV: &str = "XBATCH_CHECK_CONFIG";

/// Process-wide configuration, loaded on first use.
pub static CONFIG: Lazy<CheckConfig> = Lazy::new(CheckConfig::load_or_default);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Random input vectors per operation and pair.
    pub samples: usize,
    /// Seed for the input generator, so runs are reproducible.
    pub seed: u64,
    /// Append boundary values (MIN, MAX, zeros, infinities, NaN, subnormals).
    pub include_edge_cases: bool,
    pub report: ReportConfig,
}

impl Default for CheckConfig {
    fn default() -> Self {
        CheckConfig {
            samples: 4096,
            seed: 0x5EED_BA7C,
            include_edge_cases: true,
            report: ReportConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub format: ReportFormat,
    /// Stop at the first pair with a mismatch.
    pub fail_fast: bool,
    /// Mismatches kept per operation; the rest are only counted.
    pub max_mismatches: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            format: ReportFormat::Text,
            fail_fast: false,
            max_mismatches: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Text => f.write_str("text"),
            ReportFormat::Json => f.write_str("json"),
        }
    }
}

impl CheckConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: CheckConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Loads the file named by `XBATCH_CHECK_CONFIG`, or defaults when the
    /// variable is unset or the file is unusable.
    pub fn load_or_default() -> Self {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(&path).unwrap_or_else(|e| {
                info!("Using default config: {:#}", e);
                Self::default()
            }),
            None => Self::default(),
        }
    }
}
