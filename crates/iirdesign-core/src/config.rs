//! # Configuration
//!
//! YAML configuration for applications embedding the designer: logging
//! settings and a table of named filter presets.
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via the `IIRDESIGN_CONFIG` environment variable
//! 2. `./iirdesign.yaml` (current directory)
//! 3. `~/.config/iirdesign/config.yaml` (user config)
//! 4. `/etc/iirdesign/config.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! logging:
//!   level: debug
//!   format: compact
//!
//! presets:
//!   anti_alias:
//!     kind: elliptic
//!     topology: lowpass
//!     order: 6
//!     passband_ripple_db: 0.1
//!     sampling_frequency: 48000
//!     passband_edge: 20000
//!     stopband_db: -80
//! ```

use crate::design::check_requirements;
use crate::logging::LogConfig;
use crate::types::{FilterKind, FilterRequirements, FilterTopology};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "IIRDESIGN_CONFIG";

/// Error type for configuration operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Configuration file or preset not found
    NotFound(String),
    /// Failed to read or write the configuration file
    ReadError(String),
    /// Failed to parse configuration
    ParseError(String),
    /// Invalid configuration value
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(msg) => write!(f, "config not found: {}", msg),
            ConfigError::ReadError(msg) => write!(f, "failed to read config: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "failed to parse config: {}", msg),
            ConfigError::ValidationError(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignConfig {
    pub version: String,
    pub logging: LogConfig,
    /// Named filter requirements
    pub presets: BTreeMap<String, FilterRequirements>,
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            logging: LogConfig::default(),
            presets: BTreeMap::new(),
        }
    }
}

impl DesignConfig {
    /// Load from the first configuration file on the search path, or the
    /// defaults if there is none.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let path = Path::new(&path);
            if path.exists() {
                return Self::load_from(path);
            }
            tracing::warn!(path = %path.display(), "{} points to a missing file", CONFIG_ENV_VAR);
        }

        for path in Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), "loading configuration");
        Self::parse(&content)
    }

    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))
    }

    /// Requirements stored under `name`.
    pub fn preset(&self, name: &str) -> Result<&FilterRequirements, ConfigError> {
        self.presets
            .get(name)
            .ok_or_else(|| ConfigError::NotFound(format!("preset '{}' not found", name)))
    }

    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./iirdesign.yaml")];

        if let Some(dirs) = directories::ProjectDirs::from("", "", "iirdesign") {
            paths.push(dirs.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/iirdesign/config.yaml"));
        paths
    }

    /// Run the requirement checks on every preset.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, req) in &self.presets {
            check_requirements(req).map_err(|e| {
                ConfigError::ValidationError(format!("preset '{}': {}", name, e))
            })?;
        }
        Ok(())
    }

    pub fn example_yaml() -> String {
        let mut presets = BTreeMap::new();
        presets.insert(
            "dc_blocker".to_string(),
            FilterRequirements::builder()
                .kind(FilterKind::Butterworth)
                .topology(FilterTopology::HighPass)
                .order(2)
                .sampling_frequency(48_000.0)
                .passband_edge(20.0)
                .build(),
        );
        presets.insert(
            "anti_alias".to_string(),
            FilterRequirements::builder()
                .kind(FilterKind::Elliptic)
                .topology(FilterTopology::LowPass)
                .order(6)
                .passband_ripple_db(0.1)
                .sampling_frequency(48_000.0)
                .passband_edge(20_000.0)
                .stopband_db(-80.0)
                .build(),
        );
        presets.insert(
            "telephone_band".to_string(),
            FilterRequirements::builder()
                .kind(FilterKind::Chebyshev)
                .topology(FilterTopology::BandPass)
                .order(4)
                .passband_ripple_db(0.5)
                .sampling_frequency(8_000.0)
                .passband(300.0, 3_400.0)
                .build(),
        );

        let config = Self {
            presets,
            ..Default::default()
        };
        serde_yaml::to_string(&config).unwrap_or_default()
    }
}
