//! Console configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use craftgate_core::{BackendConfig, SessionTuning};

/// Top-level configuration for the console.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Backends addressable by id.
    pub backends: Vec<BackendConfig>,
    /// Session tuning shared by every backend.
    pub tuning: SessionTuning,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl ConsoleConfig {
    /// Load from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                eprintln!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// A sample config worth editing, for `--gen-config`.
    pub fn sample() -> Self {
        Self {
            backends: vec![BackendConfig {
                id: "default".into(),
                host: "127.0.0.1".into(),
                port: 25575,
                password: "change-me".into(),
            }],
            ..Self::default()
        }
    }
}
