//! Configuration for dialect loading
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (mavlib.toml)
//! - Environment variables (MAVLIB__*)
//!
//! ## Example config file (mavlib.toml):
//! ```toml
//! [dialects]
//! paths = ["message_definitions/v1.0/ardupilotmega.xml"]
//!
//! [validation]
//! unique_messages = true
//! max_message_id = 16777215
//!
//! [report]
//! format = "json"
//! dot = "include_graph.dot"
//!
//! [logging]
//! filter = "mavlib_gen=debug"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::gate::xml::DEFAULT_MAX_MESSAGE_ID;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MavlibConfig {
    /// Seed dialect files
    #[serde(default)]
    pub dialects: DialectsConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    /// CLI output settings
    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where seed dialects come from when none are given on the command line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialectsConfig {
    /// Explicit dialect files
    #[serde(default)]
    pub paths: Vec<PathBuf>,

    /// Directory scanned for `*.xml` files
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Run the cross-file message id/name uniqueness check
    #[serde(default = "default_true")]
    pub unique_messages: bool,

    /// Largest message id the schema gate accepts
    #[serde(default = "default_max_message_id")]
    pub max_message_id: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub format: ReportFormat,

    /// Write the include graph as Graphviz DOT to this path
    #[serde(default)]
    pub dot: Option<PathBuf>,
}

/// Summary output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter used when `RUST_LOG` is unset
    #[serde(default = "default_filter")]
    pub filter: String,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_max_message_id() -> u32 {
    DEFAULT_MAX_MESSAGE_ID
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            unique_messages: true,
            max_message_id: default_max_message_id(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl MavlibConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering `config_path` over the default locations
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["mavlib.toml", ".mavlib.toml", "config/mavlib.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "mavlib", "mavlib-gen") {
            let xdg_config = config_dir.config_dir().join("mavlib.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // MAVLIB__VALIDATION__MAX_MESSAGE_ID=255
        builder = builder.add_source(
            Environment::with_prefix("MAVLIB")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Directory to scan for seeds, made absolute against the working directory
    pub fn dialect_directory(&self) -> Option<PathBuf> {
        self.dialects.directory.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                std::env::current_dir().unwrap_or_default().join(p)
            }
        })
    }
}
