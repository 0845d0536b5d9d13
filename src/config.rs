//! Generator configuration
//!
//! Supports loading configuration from:
//! - Default values
//! - A config file (`jipg.toml`)
//! - Environment variables (`JIPG__...`)
//!
//! These are the Rust-native analogue of the original C generator's
//! preprocessor knobs (`JIPG_DEFAULT_INT_TYPE`, `JIPG_DEFAULT_FLOAT_TYPE`,
//! `JIPG_PARSER_CAP`, `JIPG_VALUE_ARENA_CAP`): a Rust generator has no
//! preprocessor, so they become fields resolved once at startup instead.
//!
//! ## Example config file (jipg.toml):
//! ```toml
//! [types]
//! int_type = "int64_t"
//! float_type = "double"
//!
//! [limits]
//! arena_cap = 1024
//! parser_cap = 8
//!
//! [output]
//! header = "jsonparser.h"
//! source = "jsonparser.c"
//! single_file = false
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// C type mappings for scalar schema nodes
    #[serde(default)]
    pub types: TypeConfig,

    /// Arena / registry capacity limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Default output locations
    #[serde(default)]
    pub output: OutputConfig,
}

/// Scalar type mappings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeConfig {
    /// C type emitted for `Int()` nodes that don't override it explicitly
    #[serde(default = "default_int_type")]
    pub int_type: String,

    /// C type emitted for `Float()` nodes that don't override it explicitly
    #[serde(default = "default_float_type")]
    pub float_type: String,
}

/// Capacity limits, mirroring `JIPG_VALUE_ARENA_CAP` / `JIPG_PARSER_CAP`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum number of IR nodes the schema arena may hold
    #[serde(default = "default_arena_cap")]
    pub arena_cap: usize,

    /// Maximum number of top-level schemas a single registry may hold.
    /// Enforced in [`crate::generate`], which rejects a registry holding
    /// more entries than this with [`crate::GeneratorError::RegistryExhausted`]
    /// before running a single schema thunk.
    #[serde(default = "default_parser_cap")]
    pub parser_cap: usize,
}

/// Default output sinks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_header_path")]
    pub header: PathBuf,

    #[serde(default = "default_source_path")]
    pub source: PathBuf,

    #[serde(default)]
    pub single_file: bool,
}

fn default_int_type() -> String {
    "int64_t".to_string()
}

fn default_float_type() -> String {
    "double".to_string()
}

fn default_arena_cap() -> usize {
    1024
}

fn default_parser_cap() -> usize {
    8
}

fn default_header_path() -> PathBuf {
    PathBuf::from("jsonparser.h")
}

fn default_source_path() -> PathBuf {
    PathBuf::from("jsonparser.c")
}

impl Default for TypeConfig {
    fn default() -> Self {
        Self {
            int_type: default_int_type(),
            float_type: default_float_type(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            arena_cap: default_arena_cap(),
            parser_cap: default_parser_cap(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            header: default_header_path(),
            source: default_source_path(),
            single_file: false,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            types: TypeConfig::default(),
            limits: LimitsConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, optionally overlaying a specific file on top of
    /// the default search locations and the environment.
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["jipg.toml", ".jipg.toml", "config/jipg.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "jipg") {
            let xdg_config = config_dir.config_dir().join("jipg.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("JIPG")
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
}
