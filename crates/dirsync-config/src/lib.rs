//! Configuration management for dirsync
//!
//! This crate loads the settings that drive the periodic synchronization loop.
//! Values are layered: built-in defaults, then an optional YAML/TOML/JSON file,
//! then `DIRSYNC__*` environment variables. Command-line arguments are applied
//! on top by the CLI.
//!
//! # Examples
//!
//! ```rust
//! use dirsync_config::ConfigBuilder;
//!
//! let config = ConfigBuilder::new()
//!     .add_defaults()
//!     .add_env_prefix("DIRSYNC")
//!     .build()
//!     .expect("Failed to load configuration");
//!
//! println!("Interval: {}", config.sync.interval);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use dirsync_types::{HashAlgorithm, SyncInterval};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod builder;
pub mod error;
pub mod loader;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

/// Main configuration structure for dirsync
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// What to synchronize and how to compare
    #[serde(default)]
    pub sync: SyncConfig,
    /// How planned actions are executed
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Check the settings, typically again after command-line overrides
    pub fn validate(&self) -> ConfigResult<()> {
        ConfigBuilder::validate(self)
    }
}

/// Synchronization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Source directory
    #[serde(default)]
    pub source: Option<PathBuf>,
    /// Destination directory
    #[serde(default)]
    pub destination: Option<PathBuf>,
    /// Minutes between passes
    #[serde(default)]
    pub interval: SyncInterval,
    /// Turn delete+copy pairs with identical content into renames
    #[serde(default = "default_detect_moves")]
    pub detect_moves: bool,
    /// Digest used by the deep comparison tier
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,
    /// Plan and log actions without touching the destination
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source: None,
            destination: None,
            interval: SyncInterval::default(),
            detect_moves: true,
            hash_algorithm: HashAlgorithm::default(),
            dry_run: false,
        }
    }
}

fn default_detect_moves() -> bool {
    true
}

/// Action execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Run directory creation, file actions and directory deletion as separate phases
    #[serde(default = "default_phased")]
    pub phased: bool,
    /// Maximum in-flight actions per phase (0 = unbounded)
    #[serde(default)]
    pub max_concurrent_actions: usize,
    /// Read buffer used when hashing files
    #[serde(default = "default_hash_buffer_size")]
    pub hash_buffer_size: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            phased: true,
            max_concurrent_actions: 0,
            hash_buffer_size: default_hash_buffer_size(),
        }
    }
}

fn default_phased() -> bool {
    true
}

fn default_hash_buffer_size() -> usize {
    64 * 1024
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level for diagnostic tracing output
    #[serde(default = "default_level")]
    pub level: String,
    /// File that receives a copy of every operator-facing log line
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Prefix operator-facing log lines with a timestamp
    #[serde(default = "default_timestamps")]
    pub timestamps: bool,
    /// Enable colored console output
    #[serde(default = "default_colored_output")]
    pub colored_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            log_file: None,
            timestamps: true,
            colored_output: true,
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

fn default_timestamps() -> bool {
    true
}

fn default_colored_output() -> bool {
    true
}
