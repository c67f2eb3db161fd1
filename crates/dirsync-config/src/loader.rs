//! Configuration loader utilities

use crate::{Config, ConfigBuilder, ConfigError, ConfigResult};
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides (`DIRSYNC__SYNC__INTERVAL=5`)
pub const ENV_PREFIX: &str = "DIRSYNC";

/// Configuration loader with common loading patterns
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from default locations
    pub fn load_default() -> ConfigResult<Config> {
        let mut builder = ConfigBuilder::new().add_defaults();

        if let Some(path) = Self::config_exists() {
            builder = builder.add_source_file(&path);
        }

        builder.add_env_prefix(ENV_PREFIX).build()
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Configuration file not found",
                ),
            });
        }

        ConfigBuilder::new()
            .add_defaults()
            .add_source_file(path)
            .add_env_prefix(ENV_PREFIX)
            .build()
    }

    /// Save configuration to a file, choosing the format from the extension
    pub fn save_to_file<P: AsRef<Path>>(config: &Config, path: P) -> ConfigResult<()> {
        let path = path.as_ref();

        let content = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => {
                toml::to_string_pretty(config).map_err(|e| ConfigError::Serialization {
                    message: format!("Failed to serialize to TOML: {}", e),
                })?
            }
            Some("json") => {
                serde_json::to_string_pretty(config).map_err(|e| ConfigError::Serialization {
                    message: format!("Failed to serialize to JSON: {}", e),
                })?
            }
            _ => serde_yaml::to_string(config).map_err(|e| ConfigError::Serialization {
                message: format!("Failed to serialize to YAML: {}", e),
            })?,
        };

        std::fs::write(path, content).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> ConfigResult<()> {
        Self::save_to_file(&Config::default(), path)
    }

    /// Default configuration file paths in order of preference
    fn get_default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("dirsync.yaml"),
            PathBuf::from("dirsync.yml"),
            PathBuf::from("dirsync.toml"),
            PathBuf::from(".dirsync.yaml"),
            PathBuf::from(".dirsync.toml"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            let dirsync_dir = config_dir.join("dirsync");
            paths.push(dirsync_dir.join("config.yaml"));
            paths.push(dirsync_dir.join("config.yml"));
            paths.push(dirsync_dir.join("config.toml"));
        }

        #[cfg(unix)]
        {
            paths.push(PathBuf::from("/etc/dirsync/config.yaml"));
            paths.push(PathBuf::from("/etc/dirsync/config.toml"));
        }

        paths
    }

    /// First existing configuration file in the default locations
    pub fn config_exists() -> Option<PathBuf> {
        Self::get_default_config_paths()
            .into_iter()
            .find(|path| path.exists())
    }

    /// Validate a configuration file without keeping it
    pub fn validate_file<P: AsRef<Path>>(path: P) -> ConfigResult<()> {
        let _config = Self::load_from_file(path)?;
        Ok(())
    }
}

mod dirs {
    use std::path::PathBuf;

    pub fn config_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("APPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME").ok().map(|home| {
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
            })
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_CONFIG_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|home| PathBuf::from(home).join(".config"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}
