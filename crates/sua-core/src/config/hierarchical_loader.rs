//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. User config (~/.sua-updater/config.yaml, or an explicit file)
//! 3. Environment variables (SUA_* prefix)
//! 4. CLI flags (handled by caller)
//!
//! A user file only needs the keys it changes; it is merged over the
//! defaults key by key before being deserialized.

use crate::error::{Error, Result};
use crate::types::UpdaterConfig;
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde_yaml_ng::Value;
use std::env;
use std::fs;
use tracing::debug;

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

/// Name of the embedded defaults file
const DEFAULTS_FILE: &str = "updater-defaults.yaml";

/// Name of the user configuration file inside the config directory
const USER_CONFIG_FILE: &str = "config.yaml";

/// Configuration hierarchy loader
pub struct HierarchicalConfigLoader {
    /// Base directory for configuration files
    config_dir: Utf8PathBuf,

    /// Explicit configuration file, replaces the user file when set
    config_file: Option<Utf8PathBuf>,
}

impl HierarchicalConfigLoader {
    /// Create a new hierarchical config loader
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self {
            config_dir,
            config_file: None,
        })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self {
            config_dir,
            config_file: None,
        }
    }

    /// Use an explicit configuration file instead of the user file
    pub fn with_file(mut self, config_file: Utf8PathBuf) -> Self {
        self.config_file = Some(config_file);
        self
    }

    /// Get the standard config directory (~/.sua-updater)
    fn get_config_dir() -> Result<Utf8PathBuf> {
        let base = directories::BaseDirs::new()
            .ok_or_else(|| Error::invalid_config("Could not determine home directory"))?;

        let home = Utf8PathBuf::from_path_buf(base.home_dir().to_path_buf())
            .map_err(|_| Error::invalid_config("Home directory is not valid UTF-8"))?;

        Ok(home.join(".sua-updater"))
    }

    /// Load the updater configuration with hierarchical precedence
    pub fn load(&self) -> Result<UpdaterConfig> {
        let mut value = Self::load_embedded_value(DEFAULTS_FILE)?;

        match &self.config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::config_not_found(path.as_str()));
                }
                merge_values(&mut value, self.load_yaml_value(path)?);
            }
            None => {
                let user_path = self.config_dir.join(USER_CONFIG_FILE);
                if user_path.exists() {
                    merge_values(&mut value, self.load_yaml_value(&user_path)?);
                }
            }
        }

        let config: UpdaterConfig = serde_yaml_ng::from_value(value)
            .map_err(|e| Error::invalid_config(format!("Failed to read configuration: {}", e)))?;

        let config = self.apply_env_overrides(config)?;
        config.validate()?;

        debug!(
            "Configuration loaded: target={}, base_url={}",
            config.target_version, config.base_url
        );

        Ok(config)
    }

    /// Load an embedded configuration file as a YAML value
    fn load_embedded_value(filename: &str) -> Result<Value> {
        let embedded_file = EmbeddedConfigs::get(filename).ok_or_else(|| {
            Error::config_not_found(format!("Embedded config not found: {}", filename))
        })?;

        let content = std::str::from_utf8(&embedded_file.data).map_err(|_| {
            Error::invalid_config(format!("Invalid UTF-8 in embedded config: {}", filename))
        })?;

        serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse embedded config {}: {}",
                filename, e
            ))
        })
    }

    /// Load a YAML file as a value
    fn load_yaml_value(&self, path: &Utf8Path) -> Result<Value> {
        let content = fs::read_to_string(path)?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&self, mut config: UpdaterConfig) -> Result<UpdaterConfig> {
        if let Ok(val) = env::var("SUA_TARGET_VERSION") {
            config.target_version = val;
        }

        if let Ok(val) = env::var("SUA_BASE_URL") {
            config.base_url = val;
        }

        if let Ok(val) = env::var("SUA_BOOTSTRAP_URL") {
            config.bootstrap_url = val;
        }

        if let Ok(val) = env::var("SUA_DOWNLOAD_DIR") {
            config.download_dir = Some(val.into());
        }

        if let Ok(val) = env::var("SUA_CONNECT_TIMEOUT_SECS") {
            config.network.connect_timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("SUA_CONNECT_TIMEOUT_SECS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("SUA_READ_TIMEOUT_SECS") {
            config.network.read_timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("SUA_READ_TIMEOUT_SECS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("SUA_SEARCH_MAX_DEPTH") {
            config.search.max_depth = val.parse().map_err(|_| {
                Error::invalid_config("SUA_SEARCH_MAX_DEPTH must be a valid number")
            })?;
        }

        Ok(config)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}

/// Merge `overlay` into `base`; mappings merge per key, anything else replaces
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) if existing.is_mapping() && value.is_mapping() => {
                        merge_values(existing, value)
                    }
                    _ => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
