//! Updater configuration types
//!
//! These types describe everything the updater needs to know about the
//! application it keeps current: the release to install, where artifacts are
//! published, where existing installs usually live, and operational limits
//! such as network timeouts and search depth.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

use crate::error::{Error, Result};

/// Complete updater configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdaterConfig {
    /// Release that should be installed, as a `major.minor.patch` triple
    pub target_version: String,

    /// Base URL that per-version artifacts are published under
    pub base_url: String,

    /// Installer used when the application is not installed at all
    pub bootstrap_url: String,

    /// File name for the bootstrap installer (defaults to the URL's last segment)
    #[serde(default)]
    pub bootstrap_file_name: Option<String>,

    /// File name of the application executable
    #[serde(default = "default_executable_name")]
    pub executable_name: String,

    /// Known install locations, relative to a volume root
    #[serde(default = "default_install_candidates")]
    pub install_candidates: Vec<String>,

    /// Installed versions that are always treated as outdated
    #[serde(default = "default_forced_upgrade_versions")]
    pub forced_upgrade_versions: Vec<String>,

    /// Where downloaded installers are written (defaults to the user's Downloads)
    #[serde(default)]
    pub download_dir: Option<PathBuf>,

    /// Start the application once it is current
    #[serde(default = "default_true")]
    pub launch_after_update: bool,

    /// Network and HTTP configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// Installation search configuration
    #[serde(default)]
    pub search: SearchConfig,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            target_version: "3.6.6".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            bootstrap_url: format!("{}/InstaladorSUA353.exe", DEFAULT_BASE_URL),
            bootstrap_file_name: None,
            executable_name: default_executable_name(),
            install_candidates: default_install_candidates(),
            forced_upgrade_versions: default_forced_upgrade_versions(),
            download_dir: None,
            launch_after_update: true,
            network: NetworkConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

const DEFAULT_BASE_URL: &str = "https://www.imss.gob.mx/sites/all/statics/pdf/sua";

fn default_executable_name() -> String {
    "SUA.exe".to_string()
}

fn default_install_candidates() -> Vec<String> {
    [
        "Cobranza/SUA/SUA.exe",
        "Program Files/Cobranza/SUA/SUA.exe",
        "Program Files (x86)/Cobranza/SUA/SUA.exe",
        "SUA/SUA.exe",
        "IMSS/SUA/SUA.exe",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_forced_upgrade_versions() -> Vec<String> {
    vec!["3.5.3".to_string()]
}

fn default_true() -> bool {
    true
}

impl UpdaterConfig {
    /// Validate the configuration, returning the first problem found
    pub fn validate(&self) -> Result<()> {
        parse_version_triple(&self.target_version)?;

        for version in &self.forced_upgrade_versions {
            parse_version_triple(version)?;
        }

        Url::parse(&self.base_url).map_err(|_| Error::invalid_url("base-url", &self.base_url))?;
        Url::parse(&self.bootstrap_url)
            .map_err(|_| Error::invalid_url("bootstrap-url", &self.bootstrap_url))?;

        if self.executable_name.trim().is_empty() {
            return Err(Error::invalid_config("executable-name must not be empty"));
        }

        if self.search.max_depth == 0 {
            return Err(Error::invalid_config("search.max-depth must be at least 1"));
        }

        if self.network.download_chunk_size == 0 {
            return Err(Error::invalid_config(
                "network.download-chunk-size must be at least 1",
            ));
        }

        Ok(())
    }

    /// Parsed forced-upgrade versions
    pub fn forced_versions(&self) -> Result<Vec<semver::Version>> {
        self.forced_upgrade_versions
            .iter()
            .map(|v| parse_version_triple(v))
            .collect()
    }

    /// File name used for the bootstrap installer
    pub fn bootstrap_file_name(&self) -> Result<String> {
        if let Some(name) = &self.bootstrap_file_name {
            return Ok(name.clone());
        }

        let url = Url::parse(&self.bootstrap_url)
            .map_err(|_| Error::invalid_url("bootstrap-url", &self.bootstrap_url))?;

        url.path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .map(String::from)
            .ok_or_else(|| {
                Error::invalid_config(format!(
                    "Cannot derive a file name from bootstrap-url {}",
                    self.bootstrap_url
                ))
            })
    }
}

/// Parse a strict numeric `major.minor.patch` version
pub fn parse_version_triple(version: &str) -> Result<semver::Version> {
    let parts: Vec<&str> = version.trim().split('.').collect();
    if parts.len() != 3 {
        return Err(Error::invalid_version(version));
    }

    let mut numbers = [0u64; 3];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::invalid_version(version));
        }
        *slot = part.parse().map_err(|_| Error::invalid_version(version))?;
    }

    Ok(semver::Version::new(numbers[0], numbers[1], numbers[2]))
}

/// Network and HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Read timeout (idle time between received chunks) in seconds
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    /// Write buffer size used while streaming a download
    #[serde(default = "default_chunk_size")]
    pub download_chunk_size: usize,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            download_chunk_size: default_chunk_size(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_connect_timeout() -> u64 {
    30
}
fn default_read_timeout() -> u64 {
    120
}
fn default_chunk_size() -> usize {
    8192
}
fn default_user_agent() -> String {
    format!(
        "sua-updater/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Installation search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SearchConfig {
    /// Maximum directory depth of the recursive fallback search
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Explicit volume roots; enumerated from the system when absent
    #[serde(default)]
    pub volumes: Option<Vec<PathBuf>>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            volumes: None,
        }
    }
}

fn default_max_depth() -> usize {
    12
}
