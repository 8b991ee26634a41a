//! Target release derivation

use semver::Version;

use super::updater_config::{parse_version_triple, UpdaterConfig};
use crate::error::{Error, Result};

/// Prefix of every per-version artifact name
const ARTIFACT_PREFIX: &str = "VersionSUA";

/// Release the updater should end up with, immutable for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRelease {
    /// Parsed version
    pub version: Version,

    /// Version exactly as configured
    pub version_string: String,

    /// Where the version-specific installer is published
    pub download_url: String,

    /// Local file name of the version-specific installer
    pub file_name: String,
}

impl TargetRelease {
    /// Derive the release from a version string and the artifact base URL
    pub fn new(version_string: &str, base_url: &str) -> Result<Self> {
        let version = parse_version_triple(version_string)?;
        let file_name = artifact_file_name(version_string);
        let download_url = format!("{}/{}", base_url.trim_end_matches('/'), file_name);

        url::Url::parse(&download_url).map_err(|_| Error::invalid_url("base-url", base_url))?;

        Ok(Self {
            version,
            version_string: version_string.trim().to_string(),
            download_url,
            file_name,
        })
    }

    /// Derive the release described by an updater configuration
    pub fn from_config(config: &UpdaterConfig) -> Result<Self> {
        Self::new(&config.target_version, &config.base_url)
    }
}

/// `VersionSUA` followed by the digits of the version, e.g. `VersionSUA366.exe`
pub fn artifact_file_name(version_string: &str) -> String {
    let digits: String = version_string
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    format!("{}{}.exe", ARTIFACT_PREFIX, digits)
}
