//! Installation discovery across every fixed volume
//!
//! The application has been installed under several historical layouts and
//! not always on the system drive. Discovery checks the known layouts on each
//! volume first, then falls back to a depth-bounded recursive search for the
//! executable name. The fallback can be slow on large volumes; run it off the
//! thread that drives the display.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use sysinfo::Disks;
use tracing::{debug, info};
use walkdir::WalkDir;

use sua_core::UpdaterConfig;

/// Enumerate the roots of all mounted, non-removable volumes
///
/// Ordered by mount point so that search precedence is stable between runs.
pub fn discover_volumes() -> Vec<PathBuf> {
    let disks = Disks::new_with_refreshed_list();
    let volumes: BTreeSet<PathBuf> = disks
        .list()
        .iter()
        .filter(|disk| !disk.is_removable())
        .map(|disk| disk.mount_point().to_path_buf())
        .collect();

    if !volumes.is_empty() {
        debug!("Discovered volumes: {:?}", volumes);
        return volumes.into_iter().collect();
    }

    debug!("No disks reported, falling back to default roots");
    fallback_volumes()
}

#[cfg(windows)]
fn fallback_volumes() -> Vec<PathBuf> {
    ('A'..='Z')
        .map(|letter| PathBuf::from(format!("{}:\\", letter)))
        .filter(|root| root.exists())
        .collect()
}

#[cfg(not(windows))]
fn fallback_volumes() -> Vec<PathBuf> {
    vec![PathBuf::from("/")]
}

/// Finds the installed executable
#[derive(Debug, Clone)]
pub struct InstallationLocator {
    /// Volume roots, searched in order
    volumes: Vec<PathBuf>,

    /// Known install locations relative to a volume root
    candidates: Vec<PathBuf>,

    /// Executable file name to look for
    executable_name: String,

    /// Depth bound for the recursive search
    max_depth: usize,
}

impl InstallationLocator {
    /// Create a locator over explicit volumes
    pub fn new(
        volumes: Vec<PathBuf>,
        candidates: &[String],
        executable_name: impl Into<String>,
        max_depth: usize,
    ) -> Self {
        Self {
            volumes,
            candidates: candidates.iter().map(|c| relative_path(c)).collect(),
            executable_name: executable_name.into(),
            max_depth,
        }
    }

    /// Create a locator from configuration, enumerating volumes unless configured
    pub fn from_config(config: &UpdaterConfig) -> Self {
        let volumes = config
            .search
            .volumes
            .clone()
            .unwrap_or_else(discover_volumes);

        Self::new(
            volumes,
            &config.install_candidates,
            config.executable_name.clone(),
            config.search.max_depth,
        )
    }

    /// Volume roots this locator searches
    pub fn volumes(&self) -> &[PathBuf] {
        &self.volumes
    }

    /// Find the executable; `None` when no install exists
    pub fn locate(&self) -> Option<PathBuf> {
        if let Some(path) = self.find_in_candidates() {
            info!("Found installation at known location: {:?}", path);
            return Some(path);
        }

        debug!(
            "No known location matched, searching volumes for {} (max depth {})",
            self.executable_name, self.max_depth
        );

        let found = self.search_volumes();
        match &found {
            Some(path) => info!("Found installation by search: {:?}", path),
            None => info!("No installation of {} found", self.executable_name),
        }
        found
    }

    /// Check each known location on each volume
    pub fn find_in_candidates(&self) -> Option<PathBuf> {
        self.volumes.iter().find_map(|volume| {
            self.candidates
                .iter()
                .map(|candidate| volume.join(candidate))
                .find(|path| path.is_file())
        })
    }

    /// Recursive, depth-bounded search of each volume
    pub fn search_volumes(&self) -> Option<PathBuf> {
        self.volumes
            .iter()
            .find_map(|volume| self.search_volume(volume))
    }

    fn search_volume(&self, volume: &Path) -> Option<PathBuf> {
        WalkDir::new(volume)
            .max_depth(self.max_depth)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .find(|entry| {
                entry.file_type().is_file()
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| name.eq_ignore_ascii_case(&self.executable_name))
            })
            .map(|entry| entry.into_path())
    }
}

/// Build a relative path from a `/` or `\` separated candidate
fn relative_path(candidate: &str) -> PathBuf {
    candidate
        .split(['/', '\\'])
        .filter(|part| !part.is_empty())
        .collect()
}
