//! Update decision state machine
//!
//! One run walks through these states:
//!
//! ```text
//! Searching ─┬─> NotInstalled ─> Provisioning ─┬─> Ready ────────┐
//!            │                                 └─> ProvisionFailed│
//!            └─> Installed ─┬─> UpToDate ─────────────────────────┤
//!                           └─> NeedsUpdate ─> Updating ─┬─> Updated ─> Launching ─> Done
//!                                                        └─> UpdateFailed ─────────> Done
//! ```
//!
//! Discovery and probing never fail: a missing install or an unreadable
//! version simply selects a branch. Download and install failures are
//! reported through the notifier and end the run without launching. Nothing
//! is retried, apart from the installer strategy cascade itself.

use anyhow::{anyhow, Context, Result};
use semver::Version;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::download::{ArtifactDownloader, DownloadError};
use crate::installer::{InstallAttempt, InstallError, SilentInstaller};
use crate::launcher::{DetachedLauncher, Launcher};
use crate::locator::InstallationLocator;
use crate::progress::{Notifier, ProgressSink, Severity};
use crate::version::{decide, probe_version, UpdateReason, VersionDecision};
use sua_core::{TargetRelease, UpdaterConfig};

/// Branch of the run that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Installing from scratch
    Provisioning,

    /// Replacing an existing install
    Updating,
}

/// How the application became current
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Installed version already matched the target
    UpToDate,

    /// Application was installed from scratch
    Provisioned,

    /// Existing install was updated
    Updated,
}

/// Why a run failed
#[derive(Error, Debug)]
pub enum UpdateError {
    /// Installer could not be downloaded
    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    /// Installer could not be run silently
    #[error("Installation failed: {0}")]
    Install(#[from] InstallError),

    /// Installer reported success but the executable is nowhere to be found
    #[error("Installer reported success but {executable_name} could not be found")]
    PostInstallVerification { executable_name: String },
}

impl UpdateError {
    /// Attempts made before the cascade gave up, if that is what failed
    pub fn exhausted_attempts(&self) -> Option<&[InstallAttempt]> {
        match self {
            Self::Install(InstallError::CascadeExhausted { attempts, .. }) => Some(attempts),
            _ => None,
        }
    }
}

/// Final result of one run
#[derive(Debug)]
pub enum RunOutcome {
    /// Application is current
    Completed {
        decision: Decision,
        executable: PathBuf,
        launched: bool,
    },

    /// Provisioning or updating failed
    Failed { phase: Phase, error: UpdateError },
}

impl RunOutcome {
    /// Whether the application ended up current
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Orchestrator states
#[derive(Debug)]
enum UpdateState {
    Searching,
    NotInstalled,
    Installed {
        executable: PathBuf,
    },
    UpToDate {
        executable: PathBuf,
    },
    NeedsUpdate {
        executable: PathBuf,
        installed: Option<Version>,
        reason: UpdateReason,
    },
    Provisioning,
    Updating {
        executable: PathBuf,
        installed: Option<Version>,
    },
    Ready {
        executable: PathBuf,
    },
    Updated {
        executable: PathBuf,
    },
    ProvisionFailed(UpdateError),
    UpdateFailed(UpdateError),
    Launching {
        executable: PathBuf,
        decision: Decision,
    },
    Done(RunOutcome),
}

/// Drives one discovery / update / launch pass
pub struct UpdateOrchestrator {
    config: UpdaterConfig,
    release: TargetRelease,
    forced_versions: Vec<Version>,
    bootstrap_file_name: String,
    download_dir: PathBuf,
    locator: InstallationLocator,
    downloader: ArtifactDownloader,
    installer: SilentInstaller,
    launcher: Box<dyn Launcher>,
}

impl UpdateOrchestrator {
    /// Build an orchestrator with real components from configuration
    pub fn new(config: UpdaterConfig) -> Result<Self> {
        let release = TargetRelease::from_config(&config).context("Invalid target release")?;
        let forced_versions = config
            .forced_versions()
            .context("Invalid forced-upgrade version")?;
        let bootstrap_file_name = config
            .bootstrap_file_name()
            .context("Invalid bootstrap installer")?;
        let download_dir = resolve_download_dir(&config)?;
        let downloader =
            ArtifactDownloader::new(&config.network).context("Failed to create HTTP client")?;
        let locator = InstallationLocator::from_config(&config);

        debug!(
            "Orchestrator initialized: target={}, download_dir={:?}",
            release.version, download_dir
        );

        Ok(Self {
            config,
            release,
            forced_versions,
            bootstrap_file_name,
            download_dir,
            locator,
            downloader,
            installer: SilentInstaller::new(),
            launcher: Box::new(DetachedLauncher),
        })
    }

    /// Replace the silent installer
    pub fn with_installer(mut self, installer: SilentInstaller) -> Self {
        self.installer = installer;
        self
    }

    /// Replace the process launcher
    pub fn with_launcher(mut self, launcher: Box<dyn Launcher>) -> Self {
        self.launcher = launcher;
        self
    }

    /// Release this orchestrator installs
    pub fn release(&self) -> &TargetRelease {
        &self.release
    }

    /// Directory downloaded installers are written to
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Run the state machine to completion
    pub async fn run(&self, sink: &dyn ProgressSink, notifier: &dyn Notifier) -> RunOutcome {
        let mut state = UpdateState::Searching;

        loop {
            debug!("State: {:?}", state);
            state = match state {
                UpdateState::Done(outcome) => return outcome,
                state => self.step(state, sink, notifier).await,
            };
        }
    }

    async fn step(
        &self,
        state: UpdateState,
        sink: &dyn ProgressSink,
        notifier: &dyn Notifier,
    ) -> UpdateState {
        match state {
            UpdateState::Searching => {
                sink.on_status("Looking for an existing SUA installation...");
                match self.locate().await {
                    Some(executable) => UpdateState::Installed { executable },
                    None => UpdateState::NotInstalled,
                }
            }

            UpdateState::NotInstalled => {
                info!("SUA is not installed; provisioning from the base installer");
                UpdateState::Provisioning
            }

            UpdateState::Installed { executable } => {
                let installed = self.probe(&executable).await;
                match decide(installed.as_ref(), &self.release.version, &self.forced_versions) {
                    VersionDecision::UpToDate => UpdateState::UpToDate { executable },
                    VersionDecision::NeedsUpdate { reason } => UpdateState::NeedsUpdate {
                        executable,
                        installed,
                        reason,
                    },
                }
            }

            UpdateState::UpToDate { executable } => {
                info!("SUA {} is already installed", self.release.version);
                notifier.notify(
                    "SUA is up to date",
                    &format!(
                        "You already have the latest SUA version ({}).\n\nThe program will now open.",
                        self.release.version
                    ),
                    Severity::Info,
                );
                UpdateState::Launching {
                    executable,
                    decision: Decision::UpToDate,
                }
            }

            UpdateState::NeedsUpdate {
                executable,
                installed,
                reason,
            } => {
                if reason == UpdateReason::ForcedUpgrade {
                    let from = display_version(installed.as_ref());
                    info!("Installed version {} is always upgraded", from);
                    notifier.notify(
                        "Update required",
                        &format!(
                            "You have version {}.\nIt will be updated to version {}.",
                            from, self.release.version
                        ),
                        Severity::Info,
                    );
                }
                UpdateState::Updating {
                    executable,
                    installed,
                }
            }

            UpdateState::Provisioning => match self.provision(sink).await {
                Ok(executable) => {
                    notifier.notify(
                        "Installation successful",
                        "SUA was installed successfully.\n\nThe program will now open.",
                        Severity::Info,
                    );
                    UpdateState::Ready { executable }
                }
                Err(e) => UpdateState::ProvisionFailed(e),
            },

            UpdateState::Updating {
                executable,
                installed,
            } => {
                sink.on_status(&format!(
                    "Updating SUA from {} to {}...",
                    display_version(installed.as_ref()),
                    self.release.version
                ));
                match self.update_to_target(sink).await {
                    Ok(()) => {
                        notifier.notify(
                            "Update successful",
                            &format!(
                                "SUA was updated to version {}.\n\nThe program will now open.",
                                self.release.version
                            ),
                            Severity::Info,
                        );
                        UpdateState::Updated { executable }
                    }
                    Err(e) => UpdateState::UpdateFailed(e),
                }
            }

            UpdateState::Ready { executable } => UpdateState::Launching {
                executable,
                decision: Decision::Provisioned,
            },

            UpdateState::Updated { executable } => UpdateState::Launching {
                executable,
                decision: Decision::Updated,
            },

            UpdateState::ProvisionFailed(error) => {
                self.report_failure(Phase::Provisioning, &error, notifier);
                UpdateState::Done(RunOutcome::Failed {
                    phase: Phase::Provisioning,
                    error,
                })
            }

            UpdateState::UpdateFailed(error) => {
                self.report_failure(Phase::Updating, &error, notifier);
                UpdateState::Done(RunOutcome::Failed {
                    phase: Phase::Updating,
                    error,
                })
            }

            UpdateState::Launching {
                executable,
                decision,
            } => {
                let launched = self.launch(&executable, notifier);
                UpdateState::Done(RunOutcome::Completed {
                    decision,
                    executable,
                    launched,
                })
            }

            UpdateState::Done(outcome) => UpdateState::Done(outcome),
        }
    }

    /// Run the locator off the async workers; it may walk whole volumes
    async fn locate(&self) -> Option<PathBuf> {
        let locator = self.locator.clone();
        tokio::task::spawn_blocking(move || locator.locate())
            .await
            .unwrap_or_else(|e| {
                error!("Installation search task failed: {}", e);
                None
            })
    }

    async fn probe(&self, executable: &Path) -> Option<Version> {
        let executable = executable.to_path_buf();
        tokio::task::spawn_blocking(move || probe_version(&executable))
            .await
            .unwrap_or_else(|e| {
                error!("Version probe task failed: {}", e);
                None
            })
    }

    /// Download and run the base installer, then verify it left an executable behind
    async fn provision(&self, sink: &dyn ProgressSink) -> Result<PathBuf, UpdateError> {
        sink.on_status("SUA is not installed. Downloading and installing the base version...");

        let destination = self.download_dir.join(&self.bootstrap_file_name);
        self.downloader
            .download(&self.config.bootstrap_url, &destination, sink)
            .await?;
        self.installer.install(&destination, sink).await?;

        sink.on_status("Verifying installation...");
        self.locate()
            .await
            .ok_or_else(|| UpdateError::PostInstallVerification {
                executable_name: self.config.executable_name.clone(),
            })
    }

    /// Download and run the installer for the target version
    async fn update_to_target(&self, sink: &dyn ProgressSink) -> Result<(), UpdateError> {
        let destination = self.download_dir.join(&self.release.file_name);

        self.downloader
            .download(&self.release.download_url, &destination, sink)
            .await?;
        self.installer.install(&destination, sink).await?;
        Ok(())
    }

    fn report_failure(&self, phase: Phase, error: &UpdateError, notifier: &dyn Notifier) {
        error!("{:?} failed: {}", phase, error);

        match error {
            UpdateError::Download(e) => notifier.notify(
                "Download error",
                &format!(
                    "The installer could not be downloaded. Check your internet connection or that the URL is correct.\n\nError: {}",
                    e
                ),
                Severity::Error,
            ),
            UpdateError::Install(e @ InstallError::CascadeExhausted { installer, .. }) => {
                notifier.notify(
                    "Installation error",
                    &format!(
                        "Automatic installation failed. The installer will open so you can finish it manually.\n\nError: {}",
                        e
                    ),
                    Severity::Error,
                );
                if let Err(open_err) = self.launcher.open_interactive(installer) {
                    warn!("Could not open installer {:?}: {}", installer, open_err);
                    notifier.notify(
                        "Could not open installer",
                        &format!(
                            "The installer could not be opened. Run it manually from:\n{}\n\nError: {}",
                            installer.display(),
                            open_err
                        ),
                        Severity::Error,
                    );
                }
            }
            UpdateError::Install(e) => notifier.notify(
                "Installation error",
                &format!("Automatic installation failed.\n\nError: {}", e),
                Severity::Error,
            ),
            UpdateError::PostInstallVerification { .. } => notifier.notify(
                "Installation incomplete",
                "The installation seems to have finished, but the SUA executable could not be found.",
                Severity::Error,
            ),
        }
    }

    fn launch(&self, executable: &Path, notifier: &dyn Notifier) -> bool {
        if !self.config.launch_after_update {
            info!("Launch disabled; not starting {:?}", executable);
            return false;
        }

        match self.launcher.launch(executable) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to launch {:?}: {}", executable, e);
                notifier.notify(
                    "Could not start SUA",
                    &format!(
                        "SUA could not be started. Try opening it from its shortcut.\n\nError: {}",
                        e
                    ),
                    Severity::Warning,
                );
                false
            }
        }
    }
}

fn display_version(version: Option<&Version>) -> String {
    version
        .map(|v| v.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Configured download directory, or the user's Downloads folder
fn resolve_download_dir(config: &UpdaterConfig) -> Result<PathBuf> {
    if let Some(dir) = &config.download_dir {
        return Ok(dir.clone());
    }

    let user_downloads = directories::UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf));
    if let Some(dir) = user_downloads {
        return Ok(dir);
    }

    directories::BaseDirs::new()
        .map(|b| b.home_dir().join("Downloads"))
        .ok_or_else(|| anyhow!("Could not determine the Downloads directory"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_version() {
        assert_eq!(display_version(Some(&Version::new(3, 5, 3))), "3.5.3");
        assert_eq!(display_version(None), "unknown");
    }

    #[test]
    fn test_configured_download_dir_wins() {
        let config = UpdaterConfig {
            download_dir: Some(PathBuf::from("/tmp/sua-downloads")),
            ..Default::default()
        };
        assert_eq!(
            resolve_download_dir(&config).unwrap(),
            PathBuf::from("/tmp/sua-downloads")
        );
    }

    #[test]
    fn test_exhausted_attempts() {
        let error = UpdateError::Install(InstallError::CascadeExhausted {
            installer: PathBuf::from("setup.exe"),
            attempts: vec![],
        });
        assert_eq!(error.exhausted_attempts(), Some(&[][..]));

        let error = UpdateError::PostInstallVerification {
            executable_name: "SUA.exe".to_string(),
        };
        assert!(error.exhausted_attempts().is_none());
    }
}
