//! Update orchestration for the SUA desktop application
//!
//! Provides:
//! - Version probing of installed executables (PE version resource)
//! - Discovery of existing installs across every fixed volume
//! - Streaming installer download with progress reporting
//! - Silent installation through a cascade of invocation strategies
//! - The decision state machine tying them together

pub mod download;
pub mod installer;
pub mod launcher;
pub mod locator;
pub mod orchestrator;
pub mod progress;
pub mod version;

pub use download::{ArtifactDownloader, DownloadError, DownloadReport};
pub use installer::{
    InstallAttempt, InstallError, InstallOutcome, InstallReport, InstallStrategy, ProcessRunner,
    SilentInstaller, SystemProcessRunner,
};
pub use launcher::{DetachedLauncher, Launcher};
pub use locator::{discover_volumes, InstallationLocator};
pub use orchestrator::{Decision, Phase, RunOutcome, UpdateError, UpdateOrchestrator};
pub use progress::{
    pump_events, ChannelReporter, Notifier, Progress, ProgressSink, Severity, UpdateEvent,
};
pub use version::{decide, probe_version, UpdateReason, VersionDecision};

/// Current updater version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
