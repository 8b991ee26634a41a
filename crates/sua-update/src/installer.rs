//! Silent installation through a cascade of invocation strategies
//!
//! Installers from different toolchains understand different silent flags.
//! The installer type is picked from the file extension, which selects an
//! ordered list of [`InstallStrategy`] values. [`run_cascade`] tries them in
//! order and stops at the first attempt that exits with code 0.
//!
//! Every attempt waits for the installer process to exit. There is no timeout.

use async_trait::async_trait;
use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::progress::{Progress, ProgressSink};

/// Program the strategy invokes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyProgram {
    /// The installer executable itself
    Installer,

    /// The Windows Installer service front-end, fed the package path
    Msiexec,
}

/// One way of invoking an installer non-interactively
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallStrategy {
    /// Short name used in logs
    pub name: &'static str,

    /// Program to run
    pub program: StrategyProgram,

    /// Arguments; for `Msiexec` the package path is passed after `/i`
    pub args: Vec<String>,
}

impl InstallStrategy {
    fn new(name: &'static str, program: StrategyProgram, args: &[&str]) -> Self {
        Self {
            name,
            program,
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Program path and full argument list for an installer at `installer`
    pub fn command_line(&self, installer: &Path) -> (OsString, Vec<OsString>) {
        match self.program {
            StrategyProgram::Installer => (
                installer.as_os_str().to_owned(),
                self.args.iter().map(OsString::from).collect(),
            ),
            StrategyProgram::Msiexec => {
                let mut args = vec![OsString::from("/i"), installer.as_os_str().to_owned()];
                args.extend(self.args.iter().map(OsString::from));
                (OsString::from("msiexec"), args)
            }
        }
    }
}

/// Strategy chain for an installer, chosen by file extension
pub fn strategies_for(installer: &Path) -> Vec<InstallStrategy> {
    let extension = installer
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("msi") => vec![InstallStrategy::new(
            "msiexec-quiet",
            StrategyProgram::Msiexec,
            &["/quiet", "/norestart"],
        )],
        Some("exe") => vec![
            InstallStrategy::new(
                "windows-installer",
                StrategyProgram::Installer,
                &["/quiet", "/norestart"],
            ),
            InstallStrategy::new("nsis", StrategyProgram::Installer, &["/S"]),
            InstallStrategy::new("lowercase-silent", StrategyProgram::Installer, &["/s"]),
            InstallStrategy::new(
                "installshield",
                StrategyProgram::Installer,
                &["/s", "/v\"/qn REBOOT=ReallySuppress\""],
            ),
        ],
        _ => vec![InstallStrategy::new(
            "nsis-guess",
            StrategyProgram::Installer,
            &["/S"],
        )],
    }
}

/// Result of a single attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Exit code 0
    Success,

    /// Non-zero exit code
    Failure,

    /// Process could not be started or ended without an exit code
    Unknown,
}

/// Record of one strategy invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallAttempt {
    /// Position of the strategy in its chain
    pub strategy_index: usize,

    /// Strategy name
    pub strategy: &'static str,

    /// Exit code, when the process produced one
    pub exit_code: Option<i32>,

    /// Classified outcome
    pub outcome: InstallOutcome,
}

/// Successful installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Installer that was run
    pub installer: PathBuf,

    /// Every attempt made, the last one being the successful one
    pub attempts: Vec<InstallAttempt>,
}

/// Installation failure
#[derive(Error, Debug)]
pub enum InstallError {
    /// Installer file does not exist
    #[error("Installer not found: {0:?}")]
    MissingInstaller(PathBuf),

    /// Every strategy was tried and none succeeded
    #[error("All {} silent install strategies failed for {installer:?}", attempts.len())]
    CascadeExhausted {
        installer: PathBuf,
        attempts: Vec<InstallAttempt>,
    },
}

/// Runs a process to completion and reports its exit code
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `program` with `args`, wait for it, return its exit code if any
    async fn run(&self, program: &OsString, args: &[OsString]) -> std::io::Result<Option<i32>>;
}

/// Runs installers as real child processes with no console window
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessRunner;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    async fn run(&self, program: &OsString, args: &[OsString]) -> std::io::Result<Option<i32>> {
        let mut command = tokio::process::Command::new(program);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(windows)]
        {
            command.creation_flags(CREATE_NO_WINDOW);
            for arg in args {
                // Passthrough arguments such as /v"/qn ..." must reach the
                // installer with their quotes intact.
                if arg.to_string_lossy().contains('"') {
                    command.raw_arg(arg);
                } else {
                    command.arg(arg);
                }
            }
        }

        #[cfg(not(windows))]
        command.args(args);

        let status = command.spawn()?.wait().await?;
        Ok(status.code())
    }
}

/// Try `strategies` in order until one succeeds
///
/// `attempt` runs a single strategy and returns its exit code. Returns every
/// attempt made and whether the last one succeeded. Strategies after the
/// first success are never invoked.
pub async fn run_cascade<F, Fut>(
    strategies: &[InstallStrategy],
    mut attempt: F,
) -> (Vec<InstallAttempt>, bool)
where
    F: FnMut(usize, &InstallStrategy) -> Fut,
    Fut: Future<Output = std::io::Result<Option<i32>>>,
{
    let mut attempts = Vec::with_capacity(strategies.len());

    for (index, strategy) in strategies.iter().enumerate() {
        debug!("Install attempt {} using {}", index + 1, strategy.name);

        let (exit_code, outcome) = match attempt(index, strategy).await {
            Ok(Some(0)) => (Some(0), InstallOutcome::Success),
            Ok(Some(code)) => (Some(code), InstallOutcome::Failure),
            Ok(None) => (None, InstallOutcome::Unknown),
            Err(e) => {
                warn!("Could not run strategy {}: {}", strategy.name, e);
                (None, InstallOutcome::Unknown)
            }
        };

        attempts.push(InstallAttempt {
            strategy_index: index,
            strategy: strategy.name,
            exit_code,
            outcome,
        });

        if outcome == InstallOutcome::Success {
            info!("Strategy {} succeeded", strategy.name);
            return (attempts, true);
        }

        warn!(
            "Strategy {} did not succeed (exit code {:?})",
            strategy.name, exit_code
        );
    }

    (attempts, false)
}

/// Installs packages without user interaction
pub struct SilentInstaller {
    runner: Box<dyn ProcessRunner>,
}

impl SilentInstaller {
    /// Create an installer that runs real processes
    pub fn new() -> Self {
        Self::with_runner(Box::new(SystemProcessRunner))
    }

    /// Create an installer with a custom process runner
    pub fn with_runner(runner: Box<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    /// Run the installer at `installer` silently
    pub async fn install(
        &self,
        installer: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<InstallReport, InstallError> {
        if !installer.is_file() {
            return Err(InstallError::MissingInstaller(installer.to_path_buf()));
        }

        let strategies = strategies_for(installer);
        info!(
            "Installing {:?} ({} strateg{})",
            installer,
            strategies.len(),
            if strategies.len() == 1 { "y" } else { "ies" }
        );

        sink.on_status("Preparing installation...");
        sink.on_progress(Progress::Indeterminate);

        let (attempts, succeeded) = run_cascade(&strategies, |index, strategy| {
            if index == 0 {
                sink.on_status("Installing... this may take several minutes");
            } else {
                sink.on_status(&format!(
                    "Installing... retrying with another method ({}/{})",
                    index + 1,
                    strategies.len()
                ));
            }
            let (program, args) = strategy.command_line(installer);
            async move { self.runner.run(&program, &args).await }
        })
        .await;

        if succeeded {
            sink.on_status("Installation complete");
            Ok(InstallReport {
                installer: installer.to_path_buf(),
                attempts,
            })
        } else {
            sink.on_status("Installation failed");
            Err(InstallError::CascadeExhausted {
                installer: installer.to_path_buf(),
                attempts,
            })
        }
    }
}

impl Default for SilentInstaller {
    fn default() -> Self {
        Self::new()
    }
}
