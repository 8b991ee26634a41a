//! Detached process launching
//!
//! The application and the manual-install fallback are started as
//! independent processes: the updater neither waits for them nor owns their
//! lifetime.

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::info;

/// Starts processes the updater does not wait for
pub trait Launcher: Send + Sync {
    /// Start the installed application
    fn launch(&self, executable: &Path) -> io::Result<()>;

    /// Open an installer with its normal, interactive UI
    fn open_interactive(&self, installer: &Path) -> io::Result<()>;
}

/// Launches real processes, detached from the updater
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedLauncher;

impl DetachedLauncher {
    fn spawn_detached(mut command: Command) -> io::Result<()> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const DETACHED_PROCESS: u32 = 0x0000_0008;
            command.creation_flags(DETACHED_PROCESS);
        }

        // Dropping the handle does not terminate the child.
        command.spawn().map(drop)
    }
}

impl Launcher for DetachedLauncher {
    fn launch(&self, executable: &Path) -> io::Result<()> {
        info!("Launching {:?}", executable);

        let mut command = Command::new(executable);
        if let Some(dir) = executable.parent() {
            command.current_dir(dir);
        }
        Self::spawn_detached(command)
    }

    fn open_interactive(&self, installer: &Path) -> io::Result<()> {
        info!("Opening installer for manual completion: {:?}", installer);
        Self::spawn_detached(shell_open_command(installer))
    }
}

/// Open a file the way Explorer would
///
/// `start` goes through ShellExecute, which raises the elevation prompt for
/// installers that require it instead of failing with error 740.
#[cfg(windows)]
fn shell_open_command(path: &Path) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", ""]).arg(path);
    command
}

#[cfg(not(windows))]
fn shell_open_command(path: &Path) -> Command {
    let is_msi = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("msi"));

    if is_msi {
        let mut command = Command::new("msiexec");
        command.arg("/i").arg(path);
        command
    } else {
        Command::new(path)
    }
}
