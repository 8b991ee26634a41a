//! Test doubles for processes, launches and progress reporting

use async_trait::async_trait;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use sua_update::{Launcher, Notifier, ProcessRunner, Progress, ProgressSink, Severity, UpdateEvent};

use super::fixtures::write_executable;

/// One recorded process invocation
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
}

/// Process runner that answers with scripted exit codes
///
/// Once the script runs out every further call exits with 1. When an
/// install target is set, a zero exit code writes a fake executable there,
/// as a real installer would.
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    codes: Arc<Mutex<VecDeque<io::Result<Option<i32>>>>>,
    calls: Arc<Mutex<Vec<Invocation>>>,
    installs: Option<(PathBuf, String)>,
}

impl ScriptedRunner {
    pub fn with_codes(codes: &[i32]) -> Self {
        let runner = Self::default();
        runner
            .codes
            .lock()
            .unwrap()
            .extend(codes.iter().map(|c| Ok(Some(*c))));
        runner
    }

    /// Queue an exit code
    pub fn then_code(self, code: i32) -> Self {
        self.codes.lock().unwrap().push_back(Ok(Some(code)));
        self
    }

    /// Queue a spawn failure
    pub fn then_spawn_error(self) -> Self {
        self.codes
            .lock()
            .unwrap()
            .push_back(Err(io::Error::new(io::ErrorKind::NotFound, "no such program")));
        self
    }

    /// Write a fake executable reporting `version` at `path` on success
    pub fn installing(mut self, path: impl Into<PathBuf>, version: &str) -> Self {
        self.installs = Some((path.into(), version.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(&self, program: &OsString, args: &[OsString]) -> io::Result<Option<i32>> {
        self.calls.lock().unwrap().push(Invocation {
            program: program.clone(),
            args: args.to_vec(),
        });

        let result = self
            .codes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Some(1)));

        if let (Ok(Some(0)), Some((path, version))) = (&result, &self.installs) {
            write_executable(path, version);
        }
        result
    }
}

/// Launcher that records instead of starting processes
#[derive(Clone, Default)]
pub struct RecordingLauncher {
    pub launched: Arc<Mutex<Vec<PathBuf>>>,
    pub opened: Arc<Mutex<Vec<PathBuf>>>,
    fail_launch: bool,
    fail_open: bool,
}

impl RecordingLauncher {
    /// Launcher whose `launch` always fails
    pub fn failing() -> Self {
        Self {
            fail_launch: true,
            ..Default::default()
        }
    }

    /// Launcher whose `open_interactive` always fails
    pub fn failing_open() -> Self {
        Self {
            fail_open: true,
            ..Default::default()
        }
    }

    pub fn launched(&self) -> Vec<PathBuf> {
        self.launched.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().unwrap().clone()
    }
}

impl Launcher for RecordingLauncher {
    fn launch(&self, executable: &Path) -> io::Result<()> {
        self.launched.lock().unwrap().push(executable.to_path_buf());
        if self.fail_launch {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "access denied"));
        }
        Ok(())
    }

    fn open_interactive(&self, installer: &Path) -> io::Result<()> {
        self.opened.lock().unwrap().push(installer.to_path_buf());
        if self.fail_open {
            // What CreateProcess reports for installers that need elevation
            return Err(io::Error::from_raw_os_error(740));
        }
        Ok(())
    }
}

/// Records everything sent to it as events
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<UpdateEvent>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<UpdateEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn progress_values(&self) -> Vec<Progress> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UpdateEvent::Progress(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UpdateEvent::Status(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<(String, Severity)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UpdateEvent::Notice {
                    title, severity, ..
                } => Some((title, severity)),
                _ => None,
            })
            .collect()
    }

    pub fn notice_titles(&self) -> Vec<String> {
        self.notices().into_iter().map(|(title, _)| title).collect()
    }
}

impl ProgressSink for RecordingReporter {
    fn on_status(&self, text: &str) {
        self.events
            .lock()
            .unwrap()
            .push(UpdateEvent::Status(text.to_string()));
    }

    fn on_progress(&self, progress: Progress) {
        self.events
            .lock()
            .unwrap()
            .push(UpdateEvent::Progress(progress));
    }
}

impl Notifier for RecordingReporter {
    fn notify(&self, title: &str, message: &str, severity: Severity) {
        self.events.lock().unwrap().push(UpdateEvent::Notice {
            title: title.to_string(),
            message: message.to_string(),
            severity,
        });
    }
}
