//! External process handle and file polling.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::ConsoleError;

const FILE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// An executable plus its argument list, launched at most once at a time.
#[derive(Debug, Default)]
pub struct ExternalProcess {
    pub command_name: PathBuf,
    pub arguments: Vec<String>,
    child: Option<Child>,
}

impl ExternalProcess {
    pub fn new(command_name: impl Into<PathBuf>, arguments: Vec<String>) -> Self {
        Self {
            command_name: command_name.into(),
            arguments,
            child: None,
        }
    }

    /// Spawn the process. With `debug_output` its stdout and stderr are
    /// inherited, otherwise discarded.
    pub fn launch(&mut self, debug_output: bool) -> Result<(), ConsoleError> {
        if self.child.is_some() {
            return Err(ConsoleError::InvalidState(format!(
                "{} already launched",
                self.command_name.display()
            )));
        }
        let (stdout, stderr) = if debug_output {
            (Stdio::inherit(), Stdio::inherit())
        } else {
            (Stdio::null(), Stdio::null())
        };
        let child = Command::new(&self.command_name)
            .args(&self.arguments)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|e| ConsoleError::io(&self.command_name, e))?;
        info!(pid = child.id(), command = %self.full_console_command(), "process launched");
        self.child = Some(child);
        Ok(())
    }

    /// Kill the process and reap it.
    pub fn stop(&mut self) -> Result<(), ConsoleError> {
        let mut child = self.child.take().ok_or_else(|| {
            ConsoleError::InvalidState(format!("{} is not running", self.command_name.display()))
        })?;
        let pid = child.id();
        let exited = child
            .try_wait()
            .map_err(|e| ConsoleError::io(&self.command_name, e))?;
        if exited.is_none() {
            child
                .kill()
                .map_err(|e| ConsoleError::io(&self.command_name, e))?;
        }
        let status = child
            .wait()
            .map_err(|e| ConsoleError::io(&self.command_name, e))?;
        info!(pid, %status, "process stopped");
        Ok(())
    }

    /// True between a successful `launch` and the matching `stop`.
    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// The command line as a shell would show it.
    pub fn full_console_command(&self) -> String {
        std::iter::once(self.command_name.display().to_string())
            .chain(self.arguments.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Drop for ExternalProcess {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Block until `path` exists or `timeout` elapses.
pub fn wait_for_file(path: &Path, timeout: Duration) -> Result<(), ConsoleError> {
    let started = Instant::now();
    loop {
        if path.exists() {
            debug!(path = %path.display(), waited_ms = started.elapsed().as_millis() as u64, "file appeared");
            return Ok(());
        }
        if started.elapsed() >= timeout {
            return Err(ConsoleError::FileTimeout {
                path: path.to_path_buf(),
                waited: timeout,
            });
        }
        std::thread::sleep(FILE_POLL_INTERVAL);
    }
}

/// Remove `path`, treating a missing file as already removed.
pub(crate) fn delete_file(path: &Path) -> Result<(), ConsoleError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ConsoleError::io(path, e)),
    }
}
