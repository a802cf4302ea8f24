//! External tool invocation
//!
//! All external programs (package index, checkout tool, grep) run through
//! [`ToolCommand`]. Commands are argument vectors with an explicit working
//! directory; nothing here goes through a shell or touches the process-wide
//! current directory.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tracing::{debug, trace};

mod group;

use group::ProcessGroup;

/// Failure to run a tool at all, as opposed to the tool exiting non-zero
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("'{program}' was not found on PATH")]
    NotFound { program: String },

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("'{command}' did not finish within {}s", timeout.as_secs())]
    Timeout { command: String, timeout: Duration },
}

/// Captured result of a finished tool run
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit code, `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stdout followed by stderr, for diagnostics
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (true, true) => String::new(),
            (false, true) => self.stdout.trim_end().to_string(),
            (true, false) => self.stderr.trim_end().to_string(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end()),
        }
    }

    pub fn code_display(&self) -> String {
        self.code
            .map_or_else(|| "signal".to_string(), |code| code.to_string())
    }
}

/// An external command with a discrete argument vector and a timeout
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: String,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
    timeout: Duration,
}

impl ToolCommand {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run to completion, capturing stdout and stderr
    ///
    /// A non-zero exit is a successful run from this function's point of view;
    /// callers decide what the exit code means. The tool runs in its own
    /// process group. Once it exits, times out or the returned future is
    /// dropped, everything left in that group is killed, and on return no
    /// member of the group is still running.
    pub async fn run(&self) -> Result<ToolOutput, ToolError> {
        let mut command = tokio::process::Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        if let Some(dir) = &self.current_dir {
            // Otherwise a missing directory surfaces as a missing program
            if !dir.is_dir() {
                return Err(ToolError::Spawn {
                    program: self.program.clone(),
                    source: io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("working directory {} does not exist", dir.display()),
                    ),
                });
            }
            command.current_dir(dir);
        }

        debug!("Running: {}", self);
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                return Err(ToolError::NotFound {
                    program: self.program.clone(),
                });
            }
            Err(source) => {
                return Err(ToolError::Spawn {
                    program: self.program.clone(),
                    source,
                });
            }
        };
        let group = ProcessGroup::new(child.id());
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let collected = tokio::time::timeout(self.timeout, async {
            let (status, stdout, stderr) = tokio::join!(
                async {
                    let status = child.wait().await;
                    // Background children still hold the pipes open
                    group.kill();
                    status
                },
                read_pipe(stdout),
                read_pipe(stderr),
            );
            Ok::<_, io::Error>((status?, stdout?, stderr?))
        })
        .await;

        let (status, stdout, stderr) = match collected {
            Ok(Ok(collected)) => {
                group.reap().await;
                collected
            }
            Ok(Err(source)) => {
                stop(&mut child, group).await;
                return Err(ToolError::Spawn {
                    program: self.program.clone(),
                    source,
                });
            }
            Err(_) => {
                stop(&mut child, group).await;
                return Err(ToolError::Timeout {
                    command: self.to_string(),
                    timeout: self.timeout,
                });
            }
        };

        let result = ToolOutput {
            code: status.code(),
            stdout,
            stderr,
        };
        trace!("'{}' exited with {}", self.program, result.code_display());
        Ok(result)
    }
}

/// Kill the tool and everything it started, then wait for all of it
async fn stop(child: &mut Child, group: ProcessGroup) {
    group.kill();
    if let Err(e) = child.kill().await {
        trace!("Tool already exited: {}", e);
    }
    group.reap().await;
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        if let Some(dir) = &self.current_dir {
            write!(f, " (in {})", dir.display())?;
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_exit_code_and_output() {
        let output = ToolCommand::new("sh")
            .args(["-c", "echo out; echo err >&2; exit 3"])
            .run()
            .await
            .unwrap();

        assert_eq!(output.code, Some(3));
        assert!(!output.success());
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
        assert_eq!(output.combined(), "out\nerr");
    }

    #[tokio::test]
    async fn test_missing_binary_is_not_found() {
        let err = ToolCommand::new("depaudit-no-such-tool-xyz")
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let err = ToolCommand::new("sleep")
            .arg("5")
            .timeout(Duration::from_millis(100))
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_timeout_kills_background_children() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let script = format!("(sleep 1; touch '{}') & sleep 30", marker.display());

        let err = ToolCommand::new("sh")
            .args(["-c", &script])
            .timeout(Duration::from_millis(200))
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout { .. }));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists(), "background child outlived the timeout");
    }

    #[tokio::test]
    async fn test_exit_does_not_wait_for_background_children() {
        let started = std::time::Instant::now();
        let output = ToolCommand::new("sh")
            .args(["-c", "sleep 30 & echo done"])
            .timeout(Duration::from_secs(20))
            .run()
            .await
            .unwrap();

        assert!(output.success());
        assert_eq!(output.stdout.trim(), "done");
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_runs_in_given_directory() {
        let dir = tempfile::tempdir().unwrap();
        let output = ToolCommand::new("pwd")
            .current_dir(dir.path())
            .run()
            .await
            .unwrap();

        let reported = std::fs::canonicalize(output.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[test]
    fn test_display_shows_argument_vector() {
        let command = ToolCommand::new("fedpkg").arg("clone").arg("python-six");
        assert_eq!(command.to_string(), "fedpkg clone python-six");
    }
}
