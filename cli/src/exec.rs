//! Subprocess execution with timeout and cancellation.
//!
//! Every external program the provisioner touches goes through the
//! [`Executor`] trait so tests can substitute a scripted fake.
use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::cancel::CancelToken;
use crate::error::{Cancelled, ExecError};

/// How often a running child is polled for exit, timeout, and cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A program invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name or path.
    pub program: String,
    /// Arguments, not including the program.
    pub args: Vec<String>,
    /// Kill the child and report [`ExecError::Timeout`] after this long.
    pub timeout: Option<Duration>,
    /// Working directory for the child.
    pub cwd: Option<PathBuf>,
    /// Extra environment variables.
    pub env: Vec<(String, String)>,
    /// Inherit the parent's standard streams instead of capturing them.
    ///
    /// Only for installers that may prompt (the Homebrew bootstrap script).
    pub interactive: bool,
}

impl CommandSpec {
    /// Start a spec for `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set a deadline.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run the child in `dir`.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Add an environment variable.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Inherit standard streams.
    #[must_use]
    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Captured standard output; empty for interactive commands.
    pub stdout: String,
    /// Captured standard error; empty for interactive commands.
    pub stderr: String,
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
}

/// Runs external programs.
pub trait Executor: Send + Sync + fmt::Debug {
    /// Run `spec` to completion.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Failed`] on non-zero exit, [`ExecError::Timeout`]
    /// when the deadline passes, [`ExecError::Cancelled`] when `cancel` fires
    /// while the child is alive, and [`ExecError::Spawn`] when the program
    /// cannot be started.
    fn run(&self, spec: &CommandSpec, cancel: &CancelToken) -> Result<ExecResult, ExecError>;

    /// Resolve `program` on `PATH`.
    fn which(&self, program: &str) -> Option<PathBuf>;
}

/// [`Executor`] backed by real subprocesses.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run(&self, spec: &CommandSpec, cancel: &CancelToken) -> Result<ExecResult, ExecError> {
        cancel.check()?;
        let command_line = spec.to_string();
        tracing::debug!("exec: {command_line}");

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }
        if spec.interactive {
            cmd.stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());
        } else {
            cmd.stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());
        }

        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: spec.program.clone(),
            source,
        })?;
        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);
        let deadline = spec.timeout.map(|t| Instant::now() + t);

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(source) => {
                    kill(&mut child);
                    return Err(ExecError::Spawn {
                        program: spec.program.clone(),
                        source,
                    });
                }
            }
            // Reader threads are detached on these paths: a grandchild may
            // still hold the pipes open after the direct child is killed.
            if cancel.is_cancelled() {
                kill(&mut child);
                tracing::debug!("cancelled: {command_line}");
                return Err(Cancelled.into());
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                kill(&mut child);
                tracing::debug!("timed out: {command_line}");
                return Err(ExecError::Timeout {
                    command: command_line,
                });
            }
            cancel.wait_timeout(POLL_INTERVAL);
        };

        let result = ExecResult {
            stdout: join_reader(stdout),
            stderr: join_reader(stderr),
            code: status.code(),
        };
        if !result.stdout.trim().is_empty() {
            tracing::debug!("{}", result.stdout.trim_end());
        }
        if !result.stderr.trim().is_empty() {
            tracing::debug!("{}", result.stderr.trim_end());
        }

        if status.success() {
            return Ok(result);
        }
        let stderr = result.stderr.trim();
        let output = if stderr.is_empty() {
            result.stdout.trim()
        } else {
            stderr
        };
        Err(ExecError::Failed {
            command: command_line,
            code: result.code.unwrap_or(-1),
            output: output.to_string(),
        })
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut source: R) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        source.read_to_end(&mut buf).ok();
        buf
    })
}

fn join_reader(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

fn kill(child: &mut Child) {
    child.kill().ok();
    child.wait().ok();
}
