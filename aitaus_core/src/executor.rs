//! # Command Executor
//!
//! The gatekeeper in front of the host's process facility. Every request
//! passes a fixed sequence of hard gates (non-empty, allow-listed, working
//! directory contained, arguments screened) before anything is spawned, and
//! the spawn itself goes through a restricted environment, a bounded timeout,
//! and size-capped output capture.
//!
//! Spawning is abstracted behind the [`ProcessRunner`] trait so the gate
//! logic can be tested against a fake runner without touching the real OS.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::SandboxError;
use crate::navigator::DirectoryNavigator;
use crate::path_resolver::PathResolver;
use crate::screener;

/// The navigation command, dispatched to the navigator instead of spawning.
pub const NAVIGATION_COMMAND: &str = "cd";

/// Built-in safe defaults, used when no explicit allow-list is configured.
/// Read-only inspection commands only; nothing here mutates or deletes.
pub const DEFAULT_ALLOWED_COMMANDS: &[&str] = &[
    "basename", "cat", "cd", "cut", "date", "diff", "dirname", "du", "echo", "file", "find",
    "grep", "head", "ls", "pwd", "sort", "stat", "tail", "tr", "uniq", "wc", "which",
];

/// Environment variables propagated into spawned processes. Everything else
/// from the parent environment is dropped so secrets cannot leak through and
/// variable expansion has nothing upstream to draw on.
pub const RESTRICTED_ENV: &[&str] = &["PATH", "LANG", "LC_ALL", "LC_CTYPE", "TERM"];

/// Synthetic exit code reported when the timeout bound fires (mirrors
/// coreutils `timeout`).
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// A single command execution request from the caller.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CommandRequest {
    /// Command name, e.g. `ls`. Must be on the allowed-command list.
    pub command: String,
    /// Arguments passed verbatim to the command after screening.
    #[serde(default)]
    pub arguments: Vec<String>,
    /// Optional working directory for this call, resolved against the
    /// current virtual directory. Defaults to the current virtual directory.
    #[serde(default)]
    pub work_dir: Option<String>,
}

/// Outcome of an executed (or timed-out) command. `error` distinguishes
/// component-level conditions from the command's own non-zero exit, which is
/// reported as a perfectly normal result.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    /// Working directory the command ran in, workspace-relative.
    pub work_dir: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Fully validated spawn parameters handed to a [`ProcessRunner`].
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub timeout: Duration,
    pub max_output_bytes: usize,
}

/// Raw output from a runner. `timed_out` marks the synthetic-exit case.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub timed_out: bool,
}

/// Capability interface over "spawn with restricted environment and bounded
/// timeout". Production uses [`TokioProcessRunner`]; tests substitute fakes.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, spec: ProcessSpec) -> Result<ProcessOutput, SandboxError>;
}

/// Spawns real processes via `tokio::process`.
#[derive(Debug, Default)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, spec: ProcessSpec) -> Result<ProcessOutput, SandboxError> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .current_dir(&spec.working_dir)
            .env_clear()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for var in RESTRICTED_ENV {
            if let Ok(value) = std::env::var(var) {
                cmd.env(var, value);
            }
        }

        let mut child = cmd.spawn().map_err(|e| SandboxError::SpawnFailure {
            command: spec.program.clone(),
            source: e,
        })?;

        let stdout = child.stdout.take().ok_or_else(|| SandboxError::SpawnFailure {
            command: spec.program.clone(),
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "failed to get stdout"),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| SandboxError::SpawnFailure {
            command: spec.program.clone(),
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "failed to get stderr"),
        })?;

        let cap = spec.max_output_bytes;
        let bounded_wait = async {
            let (out, err, status) = tokio::join!(
                read_capped(stdout, cap),
                read_capped(stderr, cap),
                child.wait()
            );
            (out, err, status)
        };

        match timeout(spec.timeout, bounded_wait).await {
            Ok((out, err, status)) => {
                let (out_bytes, out_truncated) = out.map_err(|e| SandboxError::SpawnFailure {
                    command: spec.program.clone(),
                    source: e,
                })?;
                let (err_bytes, err_truncated) = err.map_err(|e| SandboxError::SpawnFailure {
                    command: spec.program.clone(),
                    source: e,
                })?;
                let status = status.map_err(|e| SandboxError::SpawnFailure {
                    command: spec.program.clone(),
                    source: e,
                })?;

                Ok(ProcessOutput {
                    stdout: finish_capture(out_bytes, out_truncated),
                    stderr: finish_capture(err_bytes, err_truncated),
                    exit_code: status.code().unwrap_or(-1),
                    timed_out: false,
                })
            }
            Err(_) => {
                // The capture future is gone; make sure the child is too.
                let _ = child.start_kill();
                let _ = child.wait().await;
                tracing::warn!(
                    "command '{}' exceeded timeout of {:?}, killed",
                    spec.program,
                    spec.timeout
                );
                Ok(ProcessOutput {
                    stdout: String::new(),
                    stderr: String::new(),
                    exit_code: TIMEOUT_EXIT_CODE,
                    timed_out: true,
                })
            }
        }
    }
}

/// Read a stream keeping at most `cap` bytes. Excess is drained and
/// discarded so the child never blocks on a full pipe, but memory stays
/// bounded.
async fn read_capped<R: tokio::io::AsyncRead + Unpin>(
    mut reader: R,
    cap: usize,
) -> std::io::Result<(Vec<u8>, bool)> {
    let mut buf = Vec::with_capacity(cap.min(64 * 1024));
    let mut chunk = [0u8; 8192];
    let mut truncated = false;

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        if buf.len() < cap {
            let take = n.min(cap - buf.len());
            buf.extend_from_slice(&chunk[..take]);
            if take < n {
                truncated = true;
            }
        } else {
            truncated = true;
        }
    }

    Ok((buf, truncated))
}

fn finish_capture(bytes: Vec<u8>, truncated: bool) -> String {
    let mut text = String::from_utf8_lossy(&bytes).into_owned();
    if truncated {
        text.push_str("\n[output truncated]");
    }
    text
}

/// Validates requests and delegates spawning to a [`ProcessRunner`].
pub struct CommandExecutor {
    resolver: Arc<PathResolver>,
    navigator: DirectoryNavigator,
    runner: Arc<dyn ProcessRunner>,
    allowed: HashSet<String>,
    timeout: Duration,
    max_output_bytes: usize,
}

impl CommandExecutor {
    pub fn new(
        resolver: Arc<PathResolver>,
        runner: Arc<dyn ProcessRunner>,
        allowed_commands: &[String],
        timeout: Duration,
        max_output_bytes: usize,
    ) -> Self {
        // Empty configured set falls back to the built-in safe defaults.
        let allowed: HashSet<String> = if allowed_commands.is_empty() {
            DEFAULT_ALLOWED_COMMANDS
                .iter()
                .map(|s| s.to_string())
                .collect()
        } else {
            allowed_commands.iter().cloned().collect()
        };

        Self {
            navigator: DirectoryNavigator::new(resolver.clone()),
            resolver,
            runner,
            allowed,
            timeout,
            max_output_bytes,
        }
    }

    pub fn navigator(&self) -> &DirectoryNavigator {
        &self.navigator
    }

    /// Run one request. `current` is the caller-owned virtual working
    /// directory; it is only mutated by a successful `cd`.
    ///
    /// Gate order is fixed: empty check, allow-list, working-directory
    /// resolution, `cd` dispatch, argument screening, directory re-check.
    /// Every rejection fires before any process exists.
    pub async fn execute(
        &self,
        req: &CommandRequest,
        current: &mut PathBuf,
    ) -> Result<CommandResult, SandboxError> {
        let command = req.command.trim();
        if command.is_empty() {
            return Err(SandboxError::EmptyCommand);
        }

        if !self.allowed.contains(command) {
            return Err(SandboxError::CommandNotAllowed {
                command: command.to_string(),
            });
        }

        let work_dir = match req.work_dir.as_deref() {
            Some(wd) => self.resolver.resolve(current, wd)?,
            None => current.clone(),
        };

        if command == NAVIGATION_COMMAND {
            let outcome = self.navigator.navigate(current, &req.arguments)?;
            return Ok(CommandResult {
                stdout: outcome.new_work_dir.clone(),
                stderr: String::new(),
                exit_code: 0,
                work_dir: outcome.new_work_dir,
                error: None,
            });
        }

        screener::screen_all(&req.arguments)?;

        // Absolute-path arguments must themselves be inside the workspace:
        // this is what separates "safe to pass to cat" from /etc/passwd.
        for arg in &req.arguments {
            if arg.starts_with('/') {
                self.resolver.resolve(&work_dir, arg)?;
            }
        }

        self.check_working_dir(&work_dir)?;

        tracing::info!(
            "executing '{}' with {} argument(s) in {}",
            command,
            req.arguments.len(),
            self.resolver.display_relative(&work_dir)
        );

        let spec = ProcessSpec {
            program: command.to_string(),
            args: req.arguments.clone(),
            working_dir: work_dir.clone(),
            timeout: self.timeout,
            max_output_bytes: self.max_output_bytes,
        };

        let output = self.runner.run(spec).await?;
        let error = output.timed_out.then(|| {
            SandboxError::ExecutionTimeout {
                timeout: self.timeout,
            }
            .to_string()
        });

        Ok(CommandResult {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.exit_code,
            work_dir: self.resolver.display_relative(&work_dir),
            error,
        })
    }

    /// Defense-in-depth re-check of the working directory right before the
    /// spawn, even though it was produced by the resolver.
    fn check_working_dir(&self, work_dir: &Path) -> Result<(), SandboxError> {
        if !self.resolver.is_contained(work_dir) {
            return Err(SandboxError::OutsideWorkspaceBoundary {
                input: self.resolver.display_relative(work_dir),
            });
        }

        match std::fs::metadata(work_dir) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(SandboxError::WorkingDirectoryNotADirectory {
                path: self.resolver.display_relative(work_dir),
            }),
            Err(_) => Err(SandboxError::WorkingDirectoryNotFound {
                path: self.resolver.display_relative(work_dir),
            }),
        }
    }
}
