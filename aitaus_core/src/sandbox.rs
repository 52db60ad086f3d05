//! # Workspace Sandbox
//!
//! The owned, exclusively-locked sandbox state: one canonical workspace root
//! fixed at construction and one virtual working directory behind a mutex.
//! This is deliberately *not* a process-global (`OnceLock`-style) scope; the
//! caller constructs a `Sandbox` and owns it, and concurrent callers sharing
//! one instance are serialized across each whole navigate-or-execute
//! sequence so a command can never run in a directory its caller believes it
//! has already left.
//!
//! No caching, no retries: every call re-validates from scratch.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::config::SandboxConfig;
use crate::error::SandboxError;
use crate::executor::{
    CommandExecutor, CommandRequest, CommandResult, ProcessRunner, TokioProcessRunner,
};
use crate::navigator::NavigationOutcome;
use crate::path_resolver::PathResolver;

pub struct Sandbox {
    resolver: Arc<PathResolver>,
    executor: CommandExecutor,
    current_dir: Mutex<PathBuf>,
}

impl Sandbox {
    /// Build a sandbox over `config.workspace_root`, which must exist and be
    /// a directory. The root is canonicalized once here; the virtual working
    /// directory starts at the root.
    pub fn new(config: SandboxConfig) -> Result<Self, SandboxError> {
        Self::with_runner(config, Arc::new(TokioProcessRunner))
    }

    /// Same as [`Sandbox::new`] but with a caller-supplied process runner
    /// (fake runners in tests).
    pub fn with_runner(
        config: SandboxConfig,
        runner: Arc<dyn ProcessRunner>,
    ) -> Result<Self, SandboxError> {
        let root = std::fs::canonicalize(&config.workspace_root).map_err(|_| {
            SandboxError::WorkingDirectoryNotFound {
                path: config.workspace_root.display().to_string(),
            }
        })?;
        if !root.is_dir() {
            return Err(SandboxError::WorkingDirectoryNotADirectory {
                path: config.workspace_root.display().to_string(),
            });
        }

        let resolver = Arc::new(PathResolver::new(root.clone()));
        let executor = CommandExecutor::new(
            resolver.clone(),
            runner,
            &config.allowed_commands,
            Duration::from_secs(config.timeout_seconds),
            config.max_output_bytes,
        );

        tracing::info!("sandbox initialized with workspace root {:?}", root);

        Ok(Self {
            resolver,
            executor,
            current_dir: Mutex::new(root),
        })
    }

    pub fn workspace_root(&self) -> &Path {
        self.resolver.root()
    }

    /// Snapshot of the virtual working directory (absolute).
    pub async fn current_dir(&self) -> PathBuf {
        self.current_dir.lock().await.clone()
    }

    /// Execute one command request. The state lock is held for the whole
    /// validate-and-run sequence, including the process run itself.
    pub async fn execute_command(
        &self,
        req: &CommandRequest,
    ) -> Result<CommandResult, SandboxError> {
        let mut current = self.current_dir.lock().await;
        self.executor.execute(req, &mut current).await
    }

    /// The `cd`-equivalent operation.
    pub async fn change_directory(&self, path: &str) -> Result<NavigationOutcome, SandboxError> {
        let mut current = self.current_dir.lock().await;
        let args = if path.is_empty() {
            vec![]
        } else {
            vec![path.to_string()]
        };
        self.executor.navigator().navigate(&mut current, &args)
    }
}
