//! # Sandbox Error Taxonomy
//!
//! Every way a request can be rejected or fail, as a single `thiserror` enum.
//! Validation-stage variants are produced *before* any process is spawned and
//! never leave partially mutated sandbox state behind. Spawn-stage failures
//! (the process could not start) are distinct from "the process ran and exited
//! non-zero", which is never an error of this crate.
//!
//! Messages name the offending input so an agent can correct itself, but they
//! never echo resolved workspace-external paths back to the caller.

use std::time::Duration;

/// Errors produced by the workspace sandbox.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("empty command")]
    EmptyCommand,

    #[error("command '{command}' is not in the allowed command list")]
    CommandNotAllowed { command: String },

    #[error("argument '{argument}' contains a dangerous pattern: {reason}")]
    DangerousArgumentPattern {
        argument: String,
        reason: &'static str,
    },

    #[error("argument '{argument}' contains a parent-directory traversal")]
    PathTraversalDetected { argument: String },

    #[error("path '{input}' resolves outside the workspace root")]
    OutsideWorkspaceBoundary { input: String },

    #[error("working directory '{path}' does not exist")]
    WorkingDirectoryNotFound { path: String },

    #[error("'{path}' is not a directory")]
    WorkingDirectoryNotADirectory { path: String },

    #[error("invalid navigation request: {message}")]
    InvalidNavigation { message: String },

    #[error("command timed out after {timeout:?}")]
    ExecutionTimeout { timeout: Duration },

    #[error("failed to spawn '{command}': {source}")]
    SpawnFailure {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl SandboxError {
    /// True for rejections raised before any process was spawned.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            SandboxError::ExecutionTimeout { .. } | SandboxError::SpawnFailure { .. }
        )
    }

    /// Get error category for programmatic handling.
    pub fn category(&self) -> &'static str {
        match self {
            SandboxError::EmptyCommand
            | SandboxError::CommandNotAllowed { .. }
            | SandboxError::InvalidNavigation { .. } => "COMMAND",
            SandboxError::DangerousArgumentPattern { .. }
            | SandboxError::PathTraversalDetected { .. } => "ARGUMENT",
            SandboxError::OutsideWorkspaceBoundary { .. }
            | SandboxError::WorkingDirectoryNotFound { .. }
            | SandboxError::WorkingDirectoryNotADirectory { .. } => "PATH",
            SandboxError::ExecutionTimeout { .. } => "TIMEOUT",
            SandboxError::SpawnFailure { .. } => "SPAWN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_flagged() {
        assert!(SandboxError::EmptyCommand.is_validation());
        assert!(
            SandboxError::CommandNotAllowed {
                command: "rm".to_string()
            }
            .is_validation()
        );
        assert!(
            !SandboxError::ExecutionTimeout {
                timeout: Duration::from_secs(5)
            }
            .is_validation()
        );
        assert!(
            !SandboxError::SpawnFailure {
                command: "ls".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            }
            .is_validation()
        );
    }

    #[test]
    fn test_message_names_offending_input() {
        let err = SandboxError::OutsideWorkspaceBoundary {
            input: "~/../../etc".to_string(),
        };
        assert!(format!("{err}").contains("~/../../etc"));

        let err = SandboxError::DangerousArgumentPattern {
            argument: "$HOME".to_string(),
            reason: "environment variable expansion",
        };
        let msg = format!("{err}");
        assert!(msg.contains("$HOME"));
        assert!(msg.contains("environment variable expansion"));
    }

    #[test]
    fn test_categories() {
        assert_eq!(SandboxError::EmptyCommand.category(), "COMMAND");
        assert_eq!(
            SandboxError::PathTraversalDetected {
                argument: "../x".to_string()
            }
            .category(),
            "ARGUMENT"
        );
        assert_eq!(
            SandboxError::OutsideWorkspaceBoundary {
                input: "/etc".to_string()
            }
            .category(),
            "PATH"
        );
    }
}
