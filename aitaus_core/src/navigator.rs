//! # Directory Navigator
//!
//! The only component allowed to move the sandbox's virtual working
//! directory. A transition either fully succeeds (resolved, contained,
//! exists, is a directory) or leaves the state bit-for-bit unchanged.
//!
//! The navigator holds no state of its own; the caller owns the current
//! directory and hands it in mutably, which keeps the locking discipline in
//! one place (the sandbox).

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::error::SandboxError;
use crate::path_resolver::PathResolver;

/// Result of a successful `cd`, directories rendered workspace-relative.
#[derive(Debug, Clone, Serialize)]
pub struct NavigationOutcome {
    pub new_work_dir: String,
    pub old_work_dir: String,
}

#[derive(Debug, Clone)]
pub struct DirectoryNavigator {
    resolver: Arc<PathResolver>,
}

impl DirectoryNavigator {
    pub fn new(resolver: Arc<PathResolver>) -> Self {
        Self { resolver }
    }

    /// Apply a `cd` transition to `current`.
    ///
    /// Zero arguments means "go to the workspace root" (same as `~`). More
    /// than one argument is a syntax error. Any rejection leaves `current`
    /// untouched.
    pub fn navigate(
        &self,
        current: &mut PathBuf,
        args: &[String],
    ) -> Result<NavigationOutcome, SandboxError> {
        let target = match args {
            [] => "~",
            [one] => one.as_str(),
            _ => {
                return Err(SandboxError::InvalidNavigation {
                    message: format!("expected at most one argument, got {}", args.len()),
                });
            }
        };

        let candidate = self.resolver.resolve(current, target)?;

        // Existence is checked here, not in the resolver, so "not found" and
        // "outside workspace" stay distinguishable.
        match std::fs::metadata(&candidate) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(SandboxError::WorkingDirectoryNotADirectory {
                    path: self.resolver.display_relative(&candidate),
                });
            }
            Err(_) => {
                return Err(SandboxError::WorkingDirectoryNotFound {
                    path: self.resolver.display_relative(&candidate),
                });
            }
        }

        let old = std::mem::replace(current, candidate);
        tracing::debug!(
            "navigated from {:?} to {:?}",
            self.resolver.display_relative(&old),
            self.resolver.display_relative(current)
        );

        Ok(NavigationOutcome {
            new_work_dir: self.resolver.display_relative(current),
            old_work_dir: self.resolver.display_relative(&old),
        })
    }
}
