//! # Path Resolver & Workspace Validator
//!
//! Pure path algebra against a fixed workspace root. Every path expression an
//! agent can produce (relative, absolute, `.`, `..`, `~`, `~/sub`) is reduced
//! to a canonical absolute path and rejected unless it lands inside the root.
//!
//! This module deliberately performs **no filesystem access**: components may
//! name directories that do not exist yet, and "does not exist" must remain
//! distinguishable from "outside the workspace". Existence is checked later by
//! the navigator and executor.
//!
//! Within the sandbox, `~` means the workspace root rather than the user's
//! home directory. There is no escape hatch to `$HOME`.

use std::path::{Component, Path, PathBuf};

use crate::error::SandboxError;

/// Resolves and contains path expressions relative to one canonical root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// `root` must already be an absolute, canonical directory path. The
    /// sandbox canonicalizes it once at construction; the resolver never
    /// touches the filesystem afterwards.
    pub fn new(root: PathBuf) -> Self {
        debug_assert!(root.is_absolute());
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `target` against `base` and verify workspace containment.
    ///
    /// Accepted forms: empty / `.` (stays at `base`), `..` (parent of
    /// `base`), `~` (the root itself), `~/rest` (root-relative), any other
    /// relative path (base-relative), and absolute paths. An absolute target
    /// is not rejected outright; it passes exactly when its cleaned form is
    /// equal to or a descendant of the root.
    ///
    /// Idempotent: resolving a path and resolving its lexically cleaned form
    /// produce the same result.
    pub fn resolve(&self, base: &Path, target: &str) -> Result<PathBuf, SandboxError> {
        let joined = match target {
            "" | "." => base.to_path_buf(),
            "~" => self.root.clone(),
            _ => {
                if let Some(rest) = target.strip_prefix("~/") {
                    self.root.join(rest)
                } else if Path::new(target).is_absolute() {
                    PathBuf::from(target)
                } else {
                    base.join(target)
                }
            }
        };

        let candidate = normalize_lexically(&joined);

        if candidate.starts_with(&self.root) {
            Ok(candidate)
        } else {
            Err(SandboxError::OutsideWorkspaceBoundary {
                input: target.to_string(),
            })
        }
    }

    /// Containment check for paths that were produced elsewhere (executor
    /// defense-in-depth re-check). Component-wise, so `/ws2` is not treated
    /// as being inside `/ws`.
    pub fn is_contained(&self, path: &Path) -> bool {
        normalize_lexically(path).starts_with(&self.root)
    }

    /// Render an in-workspace path relative to the root for caller
    /// readability: the root itself becomes `~`, descendants `~/rel`.
    pub fn display_relative(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(rel) if rel.as_os_str().is_empty() => "~".to_string(),
            Ok(rel) => format!("~/{}", rel.display()),
            Err(_) => path.display().to_string(),
        }
    }
}

/// Lexically clean a path: drop `.` segments, fold `..` into the preceding
/// normal component, clamp `..` at the filesystem root, and normalize doubled
/// slashes and trailing slashes. No filesystem access.
///
/// For relative inputs, leading `..` segments are preserved rather than
/// silently dropped, so cleaning alone never hides a traversal.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut stack: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match stack.last() {
                Some(Component::Normal(_)) => {
                    stack.pop();
                }
                // ".." at the filesystem root stays at the root
                Some(Component::RootDir) => {}
                _ => stack.push(component),
            },
            c => stack.push(c),
        }
    }

    stack.iter().collect()
}
