//! # Aitaus Core
//!
//! Aitaus (Finnish for fencing/enclosure) is a workspace-bounded command
//! execution sandbox for AI agents, served over the Model Context Protocol
//! (MCP).
//!
//! ## Core Mission
//!
//! An agent may request execution of an allow-listed shell command, but
//! neither the command's arguments, its working directory, nor a stateful
//! `cd`-style navigation can ever resolve to a filesystem location outside
//! the configured workspace root. The guarantee is logical path containment
//! plus argument pattern screening validated before anything is spawned;
//! this is not an OS-level sandbox (no namespaces, no seccomp).
//!
//! ## Architecture
//!
//! Four components, each depending only on the one below it:
//!
//! 1. [`path_resolver`] — pure path algebra: canonicalizes any path
//!    expression against the workspace root and rejects escapes.
//! 2. [`screener`] — blocklist screening of command arguments for shell
//!    metacharacters, substitution and variable expansion.
//! 3. [`navigator`] — the state machine over the virtual working directory;
//!    fail-closed, never mutates on rejection.
//! 4. [`executor`] — hard validation gates, then a spawn with restricted
//!    environment, bounded timeout and capped output capture, behind the
//!    `ProcessRunner` capability trait.
//!
//! [`sandbox::Sandbox`] owns the state and serializes navigate-and-execute
//! sequences behind a mutex; [`mcp_service::AitausMcpService`] exposes the
//! two operations (`execute_command`, `change_directory`) to MCP clients.

// Public modules
pub mod config;
pub mod error;
pub mod executor;
pub mod mcp_service;
pub mod navigator;
pub mod path_resolver;
pub mod sandbox;
pub mod screener;
pub mod shell;
pub mod utils;

// Re-export main types for easier use
pub use error::SandboxError;
pub use sandbox::Sandbox;

pub use mcp_service::AitausMcpService;
