//! # Sandbox Configuration
//!
//! Everything the sandbox consumes at construction time: workspace root,
//! optional explicit allowed-command list, per-call timeout, and the output
//! capture cap. Supplied by bootstrap code either directly, from a TOML
//! file, or from CLI flags (see `shell::run`); the sandbox itself reads no
//! environment and persists nothing.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

fn default_timeout_seconds() -> u64 {
    300
}

fn default_max_output_bytes() -> usize {
    256 * 1024
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SandboxConfig {
    /// Root directory outside of which no operation may ever resolve.
    pub workspace_root: PathBuf,
    /// Explicit allowed-command list. Empty means the built-in safe
    /// defaults (`executor::DEFAULT_ALLOWED_COMMANDS`).
    #[serde(default)]
    pub allowed_commands: Vec<String>,
    /// Per-call execution timeout in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Maximum captured bytes per output stream; excess is truncated.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

impl SandboxConfig {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self {
            workspace_root,
            allowed_commands: Vec::new(),
            timeout_seconds: default_timeout_seconds(),
            max_output_bytes: default_max_output_bytes(),
        }
    }

    /// Load from a TOML file.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: SandboxConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SandboxConfig::new(PathBuf::from("/ws"));
        assert!(config.allowed_commands.is_empty());
        assert_eq!(config.timeout_seconds, 300);
        assert_eq!(config.max_output_bytes, 256 * 1024);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: SandboxConfig = toml::from_str(r#"workspace_root = "/ws""#).unwrap();
        assert_eq!(config.workspace_root, PathBuf::from("/ws"));
        assert_eq!(config.timeout_seconds, 300);
    }

    #[test]
    fn test_parse_full_toml() {
        let config: SandboxConfig = toml::from_str(
            r#"
            workspace_root = "/ws"
            allowed_commands = ["ls", "cargo"]
            timeout_seconds = 30
            max_output_bytes = 4096
            "#,
        )
        .unwrap();
        assert_eq!(config.allowed_commands, vec!["ls", "cargo"]);
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.max_output_bytes, 4096);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<SandboxConfig, _> =
            toml::from_str(r#"workspace_root = "/ws"
wat = true"#);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("aitaus.toml");
        std::fs::write(&path, r#"workspace_root = "/ws""#).unwrap();

        let config = SandboxConfig::load(&path).await.unwrap();
        assert_eq!(config.workspace_root, PathBuf::from("/ws"));
        assert!(SandboxConfig::load(&temp.path().join("missing.toml"))
            .await
            .is_err());
    }
}
