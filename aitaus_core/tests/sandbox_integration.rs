//! End-to-end sandbox tests against real processes.

use std::sync::Arc;
use std::time::Duration;

use aitaus_core::config::SandboxConfig;
use aitaus_core::error::SandboxError;
use aitaus_core::executor::{CommandRequest, TIMEOUT_EXIT_CODE};
use aitaus_core::sandbox::Sandbox;
use tempfile::TempDir;

fn workspace() -> (TempDir, Sandbox) {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("docs")).unwrap();
    std::fs::write(temp.path().join("docs/guide.md"), "# guide\n").unwrap();

    let config = SandboxConfig::new(temp.path().to_path_buf());
    let sandbox = Sandbox::new(config).unwrap();
    (temp, sandbox)
}

fn request(command: &str, arguments: &[&str]) -> CommandRequest {
    CommandRequest {
        command: command.to_string(),
        arguments: arguments.iter().map(|s| s.to_string()).collect(),
        work_dir: None,
    }
}

#[tokio::test]
async fn ls_inside_workspace_succeeds() {
    let (_temp, sandbox) = workspace();
    let docs = sandbox.workspace_root().join("docs").display().to_string();

    let result = sandbox
        .execute_command(&request("ls", &["-la", &docs]))
        .await
        .unwrap();
    assert_eq!(result.exit_code, 0);
    assert!(result.stdout.contains("guide.md"));
    assert!(result.error.is_none());
}

#[tokio::test]
async fn cat_etc_passwd_is_rejected() {
    let (_temp, sandbox) = workspace();

    let err = sandbox
        .execute_command(&request("cat", &["/etc/passwd"]))
        .await
        .unwrap_err();
    assert!(matches!(err, SandboxError::OutsideWorkspaceBoundary { .. }));
}

#[tokio::test]
async fn tilde_escape_rejected_and_state_unchanged() {
    let (_temp, sandbox) = workspace();
    let before = sandbox.current_dir().await;

    let err = sandbox.change_directory("~/../../etc").await.unwrap_err();
    assert!(matches!(err, SandboxError::OutsideWorkspaceBoundary { .. }));
    assert_eq!(sandbox.current_dir().await, before);
}

#[tokio::test]
async fn navigation_round_trip_returns_to_root() {
    let (_temp, sandbox) = workspace();

    sandbox.change_directory("docs").await.unwrap();
    let outcome = sandbox.change_directory("..").await.unwrap();
    assert_eq!(outcome.new_work_dir, "~");
    assert_eq!(outcome.old_work_dir, "~/docs");
    assert_eq!(sandbox.current_dir().await, sandbox.workspace_root());
}

#[tokio::test]
async fn env_expansion_rejected_before_spawn() {
    let (_temp, sandbox) = workspace();

    let err = sandbox
        .execute_command(&request("echo", &["$HOME"]))
        .await
        .unwrap_err();
    assert!(matches!(err, SandboxError::DangerousArgumentPattern { .. }));
}

#[tokio::test]
async fn rm_is_absent_from_default_allowlist() {
    let (_temp, sandbox) = workspace();

    let err = sandbox
        .execute_command(&request("rm", &["-rf", "."]))
        .await
        .unwrap_err();
    assert!(matches!(err, SandboxError::CommandNotAllowed { .. }));
}

#[tokio::test]
async fn cd_through_execute_surface() {
    let (_temp, sandbox) = workspace();

    let result = sandbox
        .execute_command(&request("cd", &["docs"]))
        .await
        .unwrap();
    assert_eq!(result.exit_code, 0);
    assert_eq!(result.work_dir, "~/docs");

    // Subsequent commands run in the new virtual directory.
    let result = sandbox.execute_command(&request("ls", &[])).await.unwrap();
    assert_eq!(result.work_dir, "~/docs");
    assert!(result.stdout.contains("guide.md"));
}

#[tokio::test]
async fn nonzero_exit_is_a_normal_result() {
    let (_temp, sandbox) = workspace();

    let result = sandbox
        .execute_command(&request("cat", &["missing-file.txt"]))
        .await
        .unwrap();
    assert_ne!(result.exit_code, 0);
    assert!(result.error.is_none());
    assert!(!result.stderr.is_empty());
}

#[tokio::test]
async fn timeout_kills_and_reports_synthetic_exit() {
    let temp = TempDir::new().unwrap();
    let mut config = SandboxConfig::new(temp.path().to_path_buf());
    config.allowed_commands = vec!["sleep".to_string()];
    config.timeout_seconds = 1;
    let sandbox = Sandbox::new(config).unwrap();

    let start = std::time::Instant::now();
    let result = sandbox
        .execute_command(&request("sleep", &["30"]))
        .await
        .unwrap();
    assert_eq!(result.exit_code, TIMEOUT_EXIT_CODE);
    assert!(result.error.unwrap().contains("timed out"));
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn output_capture_is_bounded() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("big.txt"), "x".repeat(64 * 1024)).unwrap();
    let mut config = SandboxConfig::new(temp.path().to_path_buf());
    config.max_output_bytes = 1024;
    let sandbox = Sandbox::new(config).unwrap();

    let result = sandbox
        .execute_command(&request("cat", &["big.txt"]))
        .await
        .unwrap();
    assert_eq!(result.exit_code, 0);
    assert!(result.stdout.contains("[output truncated]"));
    assert!(result.stdout.len() < 2048);
}

#[tokio::test]
async fn concurrent_callers_are_serialized() {
    let (_temp, sandbox) = workspace();
    let sandbox = Arc::new(sandbox);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let sandbox = sandbox.clone();
        handles.push(tokio::spawn(async move {
            // Root-anchored target: safe under any interleaving.
            sandbox.change_directory("~/docs").await.unwrap();
            let result = sandbox
                .execute_command(&request("pwd", &[]))
                .await
                .unwrap();
            sandbox.change_directory("~").await.unwrap();
            result
        }));
    }

    for handle in handles {
        let result = handle.await.unwrap();
        // The directory a command reports is the one it actually ran in.
        assert_eq!(result.exit_code, 0);
    }
    assert_eq!(sandbox.current_dir().await, sandbox.workspace_root());
}
