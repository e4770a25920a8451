//! CLI smoke tests for the savvy-server binary.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use tempfile::TempDir;
use tokio::time::timeout;

fn run_savvy_server(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_savvy-server"))
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute savvy-server")
}

/// Config with `home_dir` pinned to `home` so logs and the database stay in the temp dir.
fn write_config(dir: &Path, name: &str, modules: &str) -> String {
    let home = dir.to_string_lossy().replace('\\', "/");
    let content = format!(
        r#"
server:
  home_dir: "{home}"
  host: "127.0.0.1"
  port: 0

database:
  url: "sqlite://database/test.db"

logging:
  default:
    console_level: info
    file: "logs/survey_savvy.log"
    file_level: info
    max_backups: 3
    max_size_mb: 10

modules:
{modules}
"#
    );
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write config file");
    path.to_string_lossy().to_string()
}

const VALID_MODULES: &str = r#"
  survey_savvy:
    auth:
      token_secret: "smoke-test-secret"
    payments:
      secret_key: "sk_test_smoke"
"#;

#[test]
fn test_cli_help_command() {
    let output = run_savvy_server(&["--help"]);
    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("savvy-server"), "Should contain binary name");
    assert!(stdout.contains("Usage:"), "Should contain usage information");
    assert!(stdout.contains("run"), "Should contain 'run' subcommand");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
    assert!(stdout.contains("--config"), "Should mention config option");
    assert!(stdout.contains("--mock"), "Should mention mock option");
}

#[test]
fn test_cli_version_command() {
    let output = run_savvy_server(&["--version"]);
    assert!(output.status.success(), "Version command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("savvy-server"));
    assert!(stdout.contains("0.1.0"));
}

#[test]
fn test_cli_invalid_command() {
    let output = run_savvy_server(&["invalid-command"]);
    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "Should report the bad command: {stderr}");
}

#[test]
fn test_cli_config_validation_missing_file() {
    let output = run_savvy_server(&["--config", "/nonexistent/config.yaml", "check"]);
    assert!(!output.status.success(), "Should fail with missing config");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Configuration file not found"),
        "Should mention config file issue: {stderr}"
    );
}

#[test]
fn test_cli_config_flag_short_form() {
    let output = run_savvy_server(&["-c", "/nonexistent/config.yaml", "check"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not found"), "{stderr}");
}

#[test]
fn test_cli_config_validation_invalid_yaml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("invalid.yaml");
    std::fs::write(&config_path, "invalid: yaml: content: [unclosed")
        .expect("Failed to write file");

    let output = run_savvy_server(&["--config", config_path.to_str().unwrap(), "check"]);
    assert!(!output.status.success(), "Should fail with invalid YAML");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("config") || stderr.contains("yaml"),
        "Should mention config parsing issue: {stderr}"
    );
}

#[test]
fn test_cli_config_validation_valid_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "valid.yaml", VALID_MODULES);

    let output = run_savvy_server(&["--config", &config_path, "check"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(
        output.status.success(),
        "Should succeed with valid config\nSTDOUT: {stdout}\nSTDERR: {stderr}"
    );
    assert!(stdout.contains("Configuration check passed"), "{stdout}");
}

#[test]
fn test_cli_check_requires_token_secret() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let modules = r#"
  survey_savvy:
    payments:
      secret_key: "sk_test_smoke"
"#;
    let config_path = write_config(temp_dir.path(), "no-secret.yaml", modules);

    let output = run_savvy_server(&["--config", &config_path, "check"]);
    assert!(!output.status.success(), "Should fail without a token secret");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("token_secret"), "{stderr}");
}

#[test]
fn test_cli_check_rejects_unknown_module_keys() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let modules = r#"
  api_ingress:
    no_such_option: true
"#;
    let config_path = write_config(temp_dir.path(), "unknown-key.yaml", modules);

    let output = run_savvy_server(&["--config", &config_path, "check"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("api_ingress"), "{stderr}");
}

#[test]
fn test_cli_print_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "print.yaml", VALID_MODULES);

    let output = run_savvy_server(&["--config", &config_path, "--port", "5123", "--print-config"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("port: 5123"), "CLI port should win: {stdout}");
}

#[tokio::test]
async fn test_cli_run_command_with_mock_database() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "run.yaml", VALID_MODULES);

    let mut cmd = tokio::process::Command::new(env!("CARGO_BIN_EXE_savvy-server"));
    cmd.args(["--config", &config_path, "--mock", "run"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // A running server never exits on its own; hitting the timeout means startup succeeded.
    match timeout(Duration::from_secs(5), cmd.output()).await {
        Err(_elapsed) => {}
        Ok(result) => {
            let output = result.expect("Failed to execute savvy-server");
            panic!(
                "Server exited early\nSTDOUT: {}\nSTDERR: {}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
    }
}

#[test]
fn test_cli_run_fails_without_token_secret() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "run-no-secret.yaml", "  {}");

    let output = run_savvy_server(&["--config", &config_path, "--mock", "run"]);
    assert!(!output.status.success());
}
