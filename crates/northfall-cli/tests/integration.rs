#![allow(deprecated)]
use assert_cmd::Command;
use northfall_core::config::{Config, ExecutorConfig};
use northfall_core::grammar::FORGING_RESPONSE;
use northfall_core::job::BackendCommand;
use predicates::prelude::*;
use std::collections::BTreeMap;
use tempfile::TempDir;

fn winter(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("winter").unwrap();
    cmd.current_dir(dir.path())
        .env("NORTHFALL_ROOT", dir.path())
        .env_remove("RUST_LOG");
    cmd
}

fn init_project(dir: &TempDir) {
    winter(dir)
        .args(["init", "--user-id", "user-1", "--contract-id", "contract-1"])
        .assert()
        .success();
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

// ---------------------------------------------------------------------------
// winter init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_config() {
    let dir = TempDir::new().unwrap();
    winter(&dir)
        .args(["init", "--contract-name", "escrow"])
        .assert()
        .success()
        .stdout(predicate::str::contains("created: .northfall/config.yaml"));

    let config = Config::load(dir.path()).unwrap();
    assert_eq!(config.contract.name, "escrow");
    assert!(!config.identity.user_id.is_empty());
    assert!(!config.contract.id.is_empty());
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    winter(&dir)
        .args(["init", "--user-id", "someone-else"])
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:"));

    let config = Config::load(dir.path()).unwrap();
    assert_eq!(config.identity.user_id, "user-1");
}

// ---------------------------------------------------------------------------
// winter exec
// ---------------------------------------------------------------------------

#[test]
fn exec_requires_init() {
    let dir = TempDir::new().unwrap();
    winter(&dir)
        .args(["exec", "clear"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("winter init"));
}

#[test]
fn exec_help_prints_command_list() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    winter(&dir)
        .args(["exec", "--", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$ --help"))
        .stdout(predicate::str::contains("WINTER COMMANDS:"));
}

#[test]
fn exec_unknown_input_reports_not_found() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    winter(&dir)
        .args(["exec", "ls -la"])
        .assert()
        .success()
        .stdout(predicate::str::contains("! ls -la"))
        .stdout(predicate::str::contains(
            "! northfall: command not found: ls -la. Try --help",
        ));
}

#[test]
fn exec_clear_empties_the_log() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    winter(&dir)
        .args(["exec", "--", "--platform", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn exec_json_lists_tagged_lines() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let output = winter(&dir)
        .args(["--json", "exec", "winter build", "   "])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    let lines = json.as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["type"], "command");
    assert_eq!(lines[0]["text"], "winter build");
    assert_eq!(lines[1]["type"], "client");
    assert_eq!(lines[1]["text"], FORGING_RESPONSE);
}

#[test]
fn exec_wait_times_out_without_server() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::new("user-1", "contract-1", "escrow");
    config.server.url = "ws://127.0.0.1:1/api/jobs/ws".to_string();
    config.save(dir.path()).unwrap();

    winter(&dir)
        .args(["exec", "--wait", "--timeout", "1", "winter test"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(FORGING_RESPONSE))
        .stderr(predicate::str::contains("timed out"));
}

#[test]
fn exec_wait_streams_job_output() {
    let dir = TempDir::new().unwrap();
    let rt = tokio::runtime::Runtime::new().unwrap();
    let listener = rt
        .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
        .unwrap();
    let port = listener.local_addr().unwrap().port();
    let executor = ExecutorConfig {
        jobs: BTreeMap::from([(
            BackendCommand::Build,
            vec!["echo".to_string(), "program compiled".to_string()],
        )]),
        max_retries: 0,
    };
    rt.spawn(northfall_server::serve_on(
        dir.path().to_path_buf(),
        listener,
        executor,
    ));

    let mut config = Config::new("user-1", "contract-1", "escrow");
    config.server.url = format!("ws://127.0.0.1:{port}/api/jobs/ws");
    config.save(dir.path()).unwrap();

    winter(&dir)
        .args(["exec", "--wait", "--timeout", "20", "winter build"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$ winter build"))
        .stdout(predicate::str::contains("NORTHFALL_BUILD started"))
        .stdout(predicate::str::contains("program compiled"))
        .stdout(predicate::str::contains("exit code 0"));
}

#[test]
fn exec_wait_runs_action_lines_one_after_another() {
    let dir = TempDir::new().unwrap();
    let rt = tokio::runtime::Runtime::new().unwrap();
    let listener = rt
        .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
        .unwrap();
    let port = listener.local_addr().unwrap().port();
    let executor = ExecutorConfig {
        jobs: BTreeMap::from([
            (
                BackendCommand::Build,
                vec![
                    "sh".to_string(),
                    "-c".to_string(),
                    "sleep 1; echo built".to_string(),
                ],
            ),
            (
                BackendCommand::Test,
                vec!["echo".to_string(), "tested".to_string()],
            ),
        ]),
        max_retries: 0,
    };
    rt.spawn(northfall_server::serve_on(
        dir.path().to_path_buf(),
        listener,
        executor,
    ));

    let mut config = Config::new("user-1", "contract-1", "escrow");
    config.server.url = format!("ws://127.0.0.1:{port}/api/jobs/ws");
    config.save(dir.path()).unwrap();

    let output = winter(&dir)
        .args(["exec", "--wait", "--timeout", "20", "winter build", "winter test"])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout: {stdout}");
    assert!(!stdout.contains("already running"));

    let built = stdout.find("built").unwrap();
    let second = stdout.find("$ winter test").unwrap();
    let tested = stdout.find("tested").unwrap();
    assert!(built < second && second < tested);
    assert_eq!(stdout.matches("exit code 0").count(), 2);
}

// ---------------------------------------------------------------------------
// winter config
// ---------------------------------------------------------------------------

#[test]
fn config_validate_passes_after_init() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    winter(&dir)
        .args(["config", "validate"])
        .assert()
        .success();
}

#[test]
fn config_validate_fails_on_missing_identity() {
    let dir = TempDir::new().unwrap();
    Config::new("", "contract-1", "escrow")
        .save(dir.path())
        .unwrap();

    winter(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error]"));
}

#[test]
fn config_show_json_includes_contract() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let output = winter(&dir)
        .args(["--json", "config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["contract"]["id"], "contract-1");
    assert_eq!(json["identity"]["user_id"], "user-1");
}
