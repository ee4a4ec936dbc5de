//! Integration tests for the `queuecast` binary.
//!
//! Argument parsing, config inspection and one-shot commands against a
//! wiremock backend. Nothing here touches the user's real configuration.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// `queuecast` with env isolation and the given config file.
fn queuecast_cmd(config: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("queuecast");
    cmd.env("HOME", "/tmp/queuecast-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/queuecast-cli-test-nonexistent")
        .env("QUEUECAST_CONFIG", config)
        .env_remove("QUEUECAST_BACKEND_BASE_URL")
        .env_remove("QUEUECAST_SCHEDULER_DEFAULT_CHANNEL")
        .env_remove("WHATSAPP_ACCESS_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("queuecast.toml");
    std::fs::write(&path, body).unwrap();
    path
}

async fn backend() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/queues/all/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "queues": [{
                "queue_id": "q-pharmacy",
                "name": "Pharmacy",
                "entries": [
                    { "id": "e-1", "msisdn": "263770000001", "status": "waiting" },
                    { "id": "e-2", "msisdn": "263770000002", "status": "waiting" }
                ]
            }]
        })))
        .mount(&server)
        .await;
    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn no_args_shows_usage() {
    let dir = tempfile::tempdir().unwrap();
    let output = queuecast_cmd(&dir.path().join("none.toml"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    queuecast_cmd(&dir.path().join("none.toml"))
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("run")
                .and(predicate::str::contains("check"))
                .and(predicate::str::contains("notify")),
        );
}

#[test]
fn completions_are_generated() {
    let dir = tempfile::tempdir().unwrap();
    queuecast_cmd(&dir.path().join("none.toml"))
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn config_path_reports_the_override() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    queuecast_cmd(&path)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn config_show_masks_the_token() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "[whatsapp]\naccess_token = \"very-secret\"\n\n[scheduler]\npoll_interval_secs = 15\n",
    );
    queuecast_cmd(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("poll_interval_secs = 15")
                .and(predicate::str::contains("very-secret").not()),
        );
}

#[test]
fn invalid_channel_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[scheduler]\ndefault_channel = \"sms\"\n");
    queuecast_cmd(&path)
        .arg("check")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("sms"));
}

// ── Backend-bound commands ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn check_prints_queue_stats() {
    let server = backend().await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "");

    queuecast_cmd(&path)
        .args(["--base-url", &server.uri(), "check", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("q-pharmacy"));

    queuecast_cmd(&path)
        .args(["--base-url", &server.uri(), "check", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"waiting_entries\": 2"));
}

#[test]
fn check_against_unreachable_backend_fails_with_connection_code() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[backend]\nbase_url = \"http://127.0.0.1:9\"\ntimeout_secs = 2\n");
    queuecast_cmd(&path).arg("check").assert().code(7);
}

#[test]
fn notify_over_log_only_channel_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "");
    queuecast_cmd(&path)
        .args(["notify", "--to", "263770000001", "-m", "hello", "--channel", "ussd"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sent to 263770000001 via ussd"));
}

#[test]
fn notify_without_whatsapp_credentials_has_no_sink() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "");
    queuecast_cmd(&path)
        .args(["notify", "--to", "263770000001", "-m", "hello"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("whatsapp"));
}
