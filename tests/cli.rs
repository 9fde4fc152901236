//! End-to-end tests for the testbanner binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const BANNER_VARS: &[&str] = &["WIDTH", "TEST_FORMAT", "SCRIPT_ROOT", "RUST_LOG"];

const SETTING_VARS: &[&str] = &[
    "MEMOGARDEN_RESOURCE_PROFILE",
    "MEMOGARDEN_MAX_VIEW_ENTRIES",
    "MEMOGARDEN_MAX_SEARCH_RESULTS",
    "MEMOGARDEN_FOSSILIZATION_THRESHOLD",
    "MEMOGARDEN_WAL_CHECKPOINT_INTERVAL",
    "MEMOGARDEN_LOG_LEVEL",
    "MEMOGARDEN_BIND_ADDRESS",
    "MEMOGARDEN_BIND_PORT",
    "MEMOGARDEN_ENCRYPTION",
    "MEMOGARDEN_DATA_DIR",
    "MEMOGARDEN_CONFIG_DIR",
    "MEMOGARDEN_LOG_DIR",
];

/// Binary with a clean environment and a config path inside `dir`
fn testbanner(dir: &TempDir, config: &str) -> Command {
    let mut cmd = Command::cargo_bin("testbanner").unwrap();
    for var in BANNER_VARS.iter().chain(SETTING_VARS) {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1");
    cmd.arg("--config").arg(dir.path().join(config));
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap()
}

fn boxed(width: usize, title: &str, body: &[&str]) -> String {
    let pad = |line: &str| format!("║ {line}{} ║", " ".repeat(width - line.chars().count() - 2));
    let rule = "═".repeat(width - 2);
    let mut lines = vec![format!("╔{rule}╗"), pad(title), format!("╠{rule}╣")];
    lines.extend(body.iter().map(|l| pad(l)));
    lines.push(format!("╚{rule}╝"));
    lines.join("\n") + "\n"
}

#[test]
fn header_defaults_to_textbox() {
    let dir = TempDir::new().unwrap();
    let out = stdout_of(
        testbanner(&dir, "missing.toml")
            .env("WIDTH", "30")
            .args(["header", "Core Tests", "core", "r1"]),
    );
    assert_eq!(out, boxed(30, "Core Tests", &["Project: core", "Run ID: r1"]));
}

#[test]
fn header_uses_default_width() {
    let dir = TempDir::new().unwrap();
    let out = stdout_of(testbanner(&dir, "missing.toml").args(["header", "T", "p", "r"]));
    let widths: Vec<usize> = out.lines().map(|line| line.chars().count()).collect();
    assert_eq!(widths, vec![60, 62, 60, 62, 62, 60]);
}

#[test]
fn summary_markdown_from_env() {
    let dir = TempDir::new().unwrap();
    let out = stdout_of(
        testbanner(&dir, "missing.toml")
            .env("TEST_FORMAT", "markdown")
            .args(["summary", "PASSED", "0", "5", "1.2s", "run-7"]),
    );
    assert_eq!(
        out,
        "### Test Summary\n\n**Status:** PASSED\n**Tests:** 5 passed\n**Duration:** 1.2s\n**Run ID:** run-7\n"
    );
}

#[test]
fn summary_reports_failures() {
    let dir = TempDir::new().unwrap();
    let out = stdout_of(
        testbanner(&dir, "missing.toml")
            .env("TEST_FORMAT", "plaintext")
            .args(["summary", "FAILED", "2", "10", "3s", "run-8"]),
    );
    assert_eq!(
        out,
        "Test Summary\n\nStatus: FAILED\nTests: 2 failed, 10 passed\nDuration: 3s\nRun ID: run-8\n"
    );
}

#[test]
fn unknown_format_falls_back_to_textbox() {
    let dir = TempDir::new().unwrap();
    testbanner(&dir, "missing.toml")
        .env("TEST_FORMAT", "fancy")
        .args(["header", "T", "p", "r"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("╔"));
}

#[test]
fn invalid_width_is_ignored() {
    let dir = TempDir::new().unwrap();
    let assert = testbanner(&dir, "missing.toml")
        .env("WIDTH", "wide")
        .args(["header", "T", "p", "r"])
        .assert()
        .success()
        .stderr(predicate::str::contains("WIDTH"));
    let out = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(out.lines().next().unwrap().chars().count(), 60);
}

#[test]
fn flag_overrides_env() {
    let dir = TempDir::new().unwrap();
    testbanner(&dir, "missing.toml")
        .env("TEST_FORMAT", "markdown")
        .args(["header", "T", "p", "r", "--format", "plaintext"])
        .assert()
        .success()
        .stdout("T\n\nProject: p\nRun ID: r\n");
}

#[test]
fn config_file_banner_section() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("config.toml"),
        "[banner]\nformat = \"plaintext\"\nwidth = 40\n",
    )
    .unwrap();

    testbanner(&dir, "config.toml")
        .args(["header", "T", "p", "r"])
        .assert()
        .success()
        .stdout("T\n\nProject: p\nRun ID: r\n");

    testbanner(&dir, "config.toml")
        .env("TEST_FORMAT", "markdown")
        .args(["header", "T", "p", "r"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("### T"));
}

#[test]
fn broken_config_file_warns_and_continues() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("config.toml"), "[banner\nwidth = ").unwrap();

    testbanner(&dir, "config.toml")
        .env("TEST_FORMAT", "plaintext")
        .args(["header", "T", "p", "r"])
        .assert()
        .success()
        .stdout("T\n\nProject: p\nRun ID: r\n")
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn unknown_profile_in_env_fails_settings_commands() {
    let dir = TempDir::new().unwrap();
    testbanner(&dir, "missing.toml")
        .env("MEMOGARDEN_RESOURCE_PROFILE", "huge")
        .args(["config", "get", "bind_port"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown resource profile"));
}

#[test]
fn unknown_profile_in_env_still_renders_banners() {
    let dir = TempDir::new().unwrap();
    testbanner(&dir, "missing.toml")
        .env("MEMOGARDEN_RESOURCE_PROFILE", "huge")
        .env("TEST_FORMAT", "plaintext")
        .args(["header", "T", "p", "r"])
        .assert()
        .success()
        .stdout("T\n\nProject: p\nRun ID: r\n")
        .stderr(predicate::str::contains("Unknown resource profile"));
}

#[test]
fn formatter_script_path() {
    let dir = TempDir::new().unwrap();
    testbanner(&dir, "missing.toml")
        .env("SCRIPT_ROOT", "/opt/suite")
        .args(["formatter", "markdown", "--path"])
        .assert()
        .success()
        .stdout("/opt/suite/utils/format/markdown.py\n");

    testbanner(&dir, "missing.toml")
        .args(["formatter", "", "--path"])
        .assert()
        .success()
        .stdout("utils/format/textbox.py\n");
}

#[test]
fn script_backend_missing_script_fails() {
    let dir = TempDir::new().unwrap();
    testbanner(&dir, "missing.toml")
        .env("SCRIPT_ROOT", dir.path())
        .args(["header", "T", "p", "r", "--backend", "script"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("textbox.py"));
}

#[test]
fn format_command_matches_script_flags() {
    let dir = TempDir::new().unwrap();
    let out = stdout_of(testbanner(&dir, "missing.toml").args([
        "format", "textbox", "--title", "Build", "--body", "Step: 1", "--width", "20",
    ]));
    assert_eq!(out, boxed(20, "Build", &["Step: 1"]));
}

#[test]
fn rrule_expand_and_describe() {
    let dir = TempDir::new().unwrap();
    testbanner(&dir, "missing.toml")
        .args([
            "rrule",
            "expand",
            "FREQ=MONTHLY;BYDAY=2FR",
            "--start",
            "2025-01-01T00:00:00Z",
            "-n",
            "3",
        ])
        .assert()
        .success()
        .stdout("2025-01-10T00:00:00Z\n2025-02-14T00:00:00Z\n2025-03-14T00:00:00Z\n");

    testbanner(&dir, "missing.toml")
        .args(["rrule", "describe", "FREQ=MONTHLY;BYDAY=2FR"])
        .assert()
        .success()
        .stdout("Every month on the 2nd Friday\n");

    testbanner(&dir, "missing.toml")
        .args(["rrule", "validate", "INVALID"])
        .assert()
        .failure();
}

#[test]
fn hash_row() {
    let dir = TempDir::new().unwrap();
    testbanner(&dir, "missing.toml")
        .args([
            "hash",
            "row",
            r#"{"type":"transactions","created_at":"2025-01-01T00:00:00Z","updated_at":"2025-01-01T00:00:00Z"}"#,
        ])
        .assert()
        .success()
        .stdout("70a8d752cfdfff370a338bf3dcf883c918dc8b599718321f6a163145ae7e5d45\n");
}

#[test]
fn hash_verify_detects_break() {
    let dir = TempDir::new().unwrap();
    let chain = dir.path().join("chain.json");
    fs::write(
        &chain,
        r#"[
            {"type":"transactions","created_at":"2025-01-01T00:00:00Z","updated_at":"2025-01-01T00:00:00Z"},
            {"type":"transactions","created_at":"2025-01-01T00:00:00Z","updated_at":"2025-01-02T00:00:00Z","previous_hash":"bad"}
        ]"#,
    )
    .unwrap();

    testbanner(&dir, "missing.toml")
        .arg("hash")
        .arg("verify")
        .arg(&chain)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Chain broken at entry 1"));
}

#[test]
fn time_and_uid_helpers() {
    let dir = TempDir::new().unwrap();
    testbanner(&dir, "missing.toml")
        .args(["time", "date", "2229"])
        .assert()
        .success()
        .stdout("2026-02-07\n");

    testbanner(&dir, "missing.toml")
        .args(["time", "parse", "2025-01-02T05:04:05+02:00", "--unix"])
        .assert()
        .success()
        .stdout("1735787045\n");

    testbanner(&dir, "missing.toml")
        .args(["uid", "new", "--core"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("core_"));

    testbanner(&dir, "missing.toml")
        .args(["uid", "strip", "soil_abc"])
        .assert()
        .success()
        .stdout("abc\n");
}

#[test]
fn secret_api_key_shape() {
    let dir = TempDir::new().unwrap();
    let out = stdout_of(testbanner(&dir, "missing.toml").args(["secret", "api-key"]));
    let key = out.trim();
    assert_eq!(key.len(), 76);
    assert!(key.starts_with("mg_sk_agent_"));
}

#[test]
fn config_init_then_get() {
    let dir = TempDir::new().unwrap();
    testbanner(&dir, "new/config.yaml")
        .args(["config", "init"])
        .assert()
        .success();
    assert!(dir.path().join("new/config.yaml").exists());

    testbanner(&dir, "new/config.yaml")
        .args(["config", "get", "banner.width"])
        .assert()
        .success()
        .stdout("60\n");

    testbanner(&dir, "new/config.yaml")
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}
