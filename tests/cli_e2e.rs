//! End-to-end CLI tests for the manga-pipeline binary.

mod support;

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use support::start_mock_server_or_skip;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

/// Binary invocation isolated from the host's config and log settings.
fn cmd(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("manga-pipeline").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env("HOME", config_home)
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(config_home: &Path, body: &str) {
    let dir = config_home.join("manga-pipeline");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.toml"), body).unwrap();
}

#[test]
fn test_binary_help_displays_usage() {
    let home = TempDir::new().unwrap();
    cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Search manga catalogues"))
        .stdout(predicate::str::contains("download"));
}

#[test]
fn test_binary_version_displays_version() {
    let home = TempDir::new().unwrap();
    cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("manga-pipeline"));
}

#[test]
fn test_binary_requires_subcommand() {
    let home = TempDir::new().unwrap();
    cmd(home.path()).assert().failure();
}

#[test]
fn test_binary_invalid_flag_returns_error() {
    let home = TempDir::new().unwrap();
    cmd(home.path())
        .args(["search", "--invalid-flag"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_search_without_base_url_fails() {
    let home = TempDir::new().unwrap();
    cmd(home.path())
        .args(["search", "berserk"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No base URL configured"));
}

#[test]
fn test_invalid_conversion_rejected_before_any_request() {
    let home = TempDir::new().unwrap();
    cmd(home.path())
        .args([
            "--base-url",
            "http://127.0.0.1:9",
            "download",
            "berserk",
            "-c",
            "0",
            "--convert",
            "zip",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("convert"))
        .stderr(predicate::str::contains("pdf|cbz|none"));
}

#[test]
fn test_invalid_sort_rejected() {
    let home = TempDir::new().unwrap();
    cmd(home.path())
        .args(["--base-url", "http://127.0.0.1:9", "search", "--sort", "random"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sort"));
}

#[test]
fn test_config_show_without_file_uses_defaults() {
    let home = TempDir::new().unwrap();
    cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config_file = not found"))
        .stdout(predicate::str::contains("base_url = <unset>"))
        .stdout(predicate::str::contains("queue_capacity = 2000"))
        .stdout(predicate::str::contains("verbosity = default"));
}

#[test]
fn test_config_show_cli_values_override_file() {
    let home = TempDir::new().unwrap();
    write_config(
        home.path(),
        r#"
base_url = "https://manga.example.com/api"
queue_capacity = 42
read_timeout_secs = 60
verbosity = "verbose"
"#,
    );

    cmd(home.path())
        .args(["--queue-capacity", "7", "-q", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config_file = loaded"))
        .stdout(predicate::str::contains(
            "base_url = https://manga.example.com/api",
        ))
        .stdout(predicate::str::contains("queue_capacity = 7"))
        .stdout(predicate::str::contains("read_timeout_secs = 60"))
        .stdout(predicate::str::contains("verbosity = quiet"));
}

#[test]
fn test_config_file_unknown_key_fails() {
    let home = TempDir::new().unwrap();
    write_config(home.path(), "concurrency = 4\n");

    cmd(home.path())
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[test]
fn test_explicit_config_path_is_used() {
    let home = TempDir::new().unwrap();
    let custom = home.path().join("custom.toml");
    fs::write(&custom, "output_dir = \"/srv/manga\"\n").unwrap();

    cmd(home.path())
        .arg("--config")
        .arg(&custom)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("output_dir = /srv/manga"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_search_prints_results_from_site() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("name", "berserk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"title": "Berserk", "author": "Miura", "id": "berserk"}
        ])))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    cmd(home.path())
        .args(["-q", "--base-url", &server.uri(), "search", "berserk"])
        .assert()
        .success()
        .stdout(predicate::str::contains("berserk\tBerserk\tMiura"));
}
