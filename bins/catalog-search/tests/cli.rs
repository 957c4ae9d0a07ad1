//! Argument handling and configuration errors; none of these reach the network.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("catalog-search").unwrap();
    cmd.env_remove("CATALOG_API_URL").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("composers"))
        .stdout(predicate::str::contains("works"))
        .stdout(predicate::str::contains("all"))
        .stdout(predicate::str::contains("stats"));
}

#[test]
fn test_version() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_query_is_required() {
    cli()
        .arg("composers")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<QUERY>"));
}

#[test]
fn test_unknown_format_rejected() {
    cli()
        .args(["--format", "yaml", "works", "bach"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("yaml"));
}

#[test]
fn test_missing_config_file() {
    cli()
        .args(["--config", "/nonexistent/catalog-search.toml", "composers", "bach"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_invalid_config_values() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[search]\nthreshold = 2.5").unwrap();

    cli()
        .arg("--config")
        .arg(file.path())
        .args(["composers", "bach"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("threshold"));
}

#[test]
fn test_non_http_api_url_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[logging]\nlevel = \"off\"").unwrap();

    cli()
        .arg("--config")
        .arg(file.path())
        .args(["--api-url", "ftp://catalog.example", "all", "bach"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("ftp://catalog.example"));
}

#[test]
fn test_zero_limit_rejected() {
    cli()
        .args(["composers", "bach", "--limit", "0"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--limit"));
}

#[test]
fn test_json_format_reports_errors_as_json() {
    let output = cli()
        .args(["--format", "json", "--config", "/nonexistent/catalog-search.toml", "stats"])
        .assert()
        .code(3)
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["code_str"], "E3001");
    assert_eq!(report["category"], "Configuration");
    assert!(report["suggestion"].is_string());
}

#[test]
fn test_filter_flags_are_listed() {
    cli()
        .args(["composers", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--period"))
        .stdout(predicate::str::contains("--born-after"));

    cli()
        .args(["works", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--instrumentation"))
        .stdout(predicate::str::contains("--difficulty-min"));
}

#[test]
fn test_living_flag_takes_a_boolean() {
    cli()
        .args(["composers", "sor", "--living", "maybe"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--living"));
}
