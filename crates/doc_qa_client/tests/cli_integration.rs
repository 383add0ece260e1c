//! Integration tests for the doc-qa binary.
//! Uses assert_cmd to run the binary, real temp files, and an in-process
//! HTTP server. No mocks.

mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use common::{closed_url, serve_once_in_thread, Reply};
use predicates::prelude::*;
use std::io::Write as _;

/// Write a minimal YAML config pointing at `base_url`.
fn write_config(dir: &tempfile::TempDir, base_url: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.yaml");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "server:\n  base_url: {}\nclient:\n  idle_timeout_secs: 5", base_url).unwrap();
    path
}

fn write_document(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"%PDF-1.4 test document").unwrap();
    path
}

#[test]
fn prints_streamed_answer() {
    let (url, server) = serve_once_in_thread(Reply::text(&["The", " report", " says..."]));
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &url);
    let doc = write_document(&dir, "report.pdf");

    let mut cmd = Command::from(cargo_bin_cmd!("doc-qa"));
    cmd.arg("--config")
        .arg(&config_path)
        .arg("--file")
        .arg(&doc)
        .arg("Summarize page 1");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("You asked about \"report.pdf\":"))
        .stdout(predicate::str::contains("The report says..."));

    let request = server.join().unwrap();
    assert!(request.body_text().contains("Summarize page 1"));
}

#[test]
fn reads_question_from_stdin_and_config_from_env() {
    let (url, server) = serve_once_in_thread(Reply::text(&["Answer from stdin."]));
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &url);
    let doc = write_document(&dir, "a.pdf");

    let mut cmd = Command::from(cargo_bin_cmd!("doc-qa"));
    cmd.env("DOC_QA_CONFIG", &config_path)
        .arg("-f")
        .arg(&doc)
        .write_stdin("What is the answer?\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Answer from stdin."));

    let request = server.join().unwrap();
    assert!(request.body_text().contains("What is the answer?"));
}

#[test]
fn url_flag_overrides_config() {
    let (url, _server) = serve_once_in_thread(Reply::text(&["overridden"]));
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &closed_url());
    let doc = write_document(&dir, "a.pdf");

    let mut cmd = Command::from(cargo_bin_cmd!("doc-qa"));
    cmd.arg("--config")
        .arg(&config_path)
        .arg("--url")
        .arg(&url)
        .arg("-f")
        .arg(&doc)
        .arg("q");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("overridden"));
}

#[test]
fn missing_documents_is_a_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &closed_url());

    let mut cmd = Command::from(cargo_bin_cmd!("doc-qa"));
    cmd.arg("--config").arg(&config_path).arg("Summarize");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Please attach PDF(s) and enter a prompt."));
}

#[test]
fn server_error_status_exits_nonzero() {
    let (url, _server) = serve_once_in_thread(Reply::Status {
        code: 400,
        reason: "Bad Request",
        body: r#"{"error": "No selected files"}"#.into(),
    });
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &url);
    let doc = write_document(&dir, "a.pdf");

    let mut cmd = Command::from(cargo_bin_cmd!("doc-qa"));
    cmd.arg("--config").arg(&config_path).arg("-f").arg(&doc).arg("q");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("status 400"))
        .stderr(predicate::str::contains("No selected files"));
}

#[test]
fn server_down_shows_error() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &closed_url());
    let doc = write_document(&dir, "a.pdf");

    let mut cmd = Command::from(cargo_bin_cmd!("doc-qa"));
    cmd.arg("--config")
        .arg(&config_path)
        .arg("-f")
        .arg(&doc)
        .write_stdin("hello\n");

    cmd.assert()
        .failure()
        .stderr(predicate::str::is_match("(?i)(connect|error|refused)").unwrap());
}

#[test]
fn unreadable_document_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &closed_url());

    let mut cmd = Command::from(cargo_bin_cmd!("doc-qa"));
    cmd.arg("--config")
        .arg(&config_path)
        .arg("-f")
        .arg(dir.path().join("missing.pdf"))
        .arg("q");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}
