//! Integration tests for the mdpaper CLI

use assert_cmd::Command;
use mdpaper_core::docx::test_support::minimal_template;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Write a Markdown source file into the temp dir
fn create_markdown(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Write the minimal thesis template archive into the temp dir
fn create_template(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("template.docx");
    fs::write(&path, minimal_template()).expect("Failed to write template");
    path
}

#[test]
fn test_help() {
    let mut cmd = Command::cargo_bin("mdpaper-cli").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("convert"))
        .stdout(predicate::str::contains("info"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_version() {
    let mut cmd = Command::cargo_bin("mdpaper-cli").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mdpaper"));
}

#[test]
fn test_convert_help() {
    let mut cmd = Command::cargo_bin("mdpaper-cli").unwrap();
    cmd.args(["convert", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Convert a Markdown paper"))
        .stdout(predicate::str::contains("--template"))
        .stdout(predicate::str::contains("--output"))
        .stdout(predicate::str::contains("--metadata"));
}

#[test]
fn test_info_help() {
    let mut cmd = Command::cargo_bin("mdpaper-cli").unwrap();
    cmd.args(["info", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Display information"))
        .stdout(predicate::str::contains("--json"));
}

#[test]
fn test_check_help() {
    let mut cmd = Command::cargo_bin("mdpaper-cli").unwrap();
    cmd.args(["check", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Check a Markdown paper"))
        .stdout(predicate::str::contains("--template"));
}

#[test]
fn test_convert_missing_input() {
    let mut cmd = Command::cargo_bin("mdpaper-cli").unwrap();
    cmd.args([
        "convert",
        "no-such-file.md",
        "--template",
        "no-such-template.docx",
        "--output",
        "out.docx",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to parse"));
}

#[test]
fn test_convert_end_to_end() {
    let dir = TempDir::new().unwrap();
    let input = create_markdown(&dir, "paper.md", "# 绪论\n\n这是正文。\n\n# 结论\n\n结束。\n");
    let template = create_template(&dir);
    let output = dir.path().join("out.docx");

    let metadata = dir.path().join("meta.json");
    fs::write(
        &metadata,
        r#"{"name": "张三", "title_zh": "某系统的设计"}"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("mdpaper-cli").unwrap();
    cmd.args([
        "convert",
        input.to_str().unwrap(),
        "--template",
        template.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "--metadata",
        metadata.to_str().unwrap(),
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("Converted"));

    assert!(output.exists());
}

#[test]
fn test_info_json() {
    let dir = TempDir::new().unwrap();
    let input = create_markdown(
        &dir,
        "paper.md",
        "# 绪论\n\n见下图。\n\n![fig-a:结构]()\n\n# 结论\n\n结束。\n",
    );

    let mut cmd = Command::cargo_bin("mdpaper-cli").unwrap();
    cmd.args(["info", input.to_str().unwrap(), "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"figures\": 1"))
        .stdout(predicate::str::contains("绪论"));
}

#[test]
fn test_check_rejects_deep_headings() {
    let dir = TempDir::new().unwrap();
    let input = create_markdown(&dir, "bad.md", "##### 太深的标题\n");

    let mut cmd = Command::cargo_bin("mdpaper-cli").unwrap();
    cmd.args(["check", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Check failed"));
}

#[test]
fn test_check_validates_template() {
    let dir = TempDir::new().unwrap();
    let input = create_markdown(&dir, "paper.md", "# 绪论\n\n正文。\n");
    let template = create_template(&dir);

    let mut cmd = Command::cargo_bin("mdpaper-cli").unwrap();
    cmd.args([
        "check",
        input.to_str().unwrap(),
        "--template",
        template.to_str().unwrap(),
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("Valid paper source"))
    .stdout(predicate::str::contains("OK"));
}
