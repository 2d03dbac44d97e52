//! End-to-end tests for the mddoc binary.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn mddoc() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("mddoc"))
}

fn write_input(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn converts_single_file_to_typst() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "notes.md", "# Notes\n\n1. first\n2. second\n");

    mddoc()
        .arg(&input)
        .args(["--format", "typst"])
        .assert()
        .success()
        .stdout(predicate::str::contains("notes.typ"));

    let typst = fs::read_to_string(dir.path().join("notes.typ")).unwrap();
    assert!(typst.contains("#heading(level: 1)"));
    assert!(typst.contains("[2\\.]second"));
}

#[test]
fn output_flag_names_the_file() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "in.md", "text\n");
    let output = dir.path().join("report.v2");

    mddoc()
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["-f", "typst"])
        .assert()
        .success();

    assert!(dir.path().join("report.v2.typ").is_file());
}

#[test]
fn output_flag_rejects_several_inputs() {
    let dir = TempDir::new().unwrap();
    let a = write_input(&dir, "a.md", "a\n");
    let b = write_input(&dir, "b.md", "b\n");

    mddoc()
        .args([&a, &b])
        .arg("-o")
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("single input"));
}

#[test]
fn batch_counts_missing_inputs_as_failed() {
    let dir = TempDir::new().unwrap();
    let good = write_input(&dir, "good.md", "hello\n");
    let missing = dir.path().join("missing.md");
    let out_dir = dir.path().join("out");

    mddoc()
        .arg(&good)
        .arg(&missing)
        .arg("-d")
        .arg(&out_dir)
        .args(["-f", "typst"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Skipped"))
        .stdout(predicate::str::contains("Converted 1 of 2 files (1 failed)"));

    assert!(out_dir.join("good.typ").is_file());
}

#[test]
fn missing_template_aborts_before_converting() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "doc.md", "hello\n");

    mddoc()
        .arg(&input)
        .args(["-f", "typst", "-t"])
        .arg(dir.path().join("nope.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));

    assert!(!dir.path().join("doc.typ").exists());
}

#[test]
fn template_styles_reach_the_output() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "doc.md", "body\n");
    let template = write_input(&dir, "style.toml", "[body]\nfont = \"Calibri\"\n");

    mddoc()
        .arg(&input)
        .args(["-f", "typst", "-t"])
        .arg(&template)
        .assert()
        .success();

    let typst = fs::read_to_string(dir.path().join("doc.typ")).unwrap();
    assert!(typst.contains("#set text(font: \"Calibri\")"));
}

#[test]
fn invalid_utf8_input_fails() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bad.md");
    fs::write(&input, [0x66, 0x6f, 0xff, 0x6f]).unwrap();

    mddoc()
        .arg(&input)
        .args(["-f", "typst"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("UTF-8"));
}

#[test]
fn malformed_config_is_reported() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "doc.md", "hello\n");
    let config = write_input(&dir, "mddoc.toml", "[page\n");

    mddoc()
        .arg(&input)
        .args(["-f", "typst", "-c"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("config"));
}
