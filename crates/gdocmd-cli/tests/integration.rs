//! Integration tests for the gdocmd binary
//!
//! Only offline paths are exercised: nothing here reaches the network.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn gdocmd_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_gdocmd"))
}

/// Run gdocmd in `dir` with no credentials in the environment
fn run_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(gdocmd_binary())
        .args(args)
        .current_dir(dir)
        .env_remove("GDOCMD_ACCESS_TOKEN")
        .env("GOOGLE_DRIVE_TOKEN_FILE", dir.join("no-such-token.json"))
        .env("HOME", dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run gdocmd")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("publish"));
    assert!(stdout.contains("export-folder"));
}

#[test]
fn test_schema_is_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["schema"]);
    assert!(output.status.success());
    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(schema["title"], "Config");
    assert!(schema["properties"]["style"].is_object());
}

#[test]
fn test_init_writes_config() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["init"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let content = fs::read_to_string(dir.path().join("_gdocmd.toml")).unwrap();
    assert!(content.starts_with("#:schema https://"));
    assert!(content.contains("[retry]"));
    assert!(content.contains("max_attempts = 5"));
}

#[test]
fn test_init_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("_gdocmd.toml");
    fs::write(&path, "# mine\n").unwrap();

    let output = run_in(dir.path(), &["init"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("already exists"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "# mine\n");

    let output = run_in(dir.path(), &["init", "--force"]);
    assert!(output.status.success());
    assert!(fs::read_to_string(&path).unwrap().starts_with("#:schema"));
}

#[test]
fn test_publish_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["publish", "absent.md"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Input file does not exist"));
}

#[test]
fn test_export_invalid_document() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["export", "not a document!"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid document"));
}

#[test]
fn test_export_without_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["export", "1AbCdEf"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to read token file"));
    assert!(!dir.path().join("untitled.md").exists());
}

#[test]
fn test_split_level_out_of_range() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(
        dir.path(),
        &["export", "1AbCdEf", "--split", "sections", "--split-level", "3"],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("split-level"));
}

#[test]
fn test_export_folder_requires_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["export-folder", "0BxFolder"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("--output"));
}

#[test]
fn test_invalid_config_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("_gdocmd.toml"),
        "[export]\nindent_width = \"wide\"\n",
    )
    .unwrap();

    let output = run_in(dir.path(), &["export", "1AbCdEf"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to parse config file"));
}

#[test]
fn test_explicit_config_missing() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["--config", "nowhere.toml", "export", "1AbCdEf"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to read config file"));
}
