//! Integration tests for fgfsctl
//!
//! Each test writes a throwaway `fg_root` with a `Protocol/` descriptor and a
//! bridge configuration into a temporary directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const DESCRIPTOR: &str = r#"<?xml version="1.0"?>
<PropertyList>
  <generic>
    <output>
      <var_separator>comma</var_separator>
      <chunk><name>ALT:altitude</name></chunk>
      <chunk><name>OAT</name><conversion function="ftoc"/></chunk>
      <chunk><name>VS</name><conversion function="bogus"/></chunk>
    </output>
  </generic>
</PropertyList>
"#;

fn fgfsctl() -> Result<Command, Box<dyn std::error::Error>> {
    Ok(Command::cargo_bin("fgfsctl")?)
}

/// Write a descriptor and a config into `dir`, returning the config path.
fn write_setup(dir: &TempDir, descriptor: &str, extra: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let protocol = dir.path().join("Protocol");
    fs::create_dir_all(&protocol)?;
    fs::write(protocol.join("test.xml"), descriptor)?;

    let config = format!(
        "host: 127.0.0.1\nport: 0\nfg_root: {}\nxml_file: test.xml\nreceive_timeout_ms: 50\n{extra}",
        dir.path().display()
    );
    let path = dir.path().join("bridge.yaml");
    fs::write(&path, config)?;
    Ok(path)
}

// ─── check ───────────────────────────────────────────────────────────────────

#[test]
fn check_prints_field_map_as_json() -> TestResult {
    let dir = TempDir::new()?;
    let config = write_setup(&dir, DESCRIPTOR, "")?;

    let assert = fgfsctl()?
        .args(["check", "--json", "--config"])
        .arg(&config)
        .assert()
        .success();

    let out: Value = serde_json::from_slice(&assert.get_output().stdout)?;
    assert_eq!(out.get("success"), Some(&Value::Bool(true)));
    assert_eq!(out.get("properties"), Some(&serde_json::json!(3)));
    assert_eq!(out.get("defective"), Some(&serde_json::json!(1)));
    assert_eq!(out.get("separator"), Some(&serde_json::json!(",")));
    Ok(())
}

#[test]
fn check_human_output_lists_keys() -> TestResult {
    let dir = TempDir::new()?;
    let config = write_setup(&dir, DESCRIPTOR, "")?;

    fgfsctl()?
        .arg("check")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("ALT"))
        .stdout(predicate::str::contains("fahrenheit_to_celsius"))
        .stdout(predicate::str::contains("defective"));
    Ok(())
}

#[test]
fn check_wrong_root_exits_with_descriptor_code() -> TestResult {
    let dir = TempDir::new()?;
    let config = write_setup(&dir, "<protocol/>", "")?;

    fgfsctl()?
        .args(["check", "--config"])
        .arg(&config)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("PropertyList"));
    Ok(())
}

#[test]
fn check_invalid_config_exits_with_config_code() -> TestResult {
    let dir = TempDir::new()?;
    let config = write_setup(&dir, DESCRIPTOR, "shutdown_timeout_ms: 0\n")?;

    fgfsctl()?
        .args(["check", "--json", "--config"])
        .arg(&config)
        .assert()
        .code(3)
        .stdout(predicate::str::contains("shutdown_timeout_ms"));
    Ok(())
}

// ─── listen ──────────────────────────────────────────────────────────────────

#[test]
fn listen_for_duration_reports_final_status() -> TestResult {
    let dir = TempDir::new()?;
    let config = write_setup(&dir, DESCRIPTOR, "")?;

    let assert = fgfsctl()?
        .args(["listen", "--json", "--status-interval-ms", "0", "--duration-ms", "200", "--config"])
        .arg(&config)
        .assert()
        .success();

    let out: Value = serde_json::from_slice(&assert.get_output().stdout)?;
    assert_eq!(out.pointer("/status/state"), Some(&serde_json::json!("stopped")));
    assert_eq!(out.pointer("/status/properties"), Some(&serde_json::json!(3)));
    assert_eq!(out.pointer("/status/bound"), Some(&serde_json::json!(3)));
    assert_eq!(out.pointer("/values/ALT"), Some(&serde_json::json!(0.0)));
    Ok(())
}

#[test]
fn listen_with_seeded_variables_reports_unbound() -> TestResult {
    let dir = TempDir::new()?;
    let config = write_setup(
        &dir,
        DESCRIPTOR,
        "variables:\n  - key: ALT\n  - key: GEAR\n    kind: int\n",
    )?;

    let assert = fgfsctl()?
        .args(["listen", "--json", "--status-interval-ms", "0", "--duration-ms", "100", "--config"])
        .arg(&config)
        .assert()
        .success();

    let out: Value = serde_json::from_slice(&assert.get_output().stdout)?;
    assert_eq!(out.pointer("/status/bound"), Some(&serde_json::json!(1)));
    assert_eq!(out.pointer("/status/unbound"), Some(&serde_json::json!(2)));
    assert_eq!(out.pointer("/values/GEAR"), Some(&serde_json::json!(0)));
    Ok(())
}
