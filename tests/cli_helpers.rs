#![allow(dead_code)]

use anyhow::{bail, Result};
use assert_cmd::cargo;
use serde_json::Value;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Reference date the fixture series are written against
pub const FIXTURE_DATE: &str = "2025-06-15";

pub fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("series")
}

/// Command isolated from the user's config and environment, with no data source chosen
pub fn bare_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("taxas"));
    cmd.env("HOME", home.path());
    cmd.env("XDG_CONFIG_HOME", home.path().join(".config"));
    cmd.env_remove("TAXAS_DATA_DIR");
    cmd.env_remove("TAXAS_BASE_URL");
    cmd.env_remove("RUST_LOG");
    cmd.arg("--no-color");
    cmd
}

/// Command reading the fixture series as of `date`
pub fn fixture_cmd_at(home: &TempDir, date: &str) -> Command {
    let mut cmd = bare_cmd(home);
    cmd.arg("--data-dir").arg(fixture_dir());
    cmd.arg("--date").arg(date);
    cmd
}

/// Command reading the fixture series as of [`FIXTURE_DATE`]
pub fn base_cmd(home: &TempDir) -> Command {
    fixture_cmd_at(home, FIXTURE_DATE)
}

pub fn run_cmd(home: &TempDir, args: &[&str]) -> Result<Output> {
    let mut cmd = base_cmd(home);
    cmd.args(args);
    let output = cmd.output()?;
    if !output.status.success() {
        bail!(
            "command failed: {:?}\nstdout: {}\nstderr: {}",
            args,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(output)
}

pub fn run_cmd_json(home: &TempDir, args: &[&str]) -> Result<Value> {
    let output = run_cmd(home, args)?;
    let stdout = String::from_utf8(output.stdout)?;
    Ok(serde_json::from_str(&stdout)?)
}

pub fn summary_json(home: &TempDir) -> Result<Value> {
    run_cmd_json(home, &["--json", "summary"])
}

pub fn rate_json(home: &TempDir, kind: &str, ytd: bool) -> Result<Value> {
    let mut args = vec!["--json", "rate", kind];
    if ytd {
        args.push("--ytd");
    }
    run_cmd_json(home, &args)
}
