#![allow(dead_code)]

use anyhow::{bail, Context, Result};
use assert_cmd::cargo;
use rust_decimal::Decimal;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const OPERATIONS_HEADER: &str =
    "id,direction,entity_id,tariff_code,fob_value,exchange_rate,state_vat_rate,customs_fees,operation_date,quantity";

/// Command with an isolated HOME/XDG_CONFIG_HOME so no user config is picked up
pub fn base_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("tributec"));
    cmd.env("HOME", home.path());
    cmd.env("XDG_CONFIG_HOME", home.path().join(".config"));
    cmd.env_remove("RUST_LOG");
    cmd.arg("--no-color");
    cmd
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

pub fn run_json(home: &TempDir, args: &[&str]) -> Result<Value> {
    let mut full = vec!["--json"];
    full.extend_from_slice(args);
    let output = run_cmd(home, &full)?;
    serde_json::from_slice(&output.stdout).context("stdout is not valid JSON")
}

/// Write an operations CSV with the standard header into the temp dir
pub fn write_operations(home: &TempDir, name: &str, rows: &[&str]) -> Result<PathBuf> {
    let path = home.path().join(name);
    let mut content = String::from(OPERATIONS_HEADER);
    content.push('\n');
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    std::fs::write(&path, content)?;
    Ok(path)
}

pub fn write_config(home: &TempDir, toml: &str) -> Result<PathBuf> {
    let path = home.path().join("tributec.toml");
    std::fs::write(&path, toml)?;
    Ok(path)
}

pub fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp path is valid UTF-8")
}

pub fn decimal_from_value(value: &Value) -> Result<Decimal> {
    if let Some(s) = value.as_str() {
        return Decimal::from_str_exact(s).context("invalid decimal string");
    }
    if let Some(f) = value.as_f64() {
        return Decimal::try_from(f).context("invalid decimal number");
    }
    Err(anyhow::anyhow!("expected decimal value, got {}", value))
}
