//! Linux battery and process readers
//!
//! The battery is read with `acpi -b`, falling back to the sysfs
//! power-supply interface when `acpi` is not installed. Processes come from
//! `ps aux` sorted by memory.

use crate::error::{BatlogError, BatlogResult};
use crate::platform::{BatteryStatus, process_basename};
use crate::sample::{Direction, UNKNOWN_REMAINING};
use std::fs;
use std::path::Path;

/// Battery directories probed under the power-supply root
const SYSFS_BATTERIES: [&str; 3] = ["BAT0", "BAT1", "BAT2"];

/// Read the battery through `acpi -b`
pub(crate) async fn read_acpi() -> BatlogResult<BatteryStatus> {
    let output = tokio::process::Command::new("acpi")
        .arg("-b")
        .output()
        .await
        .map_err(|e| BatlogError::resource_access_error(&format!("acpi: {e}")))?;

    if !output.status.success() {
        return Err(BatlogError::resource_access_error(&format!(
            "acpi exited with {}",
            output.status
        )));
    }

    parse_acpi_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `acpi -b` output
///
/// Expected shape: `Battery 0: Discharging, 85%, 01:23:45 remaining`. Only
/// the first battery line is used.
pub(crate) fn parse_acpi_output(output: &str) -> BatlogResult<BatteryStatus> {
    let line = output
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("Battery"))
        .ok_or_else(|| BatlogError::parse_error("No battery line in acpi output"))?;

    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < 2 {
        return Err(BatlogError::parse_error(&format!(
            "Incomplete acpi battery line: {line}"
        )));
    }

    let status = parts[0]
        .split_once(':')
        .map(|(_, status)| status.trim())
        .ok_or_else(|| BatlogError::parse_error(&format!("No status in acpi line: {line}")))?;
    let direction = Direction::parse(status)
        .ok_or_else(|| BatlogError::parse_error(&format!("Empty status in acpi line: {line}")))?;

    let level = parts[1]
        .trim_end_matches('%')
        .parse::<i64>()
        .map_err(|_| BatlogError::parse_error(&format!("Invalid acpi level '{}'", parts[1])))?;

    let time_remaining = parts
        .get(2)
        .filter(|remaining| !remaining.is_empty())
        .map(|remaining| remaining.to_string())
        .unwrap_or_else(|| UNKNOWN_REMAINING.to_string());

    Ok(BatteryStatus {
        level,
        direction,
        time_remaining,
    })
}

/// Read the first battery found under a sysfs power-supply root
pub(crate) fn read_sysfs(root: &Path) -> BatlogResult<BatteryStatus> {
    for name in SYSFS_BATTERIES {
        let base = root.join(name);
        if !base.exists() {
            continue;
        }

        let capacity = fs::read_to_string(base.join("capacity"))?;
        let status = fs::read_to_string(base.join("status"))?;

        let level = capacity.trim().parse::<i64>().map_err(|_| {
            BatlogError::parse_error(&format!("Invalid capacity '{}'", capacity.trim()))
        })?;
        let direction = Direction::parse(&status).unwrap_or(Direction::Unknown);

        return Ok(BatteryStatus {
            level,
            direction,
            time_remaining: UNKNOWN_REMAINING.to_string(),
        });
    }

    Err(BatlogError::resource_access_error(&format!(
        "no battery under {}",
        root.display()
    )))
}

/// List processes with `ps aux --sort=-%mem`
pub(crate) async fn read_top_processes(count: usize) -> BatlogResult<Vec<String>> {
    let output = tokio::process::Command::new("ps")
        .args(["aux", "--sort=-%mem"])
        .output()
        .await
        .map_err(|e| BatlogError::resource_access_error(&format!("ps: {e}")))?;

    if !output.status.success() {
        return Err(BatlogError::resource_access_error(&format!(
            "ps exited with {}",
            output.status
        )));
    }

    Ok(parse_ps_aux(&String::from_utf8_lossy(&output.stdout), count))
}

/// Take the command column of `ps aux` output, skipping the header and `ps`
pub(crate) fn parse_ps_aux(output: &str, count: usize) -> Vec<String> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().nth(10))
        .map(process_basename)
        .filter(|name| *name != "ps")
        .take(count)
        .map(str::to_string)
        .collect()
}
