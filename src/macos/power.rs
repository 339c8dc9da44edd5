//! macOS battery and process readers
//!
//! The battery is read with `pmset -g batt`; processes come from `ps -axm`,
//! which sorts by resident memory.

use crate::error::{BatlogError, BatlogResult};
use crate::platform::{BatteryStatus, process_basename};
use crate::sample::{Direction, UNKNOWN_REMAINING};
use tokio::process::Command;

/// Read the battery through `pmset -g batt`
pub(crate) async fn read_pmset() -> BatlogResult<BatteryStatus> {
    let output = Command::new("pmset")
        .args(["-g", "batt"])
        .output()
        .await
        .map_err(|e| BatlogError::resource_access_error(&format!("pmset: {e}")))?;

    if !output.status.success() {
        return Err(BatlogError::resource_access_error(&format!(
            "pmset exited with {}",
            output.status
        )));
    }

    parse_pmset_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `pmset -g batt` output
///
/// Expected shape:
///
/// ```text
/// Now drawing from 'Battery Power'
///  -InternalBattery-0 (id=4653155)	85%; discharging; 3:12 remaining present: true
/// ```
pub(crate) fn parse_pmset_output(output: &str) -> BatlogResult<BatteryStatus> {
    let line = output
        .lines()
        .find(|line| line.contains("InternalBattery"))
        .ok_or_else(|| BatlogError::parse_error("No internal battery in pmset output"))?;

    // Everything after the tab is `level; status; remaining`
    let details = line
        .split_once('\t')
        .map(|(_, details)| details)
        .unwrap_or(line);
    let parts: Vec<&str> = details.split(';').map(str::trim).collect();
    if parts.len() < 2 {
        return Err(BatlogError::parse_error(&format!(
            "Incomplete pmset battery line: {line}"
        )));
    }

    let level_token = parts[0]
        .split_whitespace()
        .find(|token| token.ends_with('%'))
        .ok_or_else(|| BatlogError::parse_error(&format!("No level in pmset line: {line}")))?;
    let level = level_token
        .trim_end_matches('%')
        .parse::<i64>()
        .map_err(|_| BatlogError::parse_error(&format!("Invalid pmset level '{level_token}'")))?;

    let direction = pmset_direction(parts[1]);

    let time_remaining = parts
        .get(2)
        .map(|remaining| {
            remaining
                .split(" present:")
                .next()
                .unwrap_or_default()
                .trim()
        })
        .filter(|remaining| !remaining.is_empty())
        .unwrap_or(UNKNOWN_REMAINING)
        .to_string();

    Ok(BatteryStatus {
        level,
        direction,
        time_remaining,
    })
}

/// Map a pmset status word onto a direction
fn pmset_direction(status: &str) -> Direction {
    match status.trim().to_ascii_lowercase().as_str() {
        "charging" | "finishing charge" => Direction::Charging,
        "discharging" => Direction::Discharging,
        "charged" => Direction::Other("Full".to_string()),
        "ac attached" => Direction::Other("Not charging".to_string()),
        _ => Direction::Unknown,
    }
}

/// List processes with `ps -axm -o comm`
pub(crate) async fn read_top_processes(count: usize) -> BatlogResult<Vec<String>> {
    let output = Command::new("ps")
        .args(["-axm", "-o", "comm"])
        .output()
        .await
        .map_err(|e| BatlogError::resource_access_error(&format!("ps: {e}")))?;

    if !output.status.success() {
        return Err(BatlogError::resource_access_error(&format!(
            "ps exited with {}",
            output.status
        )));
    }

    Ok(parse_ps_comm(&String::from_utf8_lossy(&output.stdout), count))
}

/// Take process names from `ps -o comm` output, skipping the header and `ps`
pub(crate) fn parse_ps_comm(output: &str, count: usize) -> Vec<String> {
    output
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(process_basename)
        .filter(|name| *name != "ps")
        .take(count)
        .map(str::to_string)
        .collect()
}
