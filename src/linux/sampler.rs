use super::power::{read_acpi, read_sysfs, read_top_processes};
use crate::error::{BatlogError, BatlogResult};
use crate::platform::{BatteryStatus, PowerSource};
use std::path::PathBuf;

const DEFAULT_SYSFS_ROOT: &str = "/sys/class/power_supply";

/// Linux power source
#[derive(Debug, Clone)]
pub struct LinuxSampler {
    /// Power-supply root probed when `acpi` is unavailable
    pub sysfs_root: PathBuf,
}

impl Default for LinuxSampler {
    fn default() -> Self {
        LinuxSampler {
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
        }
    }
}

impl PowerSource for LinuxSampler {
    async fn battery_status(&self) -> BatlogResult<BatteryStatus> {
        match read_acpi().await {
            Ok(status) => Ok(status),
            Err(acpi_error) => {
                tracing::debug!("acpi unavailable ({acpi_error}), falling back to sysfs");
                read_sysfs(&self.sysfs_root).map_err(|sysfs_error| {
                    BatlogError::resource_access_error(&format!(
                        "battery state (acpi: {acpi_error}; sysfs: {sysfs_error})"
                    ))
                })
            }
        }
    }

    async fn top_processes(&self, count: usize) -> BatlogResult<Vec<String>> {
        read_top_processes(count).await
    }
}
