use super::power::{read_pmset, read_top_processes};
use crate::error::BatlogResult;
use crate::platform::{BatteryStatus, PowerSource};

/// macOS power source
#[derive(Debug, Clone)]
pub struct MacSampler;

impl PowerSource for MacSampler {
    async fn battery_status(&self) -> BatlogResult<BatteryStatus> {
        read_pmset().await
    }

    async fn top_processes(&self, count: usize) -> BatlogResult<Vec<String>> {
        read_top_processes(count).await
    }
}
