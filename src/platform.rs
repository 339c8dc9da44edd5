//! Platform sampling
//!
//! Picks the OS-specific power source and combines its battery reading with
//! the current top memory consumers into a timestamped [`Sample`].

use crate::error::{BatlogError, BatlogResult};
use crate::sample::{Direction, MAX_PROCESSES, Sample, Timestamp};
use serde::{Deserialize, Serialize};

#[cfg(target_os = "linux")]
use crate::linux;
#[cfg(target_os = "macos")]
use crate::macos;

/// Battery state as reported by the OS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryStatus {
    /// Raw percentage, clamped only when turned into a [`Sample`]
    pub level: i64,
    pub direction: Direction,
    pub time_remaining: String,
}

/// Power source provider trait
pub(crate) trait PowerSource {
    /// Read the current battery state
    async fn battery_status(&self) -> BatlogResult<BatteryStatus>;
    /// Names of the `count` processes holding the most memory, largest first
    async fn top_processes(&self, count: usize) -> BatlogResult<Vec<String>>;
}

/// Platform-specific sampler enum
#[derive(Debug, Clone)]
pub enum Sampler {
    #[cfg(target_os = "linux")]
    Linux(linux::LinuxSampler),
    #[cfg(target_os = "macos")]
    MacOS(macos::MacSampler),
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    Unsupported,
}

impl Sampler {
    /// Read the current battery state
    pub async fn battery_status(&self) -> BatlogResult<BatteryStatus> {
        match self {
            #[cfg(target_os = "linux")]
            Sampler::Linux(sampler) => sampler.battery_status().await,
            #[cfg(target_os = "macos")]
            Sampler::MacOS(sampler) => sampler.battery_status().await,
            #[cfg(not(any(target_os = "linux", target_os = "macos")))]
            Sampler::Unsupported => Err(BatlogError::unsupported_platform(get_platform_name())),
        }
    }

    /// Names of the `count` processes holding the most memory
    pub async fn top_processes(&self, count: usize) -> BatlogResult<Vec<String>> {
        match self {
            #[cfg(target_os = "linux")]
            Sampler::Linux(sampler) => sampler.top_processes(count).await,
            #[cfg(target_os = "macos")]
            Sampler::MacOS(sampler) => sampler.top_processes(count).await,
            #[cfg(not(any(target_os = "linux", target_os = "macos")))]
            Sampler::Unsupported => Err(BatlogError::unsupported_platform(get_platform_name())),
        }
    }

    /// Take one timestamped sample
    ///
    /// The battery and process queries run concurrently. A failed process
    /// query still yields a sample with an empty process list.
    pub async fn take_sample(&self) -> BatlogResult<Sample> {
        let (battery_result, processes_result) =
            tokio::join!(self.battery_status(), self.top_processes(MAX_PROCESSES));

        let battery = battery_result?;
        let processes = processes_result.unwrap_or_else(|e| {
            tracing::warn!("Failed to read top processes: {e}");
            Vec::new()
        });

        Ok(Sample::new(
            Timestamp::now(),
            battery.level,
            battery.direction,
            battery.time_remaining,
            processes,
        ))
    }
}

/// Get the sampler for the current platform
pub fn get_sampler() -> Sampler {
    #[cfg(target_os = "linux")]
    {
        Sampler::Linux(linux::LinuxSampler::default())
    }
    #[cfg(target_os = "macos")]
    {
        Sampler::MacOS(macos::MacSampler)
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        Sampler::Unsupported
    }
}

/// Check if sampling is supported on the current platform
pub fn check_platform() -> BatlogResult<()> {
    if is_supported_platform() {
        Ok(())
    } else {
        Err(BatlogError::unsupported_platform(get_platform_name()))
    }
}

/// Whether the current platform has a sampler
pub fn is_supported_platform() -> bool {
    cfg!(any(target_os = "linux", target_os = "macos"))
}

/// Get the current platform name
pub fn get_platform_name() -> &'static str {
    std::env::consts::OS
}

/// Strip directories from a command path, keeping the executable name
pub(crate) fn process_basename(command: &str) -> &str {
    command.rsplit('/').next().unwrap_or(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_platform_name() {
        let platform = get_platform_name();
        assert!(!platform.is_empty());

        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            assert!(platform == "linux" || platform == "macos");
        }
    }

    #[test]
    fn test_check_platform() {
        let result = check_platform();

        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            assert!(result.is_ok());
            assert!(is_supported_platform());
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            assert!(matches!(
                result,
                Err(BatlogError::UnsupportedPlatform { .. })
            ));
        }
    }

    #[test]
    fn test_get_sampler() {
        let sampler = get_sampler();

        #[cfg(target_os = "linux")]
        {
            assert!(matches!(sampler, Sampler::Linux(_)));
        }

        #[cfg(target_os = "macos")]
        {
            assert!(matches!(sampler, Sampler::MacOS(_)));
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            assert!(matches!(sampler, Sampler::Unsupported));
        }
    }

    #[test]
    fn test_process_basename() {
        assert_eq!(process_basename("/usr/lib/firefox/firefox"), "firefox");
        assert_eq!(process_basename("code"), "code");
        assert_eq!(process_basename("/Applications/Slack.app/Contents/MacOS/Slack"), "Slack");
    }

    #[tokio::test]
    async fn test_take_sample() {
        // Test machines often have no battery; only check well-formed results
        match get_sampler().take_sample().await {
            Ok(sample) => {
                assert!((1..=100).contains(&sample.level));
                assert!(sample.processes.len() <= MAX_PROCESSES);
            }
            Err(e) => match e {
                BatlogError::ResourceAccessError { .. }
                | BatlogError::ParseError { .. }
                | BatlogError::IoError(_)
                | BatlogError::UnsupportedPlatform { .. } => {}
                _ => panic!("Unexpected error: {e}"),
            },
        }
    }
}
