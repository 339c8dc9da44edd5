//! # batlog - Battery History Logger
//!
//! Samples the battery level, charging direction and top memory consumers on
//! a fixed interval, appends each sample to a log, and turns that log into an
//! ASCII sparkline of the charge level plus a digest of the latest
//! charge/discharge episode.
//!
//! ## Quick Start
//!
//! ### Summarizing samples
//!
//! ```rust
//! use batlog::{Direction, Sample, Timestamp, render, segment};
//!
//! let samples = vec![
//!     Sample::new(Timestamp::parse("2024-03-01 09:00:00"), 40, Direction::Discharging, "1:00", vec![]),
//!     Sample::new(Timestamp::parse("2024-03-01 09:10:00"), 35, Direction::Discharging, "0:50", vec![]),
//!     Sample::new(Timestamp::parse("2024-03-01 09:20:00"), 60, Direction::Charging, "0:30", vec![]),
//! ];
//!
//! let sections = segment(&samples);
//! assert_eq!(sections.len(), 2);
//!
//! let rendering = render(&sections, 100, 10)?;
//! println!("{}", rendering.to_text());
//! # Ok::<(), batlog::BatlogError>(())
//! ```
//!
//! ### Taking a sample
//!
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> Result<(), batlog::BatlogError> {
//!     let sample = batlog::take_sample().await?;
//!     println!("{}% {}", sample.level, sample.direction);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! Data flows one way:
//!
//! 1. **Sampling**: the platform sampler reads `acpi`/sysfs on Linux or
//!    `pmset` on macOS, plus `ps` for processes
//! 2. **Logging**: samples are appended to the log only when the level or
//!    direction changed
//! 3. **Segmentation**: the log is folded into sections, maximal runs of one
//!    direction
//! 4. **Rendering**: sections become one quantized point per unit of level
//!    change, drawn as a fixed-height histogram
//!
//! ## Environment Variable Configuration
//!
//! ```bash
//! export BATLOG_LOG_FILE=battery_status.log
//! export BATLOG_INTERVAL_SECS=60
//! export BATLOG_MAX_WIDTH=100
//! export BATLOG_MAX_HEIGHT=10
//! ```
//!
//! ## Supported Platforms
//!
//! - **Linux**: `acpi -b`, falling back to `/sys/class/power_supply`
//! - **macOS**: `pmset -g batt`
//!
//! Segmentation and rendering work everywhere.

use serde::{Deserialize, Serialize};

pub mod config;
pub mod error;
pub mod linux;
pub mod macos;
pub mod monitor;
pub mod platform;
pub mod render;
pub mod sample;
pub mod segment;
pub mod store;

pub use config::Config;
pub use error::{BatlogError, BatlogResult};
pub use monitor::{Monitor, TickOutcome};
pub use platform::{BatteryStatus, Sampler, check_platform, get_platform_name, get_sampler};
pub use render::{RenderConfig, Rendering, Summary, render};
pub use sample::{Direction, Record, Sample, Timestamp};
pub use segment::{Section, Segmentation, Segmenter, segment, segment_records};
pub use store::SampleLog;

/// Outcome of summarizing a sample log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogReport {
    /// Records read from the log, after windowing
    pub records: usize,
    /// Records skipped as malformed
    pub skipped: usize,
    pub sections: usize,
    pub rendering: Rendering,
}

/// Segment and render raw records
///
/// Malformed records are skipped and counted; they never fail the call.
pub fn summarize_records(records: &[Record], config: &RenderConfig) -> BatlogResult<LogReport> {
    let segmentation = segment_records(records);
    let rendering = render(
        &segmentation.sections,
        config.max_width,
        config.max_height,
    )?;

    Ok(LogReport {
        records: records.len(),
        skipped: segmentation.skipped.len(),
        sections: segmentation.sections.len(),
        rendering,
    })
}

/// Read a sample log, keep the last `window` records, and summarize them
pub fn summarize_log(
    log: &SampleLog,
    window: Option<usize>,
    config: &RenderConfig,
) -> BatlogResult<LogReport> {
    config.validate()?;
    let records = log.load(window)?;
    summarize_records(&records, config)
}

/// Take one sample on the current platform (convenience function)
pub async fn take_sample() -> BatlogResult<Sample> {
    check_platform()?;
    get_sampler().take_sample().await
}
