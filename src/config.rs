//! Runtime configuration
//!
//! Every setting has a default and can be overridden through a `BATLOG_*`
//! environment variable; command line flags override both.
//!
//! ```bash
//! export BATLOG_LOG_FILE=~/.battery_status.log
//! export BATLOG_INTERVAL_SECS=60
//! export BATLOG_MAX_WIDTH=100
//! export BATLOG_MAX_HEIGHT=10
//! export BATLOG_WINDOW=5000
//! ```

use crate::error::{BatlogError, BatlogResult};
use crate::render::{DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH, RenderConfig};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_LOG_FILE: &str = "BATLOG_LOG_FILE";
pub const ENV_INTERVAL_SECS: &str = "BATLOG_INTERVAL_SECS";
pub const ENV_MAX_WIDTH: &str = "BATLOG_MAX_WIDTH";
pub const ENV_MAX_HEIGHT: &str = "BATLOG_MAX_HEIGHT";
pub const ENV_WINDOW: &str = "BATLOG_WINDOW";

pub const DEFAULT_LOG_FILE: &str = "battery_status.log";
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Resolved settings for one run of the tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log_file: PathBuf,
    /// Time between two samples in monitor mode
    pub interval: Duration,
    pub render: RenderConfig,
    /// Only the last `window` records are summarized when set
    pub window: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            render: RenderConfig::default(),
            window: None,
        }
    }
}

impl Config {
    /// Load from the process environment
    pub fn from_env() -> BatlogResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variable names
    pub fn from_lookup<F>(lookup: F) -> BatlogResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_file = lookup(ENV_LOG_FILE)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));

        let interval_secs = parse_var(&lookup, ENV_INTERVAL_SECS)?.unwrap_or(DEFAULT_INTERVAL_SECS);
        let max_width = parse_var(&lookup, ENV_MAX_WIDTH)?.unwrap_or(DEFAULT_MAX_WIDTH);
        let max_height = parse_var(&lookup, ENV_MAX_HEIGHT)?.unwrap_or(DEFAULT_MAX_HEIGHT);
        let window = parse_var(&lookup, ENV_WINDOW)?;

        let config = Config {
            log_file,
            interval: Duration::from_secs(interval_secs),
            render: RenderConfig {
                max_width,
                max_height,
            },
            window,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BatlogResult<()> {
        if self.interval.is_zero() {
            return Err(BatlogError::invalid_configuration(
                "sampling interval must be positive",
            ));
        }
        if self.window == Some(0) {
            return Err(BatlogError::invalid_configuration(
                "window must be positive",
            ));
        }
        self.render.validate()
    }
}

/// Parse an optional variable, treating an empty value as unset
fn parse_var<F, T>(lookup: &F, key: &str) -> BatlogResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse::<T>().map(Some).map_err(|_| {
            BatlogError::invalid_configuration(&format!("{key} has invalid value '{raw}'"))
        }),
        _ => Ok(None),
    }
}
