//! Battery samples
//!
//! A [`Sample`] is one observation of the power source plus the processes that
//! held the most memory at that instant. Samples are persisted one per record
//! in the shape `timestamp, level, direction, timeRemaining, p1, p2, p3`.

use crate::error::{BatlogError, BatlogResult};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp format used in the sample log
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Placeholder used when the OS does not report a remaining time
pub const UNKNOWN_REMAINING: &str = "Unknown";

/// Maximum number of processes recorded with one sample
pub const MAX_PROCESSES: usize = 3;

/// Lowest level a sample may carry; a reported 0% is raised to this
pub const MIN_LEVEL: u8 = 1;

/// Highest level a sample may carry
pub const MAX_LEVEL: u8 = 100;

/// Wall-clock time of an observation
///
/// Well-formed log entries carry a local date-time. Anything else is kept
/// verbatim so that hand-edited or foreign logs still segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    At(NaiveDateTime),
    Raw(String),
}

impl Timestamp {
    /// Current local time, truncated to whole seconds
    pub fn now() -> Self {
        let now = Local::now().naive_local();
        // Round-trip through the log format to drop sub-second precision
        Self::parse(&now.format(TIMESTAMP_FORMAT).to_string())
    }

    /// Parse a timestamp field, falling back to the raw text
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT) {
            Ok(at) => Timestamp::At(at),
            Err(_) => Timestamp::Raw(raw.to_string()),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::At(at) => write!(f, "{}", at.format(TIMESTAMP_FORMAT)),
            Timestamp::Raw(raw) => f.write_str(raw),
        }
    }
}

/// Direction of the power source
///
/// Comparison is by exact value: `Unknown` and every `Other` status are
/// ordinary directions that open their own sections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Direction {
    Charging,
    Discharging,
    Unknown,
    /// Any other status word the OS reports, e.g. `Full` or `Not charging`
    Other(String),
}

impl Direction {
    /// Parse a status word, returning `None` when it is empty
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let direction = match raw.to_ascii_lowercase().as_str() {
            "charging" => Direction::Charging,
            "discharging" => Direction::Discharging,
            "unknown" => Direction::Unknown,
            _ => Direction::Other(raw.to_string()),
        };
        Some(direction)
    }
}

impl From<String> for Direction {
    fn from(value: String) -> Self {
        Direction::parse(&value).unwrap_or(Direction::Unknown)
    }
}

impl From<Direction> for String {
    fn from(value: Direction) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Charging => f.write_str("Charging"),
            Direction::Discharging => f.write_str("Discharging"),
            Direction::Unknown => f.write_str("Unknown"),
            Direction::Other(status) => f.write_str(status),
        }
    }
}

/// One observation of the power source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: Timestamp,
    /// Charge level in percent, always within `[MIN_LEVEL, MAX_LEVEL]`
    pub level: u8,
    pub direction: Direction,
    pub time_remaining: String,
    /// Most memory-hungry processes first, at most [`MAX_PROCESSES`]
    pub processes: Vec<String>,
}

impl Sample {
    /// Create a sample, clamping the level and truncating the process list
    pub fn new(
        timestamp: Timestamp,
        level: i64,
        direction: Direction,
        time_remaining: impl Into<String>,
        processes: Vec<String>,
    ) -> Self {
        let mut processes = processes;
        processes.truncate(MAX_PROCESSES);

        Sample {
            timestamp,
            level: clamp_level(level),
            direction,
            time_remaining: time_remaining.into(),
            processes,
        }
    }

    /// Parse one persisted record
    ///
    /// `line` is the 1-based record number, used only for error reporting.
    /// Records need at least a timestamp, a level and a direction; the
    /// remaining time and process columns are optional.
    pub fn from_record<S: AsRef<str>>(line: usize, fields: &[S]) -> BatlogResult<Self> {
        if fields.len() < 2 {
            return Err(BatlogError::malformed_sample(
                line,
                &format!("expected at least 2 fields, found {}", fields.len()),
            ));
        }

        let timestamp = Timestamp::parse(fields[0].as_ref());
        let level = parse_level(fields[1].as_ref())
            .ok_or_else(|| {
                BatlogError::malformed_sample(
                    line,
                    &format!("invalid level '{}'", fields[1].as_ref().trim()),
                )
            })?;
        let direction = fields
            .get(2)
            .and_then(|field| Direction::parse(field.as_ref()))
            .ok_or_else(|| BatlogError::malformed_sample(line, "missing direction"))?;

        let time_remaining = fields
            .get(3)
            .map(|field| field.as_ref().trim())
            .filter(|field| !field.is_empty())
            .unwrap_or(UNKNOWN_REMAINING)
            .to_string();

        let processes = fields
            .iter()
            .skip(4)
            .take(MAX_PROCESSES)
            .map(|field| field.as_ref().trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Sample::new(
            timestamp,
            level,
            direction,
            time_remaining,
            processes,
        ))
    }

    /// Fields in persisted record order
    pub fn to_record(&self) -> Vec<String> {
        let mut record = vec![
            self.timestamp.to_string(),
            self.level.to_string(),
            self.direction.to_string(),
            self.time_remaining.clone(),
        ];
        record.extend(self.processes.iter().cloned());
        record
    }
}

/// One raw persisted record, as read back from the sample log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 1-based position in the log
    pub line: usize,
    pub fields: Vec<String>,
}

impl Record {
    pub fn new(line: usize, fields: Vec<String>) -> Self {
        Record { line, fields }
    }

    /// Parse into a sample, see [`Sample::from_record`]
    pub fn parse(&self) -> BatlogResult<Sample> {
        Sample::from_record(self.line, &self.fields)
    }
}

/// Parse a level field such as `85` or `85%`
fn parse_level(raw: &str) -> Option<i64> {
    raw.trim().trim_end_matches('%').trim().parse::<i64>().ok()
}

/// Clamp a reported level into `[MIN_LEVEL, MAX_LEVEL]`
pub fn clamp_level(level: i64) -> u8 {
    level.clamp(MIN_LEVEL as i64, MAX_LEVEL as i64) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_full_record_parsing() {
        let fields = record(&[
            "2024-03-01 10:00:00",
            "85%",
            "Discharging",
            "01:23:45 remaining",
            "firefox",
            "code",
            "slack",
        ]);
        let sample = Sample::from_record(1, &fields).unwrap();

        assert_eq!(
            sample.timestamp,
            Timestamp::At(
                NaiveDateTime::parse_from_str("2024-03-01 10:00:00", TIMESTAMP_FORMAT).unwrap()
            )
        );
        assert_eq!(sample.level, 85);
        assert_eq!(sample.direction, Direction::Discharging);
        assert_eq!(sample.time_remaining, "01:23:45 remaining");
        assert_eq!(sample.processes, vec!["firefox", "code", "slack"]);
    }

    #[test]
    fn test_level_without_percent_sign() {
        let sample = Sample::from_record(1, &["t", "42", "Charging"]).unwrap();
        assert_eq!(sample.level, 42);
        assert!(sample.processes.is_empty());
        assert_eq!(sample.time_remaining, UNKNOWN_REMAINING);
    }

    #[test]
    fn test_zero_level_is_raised_to_one() {
        let sample = Sample::from_record(1, &["t", "0%", "Discharging"]).unwrap();
        assert_eq!(sample.level, MIN_LEVEL);
    }

    #[test]
    fn test_level_above_hundred_is_clamped() {
        let sample = Sample::from_record(1, &["t", "104", "Charging"]).unwrap();
        assert_eq!(sample.level, MAX_LEVEL);
    }

    #[test]
    fn test_too_few_fields_rejected() {
        let err = Sample::from_record(3, &["2024-03-01 10:00:00"]).unwrap_err();
        assert!(matches!(err, BatlogError::MalformedSample { line: 3, .. }));
    }

    #[test]
    fn test_missing_direction_rejected() {
        let err = Sample::from_record(2, &["t", "50"]).unwrap_err();
        assert!(err.to_string().contains("missing direction"));

        let err = Sample::from_record(2, &["t", "50", "  "]).unwrap_err();
        assert!(err.to_string().contains("missing direction"));
    }

    #[test]
    fn test_unparseable_level_rejected() {
        let err = Sample::from_record(5, &["t", "abc%", "Charging"]).unwrap_err();
        assert!(matches!(err, BatlogError::MalformedSample { line: 5, .. }));
        assert!(err.to_string().contains("abc%"));
    }

    #[test]
    fn test_short_process_list() {
        let sample =
            Sample::from_record(1, &["t", "60", "Charging", "Unknown", "firefox", ""]).unwrap();
        assert_eq!(sample.processes, vec!["firefox"]);
    }

    #[test]
    fn test_extra_fields_ignored() {
        let sample =
            Sample::from_record(1, &["t", "60", "Charging", "x", "a", "b", "c", "d"]).unwrap();
        assert_eq!(sample.processes, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!(Direction::parse("Charging"), Some(Direction::Charging));
        assert_eq!(Direction::parse("discharging"), Some(Direction::Discharging));
        assert_eq!(Direction::parse(" Unknown "), Some(Direction::Unknown));
        assert_eq!(
            Direction::parse("Full"),
            Some(Direction::Other("Full".to_string()))
        );
        assert_eq!(Direction::parse(""), None);
        assert_eq!(Direction::Other("Not charging".into()).to_string(), "Not charging");
    }

    #[test]
    fn test_raw_timestamp_kept_verbatim() {
        let ts = Timestamp::parse("yesterday noon");
        assert_eq!(ts, Timestamp::Raw("yesterday noon".to_string()));
        assert_eq!(ts.to_string(), "yesterday noon");
    }

    #[test]
    fn test_to_record_matches_log_shape() {
        let sample = Sample::new(
            Timestamp::parse("2024-03-01 10:00:00"),
            77,
            Direction::Charging,
            "00:40:00 until charged",
            vec!["code".into()],
        );
        assert_eq!(
            sample.to_record(),
            vec![
                "2024-03-01 10:00:00",
                "77",
                "Charging",
                "00:40:00 until charged",
                "code"
            ]
        );
    }

    #[test]
    fn test_direction_serialization() {
        let json = serde_json::to_string(&Direction::Discharging).unwrap();
        assert_eq!(json, "\"Discharging\"");

        let other: Direction = serde_json::from_str("\"Full\"").unwrap();
        assert_eq!(other, Direction::Other("Full".to_string()));
    }
}
