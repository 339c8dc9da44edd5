//! Append-only sample log
//!
//! One sample per line, fields joined by commas in the order
//! `timestamp, level, direction, timeRemaining, p1, p2, p3`.

use crate::error::BatlogResult;
use crate::sample::{Record, Sample};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Sample log on disk
#[derive(Debug, Clone)]
pub struct SampleLog {
    path: PathBuf,
}

impl SampleLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SampleLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one sample, creating the log if needed
    pub fn append(&self, sample: &Sample) -> BatlogResult<()> {
        let line = sample
            .to_record()
            .iter()
            .map(|field| sanitize_field(field))
            .collect::<Vec<_>>()
            .join(",");

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;

        tracing::debug!("Appended sample to {}: {line}", self.path.display());
        Ok(())
    }

    /// Every non-empty line of the log; a missing log reads as empty
    pub fn read_records(&self) -> BatlogResult<Vec<Record>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!("Sample log {} does not exist yet", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        Ok(parse_records(&content))
    }

    /// Records, keeping only the last `window` when a window is given
    pub fn load(&self, window: Option<usize>) -> BatlogResult<Vec<Record>> {
        let mut records = self.read_records()?;
        if let Some(window) = window {
            let excess = records.len().saturating_sub(window);
            records.drain(..excess);
        }
        Ok(records)
    }

    /// Last well-formed sample in the log
    pub fn last_sample(&self) -> BatlogResult<Option<Sample>> {
        Ok(self
            .read_records()?
            .iter()
            .rev()
            .find_map(|record| record.parse().ok()))
    }

    /// Whether `sample` differs from the last logged one in level or direction
    ///
    /// Only changes are logged, so an empty or missing log always accepts.
    pub fn should_append(&self, sample: &Sample) -> BatlogResult<bool> {
        Ok(match self.last_sample()? {
            Some(last) => last.level != sample.level || last.direction != sample.direction,
            None => true,
        })
    }
}

/// Split log content into records, numbering lines from 1
fn parse_records(content: &str) -> Vec<Record> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            let fields = line.split(',').map(|f| f.trim().to_string()).collect();
            Record::new(index + 1, fields)
        })
        .collect()
}

/// Fields must not contain the separator or line breaks
fn sanitize_field(field: &str) -> String {
    field
        .chars()
        .map(|c| if matches!(c, ',' | '\n' | '\r') { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{Direction, Timestamp};
    use tempfile::TempDir;

    fn sample(time: &str, level: i64, direction: Direction) -> Sample {
        Sample::new(
            Timestamp::parse(time),
            level,
            direction,
            "01:00:00 remaining",
            vec!["firefox".into(), "code".into()],
        )
    }

    fn log_in(dir: &TempDir) -> SampleLog {
        SampleLog::new(dir.path().join("battery_status.log"))
    }

    #[test]
    fn test_missing_log_reads_empty() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);

        assert!(log.read_records().unwrap().is_empty());
        assert!(log.last_sample().unwrap().is_none());
    }

    #[test]
    fn test_append_and_read_back() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);

        let first = sample("2024-03-01 10:00:00", 80, Direction::Discharging);
        let second = sample("2024-03-01 10:01:00", 79, Direction::Discharging);
        log.append(&first).unwrap();
        log.append(&second).unwrap();

        let content = fs::read_to_string(log.path()).unwrap();
        assert_eq!(
            content,
            "2024-03-01 10:00:00,80,Discharging,01:00:00 remaining,firefox,code\n\
             2024-03-01 10:01:00,79,Discharging,01:00:00 remaining,firefox,code\n"
        );

        let records = log.read_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].line, 2);
        assert_eq!(records[0].parse().unwrap(), first);
        assert_eq!(log.last_sample().unwrap(), Some(second));
    }

    #[test]
    fn test_commas_in_fields_are_replaced() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);

        let odd = Sample::new(
            Timestamp::parse("2024-03-01 10:00:00"),
            50,
            Direction::Charging,
            "rate information unavailable, sorry",
            vec!["weird,name".into()],
        );
        log.append(&odd).unwrap();

        let records = log.read_records().unwrap();
        assert_eq!(records[0].fields.len(), 5);
        assert_eq!(records[0].fields[4], "weird name");
    }

    #[test]
    fn test_blank_lines_keep_numbering() {
        let records = parse_records("a,1,Charging\n\n b , 2% ,Discharging\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].line, 3);
        assert_eq!(records[1].fields, vec!["b", "2%", "Discharging"]);
    }

    #[test]
    fn test_should_append_only_on_change() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);

        let first = sample("2024-03-01 10:00:00", 80, Direction::Discharging);
        assert!(log.should_append(&first).unwrap());
        log.append(&first).unwrap();

        let same = sample("2024-03-01 10:01:00", 80, Direction::Discharging);
        assert!(!log.should_append(&same).unwrap());

        let lower = sample("2024-03-01 10:02:00", 79, Direction::Discharging);
        assert!(log.should_append(&lower).unwrap());

        let plugged = sample("2024-03-01 10:02:00", 80, Direction::Charging);
        assert!(log.should_append(&plugged).unwrap());
    }

    #[test]
    fn test_last_sample_skips_malformed_tail() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        fs::write(
            log.path(),
            "2024-03-01 10:00:00,80,Discharging,Unknown\ngarbage\n",
        )
        .unwrap();

        let last = log.last_sample().unwrap().unwrap();
        assert_eq!(last.level, 80);
    }

    #[test]
    fn test_load_window_keeps_latest_records() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        for level in (70..80).rev() {
            log.append(&sample("2024-03-01 10:00:00", level, Direction::Discharging))
                .unwrap();
        }

        let all = log.load(None).unwrap();
        assert_eq!(all.len(), 10);

        let recent = log.load(Some(3)).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].line, 8);
        assert_eq!(recent[2].fields[1], "70");

        assert_eq!(log.load(Some(50)).unwrap().len(), 10);
    }
}
