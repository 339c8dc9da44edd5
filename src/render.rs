//! Sparkline rendering
//!
//! Sections are turned into quantized points, one per unit of level change,
//! and drawn as a fixed-height histogram followed by a digest of the most
//! recent section.

use crate::error::{BatlogError, BatlogResult};
use crate::sample::{Direction, MAX_LEVEL, Timestamp};
use crate::segment::{NOT_AVAILABLE, ProcessTally, Section, TOP_PROCESS_SLOTS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default number of points kept on screen
pub const DEFAULT_MAX_WIDTH: usize = 100;

/// Default number of rows above the axis
pub const DEFAULT_MAX_HEIGHT: u32 = 10;

const FILLED_GLYPH: char = '▪';
const EMPTY_GLYPH: char = '·';
const SEPARATOR_WIDTH: usize = 50;

/// Display bounds for a rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub max_width: usize,
    pub max_height: u32,
}

impl RenderConfig {
    /// Create a validated configuration
    pub fn new(max_width: usize, max_height: u32) -> BatlogResult<Self> {
        let config = RenderConfig {
            max_width,
            max_height,
        };
        config.validate()?;
        Ok(config)
    }

    /// Both bounds must be positive
    pub fn validate(&self) -> BatlogResult<()> {
        if self.max_width == 0 {
            return Err(BatlogError::invalid_configuration(
                "max_width must be positive",
            ));
        }
        if self.max_height == 0 {
            return Err(BatlogError::invalid_configuration(
                "max_height must be positive",
            ));
        }
        Ok(())
    }

    /// Percentage covered by one histogram row
    pub fn scale(&self) -> u32 {
        level_scale(self.max_height)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
        }
    }
}

fn level_scale(max_height: u32) -> u32 {
    (MAX_LEVEL as u32 / max_height.max(1)).max(1)
}

/// Map a level onto a histogram row: `floor(level / (100 / max_height))`
pub fn quantize(level: u8, max_height: u32) -> u32 {
    (level as u32 / level_scale(max_height)).min(max_height)
}

/// Quantized points for one section, one per integer level from start to end
///
/// A flat section still yields exactly one point.
pub fn section_points(section: &Section, max_height: u32) -> Vec<u32> {
    let (start, end) = (section.start_level, section.end_level);
    let levels: Vec<u8> = if end >= start {
        (start..=end).collect()
    } else {
        (end..=start).rev().collect()
    };

    levels
        .into_iter()
        .map(|level| quantize(level, max_height))
        .collect()
}

/// Digest of one section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub direction: Direction,
    pub start_level: u8,
    pub end_level: u8,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    /// At most [`TOP_PROCESS_SLOTS`] entries, most frequent first
    pub top_processes: Vec<ProcessTally>,
}

impl Summary {
    pub fn from_section(section: &Section) -> Self {
        Summary {
            direction: section.direction.clone(),
            start_level: section.start_level,
            end_level: section.end_level,
            start_time: section.start_time.clone(),
            end_time: section.end_time.clone(),
            top_processes: section
                .ranked_processes()
                .into_iter()
                .take(TOP_PROCESS_SLOTS)
                .cloned()
                .collect(),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Battery Status: {} ({}% → {}%)",
            self.direction, self.start_level, self.end_level
        )?;
        writeln!(f, "Time: {} → {}", self.start_time, self.end_time)?;

        let processes = if self.top_processes.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            self.top_processes
                .iter()
                .map(|tally| format!("{}({})", tally.name, tally.count))
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(f, "Top Processes: {processes}")
    }
}

/// Output of [`render`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendering {
    pub config: RenderConfig,
    /// Most recent history, at most `config.max_width` points
    pub points: Vec<u32>,
    /// Digest of the last section; `None` for an empty history
    pub summary: Option<Summary>,
}

impl Rendering {
    /// Histogram rows, top to bottom
    pub fn graph_lines(&self) -> Vec<String> {
        draw_histogram(&self.points, self.config.max_height)
    }

    /// Summary digest, empty for an empty history
    pub fn summary_text(&self) -> String {
        self.summary
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    /// Titled graph followed by the summary, or nothing for an empty history
    pub fn to_text(&self) -> String {
        if self.points.is_empty() {
            return String::new();
        }

        let separator = "-".repeat(SEPARATOR_WIDTH);
        let mut lines = vec!["Battery Level History:".to_string(), separator.clone()];
        lines.extend(self.graph_lines());
        lines.push(separator);
        lines.push(self.summary_text());
        lines.join("\n")
    }
}

/// Draw quantized points as rows from `max_height` down to the axis row `0`
///
/// Even rows carry their percentage as a label.
pub fn draw_histogram(points: &[u32], max_height: u32) -> Vec<String> {
    let scale = level_scale(max_height);

    (0..=max_height)
        .rev()
        .map(|height| {
            let mut line = if height % 2 == 0 {
                format!("{:3}% ", height * scale)
            } else {
                "    ".to_string()
            };
            line.extend(points.iter().map(|&point| {
                if point >= height {
                    FILLED_GLYPH
                } else {
                    EMPTY_GLYPH
                }
            }));
            line
        })
        .collect()
}

/// Render a section history
///
/// Points from all sections are concatenated in order; when there are more
/// than `max_width` of them only the most recent `max_width` are kept.
pub fn render(sections: &[Section], max_width: usize, max_height: u32) -> BatlogResult<Rendering> {
    let config = RenderConfig::new(max_width, max_height)?;

    let mut points: Vec<u32> = sections
        .iter()
        .flat_map(|section| section_points(section, max_height))
        .collect();

    if points.len() > max_width {
        let dropped = points.len() - max_width;
        tracing::debug!("Dropping {dropped} oldest points to fit width {max_width}");
        points.drain(..dropped);
    }

    Ok(Rendering {
        config,
        points,
        summary: sections.last().map(Summary::from_section),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Sample;
    use crate::segment::segment;

    fn section(direction: Direction, start_level: u8, end_level: u8) -> Section {
        Section {
            direction,
            start_level,
            end_level,
            start_time: Timestamp::parse("2024-03-01 10:00:00"),
            end_time: Timestamp::parse("2024-03-01 11:00:00"),
            low_level: start_level.min(end_level),
            high_level: start_level.max(end_level),
            process_frequency: Vec::new(),
            sample_count: 1,
        }
    }

    #[test]
    fn test_quantize() {
        assert_eq!(quantize(73, 10), 7);
        assert_eq!(quantize(100, 10), 10);
        assert_eq!(quantize(1, 10), 0);
        assert_eq!(quantize(73, 25), 18);
        // Heights beyond 100 fall back to one row per percent
        assert_eq!(quantize(73, 200), 73);
    }

    #[test]
    fn test_section_points_walk_every_level() {
        let rising = section(Direction::Charging, 20, 25);
        assert_eq!(section_points(&rising, 100), vec![20, 21, 22, 23, 24, 25]);

        let falling = section(Direction::Discharging, 25, 22);
        assert_eq!(section_points(&falling, 100), vec![25, 24, 23, 22]);
    }

    #[test]
    fn test_flat_section_yields_one_point() {
        let flat = section(Direction::Unknown, 64, 64);
        assert_eq!(section_points(&flat, 10), vec![6]);
    }

    #[test]
    fn test_empty_history() {
        let rendering = render(&[], 100, 10).unwrap();
        assert!(rendering.points.is_empty());
        assert!(rendering.summary.is_none());
        assert_eq!(rendering.summary_text(), "");
        assert_eq!(rendering.to_text(), "");
    }

    #[test]
    fn test_invalid_bounds() {
        let sections = vec![section(Direction::Charging, 10, 20)];
        assert!(matches!(
            render(&sections, 0, 10),
            Err(BatlogError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            render(&sections, 10, 0),
            Err(BatlogError::InvalidConfiguration { .. })
        ));
        assert!(render(&[], 0, 10).is_err());
    }

    #[test]
    fn test_truncation_keeps_most_recent_suffix() {
        let sections = vec![
            section(Direction::Discharging, 90, 40),
            section(Direction::Charging, 40, 70),
        ];
        let full = render(&sections, 1000, 100).unwrap().points;
        assert_eq!(full.len(), 51 + 31);

        let truncated = render(&sections, 20, 100).unwrap().points;
        assert_eq!(truncated.len(), 20);
        assert_eq!(truncated[..], full[full.len() - 20..]);
        assert_eq!(*truncated.last().unwrap(), 70);
    }

    #[test]
    fn test_no_truncation_when_fitting() {
        let sections = vec![section(Direction::Charging, 50, 52)];
        let rendering = render(&sections, 3, 100).unwrap();
        assert_eq!(rendering.points, vec![50, 51, 52]);
    }

    #[test]
    fn test_histogram_rows() {
        let lines = draw_histogram(&[0, 1, 2], 2);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "100% ··▪");
        assert_eq!(lines[1], "    ·▪▪");
        assert_eq!(lines[2], "  0% ▪▪▪");
    }

    #[test]
    fn test_histogram_labels_with_default_height() {
        let lines = draw_histogram(&[7], DEFAULT_MAX_HEIGHT);
        assert_eq!(lines.len(), 11);
        assert_eq!(lines[0], "100% ·");
        assert_eq!(lines[2], " 80% ·");
        assert_eq!(lines[3], "    ▪");
        assert_eq!(lines[10], "  0% ▪");
    }

    #[test]
    fn test_summary_of_last_section() {
        let samples = vec![
            Sample::new(
                Timestamp::parse("2024-03-01 09:00:00"),
                40,
                Direction::Discharging,
                "1:00",
                vec!["A".into()],
            ),
            Sample::new(
                Timestamp::parse("2024-03-01 09:10:00"),
                35,
                Direction::Discharging,
                "0:50",
                vec!["A".into(), "B".into()],
            ),
            Sample::new(
                Timestamp::parse("2024-03-01 09:20:00"),
                60,
                Direction::Charging,
                "0:30",
                vec!["B".into(), "C".into()],
            ),
            Sample::new(
                Timestamp::parse("2024-03-01 09:30:00"),
                62,
                Direction::Charging,
                "0:20",
                vec!["C".into(), "D".into(), "E".into()],
            ),
        ];
        let sections = segment(&samples);
        let rendering = render(&sections, 100, 10).unwrap();

        assert_eq!(
            rendering.summary_text(),
            "Battery Status: Charging (35% → 62%)\n\
             Time: 2024-03-01 09:20:00 → 2024-03-01 09:30:00\n\
             Top Processes: C(2), B(1), D(1)"
        );
    }

    #[test]
    fn test_summary_without_processes() {
        let rendering = render(&[section(Direction::Charging, 10, 12)], 100, 10).unwrap();
        assert!(rendering.summary_text().ends_with("Top Processes: N/A"));
    }

    #[test]
    fn test_full_text_layout() {
        let rendering = render(&[section(Direction::Discharging, 30, 28)], 100, 10).unwrap();
        let text = rendering.to_text();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Battery Level History:");
        assert_eq!(lines[1], "-".repeat(50));
        assert_eq!(lines[2], "100% ···");
        assert_eq!(lines[9], "    ▪··");
        assert_eq!(lines[10], " 20% ▪▪▪");
        assert_eq!(lines[13], "-".repeat(50));
        assert!(lines[14].starts_with("Battery Status: Discharging (30% → 28%)"));
    }

    #[test]
    fn test_rendering_serialization() {
        let rendering = render(&[section(Direction::Charging, 10, 11)], 100, 10).unwrap();
        let json = serde_json::to_value(&rendering).unwrap();
        assert_eq!(json["points"], serde_json::json!([1, 1]));
        assert_eq!(json["summary"]["direction"], "Charging");
        assert_eq!(json["config"]["max_width"], 100);
    }
}
