//! Segmentation of a sample history into sections
//!
//! A [`Section`] is a maximal run of adjacent samples sharing one
//! [`Direction`]. Segmentation is plain run-length encoding: every direction
//! change closes the current section, even when the old direction comes back
//! on the very next sample.
//!
//! Adjacent sections share their boundary level. A closed section ends at the
//! level of its last sample, and the following section starts from that same
//! level, so walking the sections end to end traces one continuous curve.

use crate::error::BatlogError;
use crate::sample::{Direction, Record, Sample, Timestamp};
use serde::{Deserialize, Serialize};

/// Number of process slots reported per section
pub const TOP_PROCESS_SLOTS: usize = 3;

/// Filler for process slots a section has no process for
pub const NOT_AVAILABLE: &str = "N/A";

/// How often one process was seen within a section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessTally {
    pub name: String,
    pub count: usize,
}

/// A maximal run of same-direction samples
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub direction: Direction,
    pub start_level: u8,
    pub end_level: u8,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    /// Lowest level the run passed through, boundary level included
    pub low_level: u8,
    /// Highest level the run passed through, boundary level included
    pub high_level: u8,
    /// Process appearances, in first-seen order
    pub process_frequency: Vec<ProcessTally>,
    /// Number of input samples that belong to this run
    pub sample_count: usize,
}

impl Section {
    /// All processes seen in the run, most frequent first
    ///
    /// Ties keep first-seen order.
    pub fn ranked_processes(&self) -> Vec<&ProcessTally> {
        let mut ranked: Vec<&ProcessTally> = self.process_frequency.iter().collect();
        // sort_by is stable, which is what keeps ties in first-seen order
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked
    }

    /// Names of the top processes, always exactly [`TOP_PROCESS_SLOTS`] long
    pub fn top_processes(&self) -> [String; TOP_PROCESS_SLOTS] {
        let ranked = self.ranked_processes();
        std::array::from_fn(|slot| {
            ranked
                .get(slot)
                .map(|tally| tally.name.clone())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        })
    }

    /// Signed level change over the run
    pub fn level_delta(&self) -> i16 {
        self.end_level as i16 - self.start_level as i16
    }

    /// Elapsed time, when both ends carry a parsed date-time
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (&self.start_time, &self.end_time) {
            (Timestamp::At(start), Timestamp::At(end)) => Some(*end - *start),
            _ => None,
        }
    }
}

/// Accumulator for the section currently being built
#[derive(Debug, Clone)]
pub struct SectionBuilder {
    direction: Direction,
    start_level: u8,
    start_time: Timestamp,
    last_level: u8,
    last_time: Timestamp,
    low_level: u8,
    high_level: u8,
    tally: Vec<ProcessTally>,
    sample_count: usize,
}

impl SectionBuilder {
    /// Open a section on `sample`, starting the curve at `start_level`
    fn open(sample: &Sample, start_level: u8) -> Self {
        let mut builder = SectionBuilder {
            direction: sample.direction.clone(),
            start_level,
            start_time: sample.timestamp.clone(),
            last_level: start_level,
            last_time: sample.timestamp.clone(),
            low_level: start_level,
            high_level: start_level,
            tally: Vec::new(),
            sample_count: 0,
        };
        builder.absorb(sample);
        builder
    }

    /// Fold one same-direction sample into the run
    fn absorb(&mut self, sample: &Sample) {
        self.last_level = sample.level;
        self.last_time = sample.timestamp.clone();
        self.low_level = self.low_level.min(sample.level);
        self.high_level = self.high_level.max(sample.level);
        self.sample_count += 1;

        for name in &sample.processes {
            match self.tally.iter_mut().find(|tally| &tally.name == name) {
                Some(tally) => tally.count += 1,
                None => self.tally.push(ProcessTally {
                    name: name.clone(),
                    count: 1,
                }),
            }
        }
    }

    fn close(self) -> Section {
        Section {
            direction: self.direction,
            start_level: self.start_level,
            end_level: self.last_level,
            start_time: self.start_time,
            end_time: self.last_time,
            low_level: self.low_level,
            high_level: self.high_level,
            process_frequency: self.tally,
            sample_count: self.sample_count,
        }
    }
}

/// Incremental segmenter
///
/// Samples are pushed one at a time in timestamp order; [`Segmenter::finish`]
/// closes the open section and returns every section in order.
#[derive(Debug, Default)]
pub struct Segmenter {
    sections: Vec<Section>,
    current: Option<SectionBuilder>,
}

impl Segmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one sample into the history
    pub fn push(&mut self, sample: &Sample) {
        self.current = Some(match self.current.take() {
            Some(mut builder) if builder.direction == sample.direction => {
                builder.absorb(sample);
                builder
            }
            Some(builder) => {
                let boundary = builder.last_level;
                self.sections.push(builder.close());
                SectionBuilder::open(sample, boundary)
            }
            None => SectionBuilder::open(sample, sample.level),
        });
    }

    /// Close the open section, if any, and return all sections
    pub fn finish(mut self) -> Vec<Section> {
        if let Some(builder) = self.current.take() {
            self.sections.push(builder.close());
        }
        self.sections
    }
}

/// Split a sample history into sections
pub fn segment(samples: &[Sample]) -> Vec<Section> {
    let mut segmenter = Segmenter::new();
    for sample in samples {
        segmenter.push(sample);
    }
    segmenter.finish()
}

/// Result of segmenting raw log records
#[derive(Debug, Default)]
pub struct Segmentation {
    pub sections: Vec<Section>,
    /// One [`BatlogError::MalformedSample`] per record that was skipped
    pub skipped: Vec<BatlogError>,
}

impl Segmentation {
    /// Number of well-formed samples the sections cover
    pub fn sample_count(&self) -> usize {
        self.sections.iter().map(|section| section.sample_count).sum()
    }
}

/// Parse and segment raw log records
///
/// Malformed records are skipped as if they were absent: they never open or
/// close a section. Each one is logged as a warning and reported back in
/// [`Segmentation::skipped`].
pub fn segment_records(records: &[Record]) -> Segmentation {
    let mut segmenter = Segmenter::new();
    let mut skipped = Vec::new();

    for record in records {
        match record.parse() {
            Ok(sample) => segmenter.push(&sample),
            Err(e) => {
                tracing::warn!("Skipping malformed record {:?}: {e}", record.fields);
                skipped.push(e);
            }
        }
    }

    Segmentation {
        sections: segmenter.finish(),
        skipped,
    }
}
