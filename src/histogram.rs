//! DRAM controller queue-length PDF collection.
//!
//! The simulator dumps one line per observed queue occupancy, e.g.
//! `system.mem_ctrl0.rdQLenPdf::5   42   # ...`. Lines are classified as read
//! or write by two patterns that each capture (controller, length, count),
//! and accumulated into sparse per-controller histograms. Unobserved lengths
//! are implicitly zero.

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_READ_PATTERN: &str = r"system\.(mem_ctrl\d+)\.rdQLenPdf::(\d+)\s+(\d+)";
pub const DEFAULT_WRITE_PATTERN: &str = r"system\.(mem_ctrl\d+)\.wrQLenPdf::(\d+)\s+(\d+)";

/// Request direction of a queue-length sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Read,
    Write,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Read => "read",
            Direction::Write => "write",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(controller, direction, queue length, count)` sample from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueHistogramEntry {
    pub controller: String,
    pub direction: Direction,
    pub queue_length: u64,
    pub count: u64,
}

/// Errors produced while collecting histograms.
#[derive(Debug)]
pub enum HistogramError {
    /// A captured length or count does not fit in a `u64`.
    InvalidNumber {
        line: usize,
        text: String,
        source: std::num::ParseIntError,
    },
}

impl fmt::Display for HistogramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistogramError::InvalidNumber { line, text, source } => {
                write!(f, "line {line}: invalid queue value {text:?}: {source}")
            }
        }
    }
}

impl std::error::Error for HistogramError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HistogramError::InvalidNumber { source, .. } => Some(source),
        }
    }
}

/// Compiled read/write line patterns. Each must capture exactly
/// (controller, queue length, count).
#[derive(Debug, Clone)]
pub struct HistogramPatterns {
    read: Regex,
    write: Regex,
}

impl HistogramPatterns {
    pub fn new(read: Regex, write: Regex) -> Self {
        Self { read, write }
    }

    /// Classify a line. The read pattern takes precedence when both match.
    fn classify<'t>(&self, line: &'t str) -> Option<(Direction, Captures<'t>)> {
        if let Some(caps) = self.read.captures(line) {
            return Some((Direction::Read, caps));
        }
        self.write
            .captures(line)
            .map(|caps| (Direction::Write, caps))
    }

    /// Parse a single line into an entry, if it matches either pattern.
    ///
    /// `line_no` is 1-based and only used for error reporting.
    pub fn parse_line(
        &self,
        line_no: usize,
        line: &str,
    ) -> Result<Option<QueueHistogramEntry>, HistogramError> {
        let (direction, caps) = match self.classify(line) {
            Some(c) => c,
            None => return Ok(None),
        };

        let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or("");
        let number = |i: usize| {
            let text = group(i);
            text.parse::<u64>()
                .map_err(|e| HistogramError::InvalidNumber {
                    line: line_no,
                    text: text.to_string(),
                    source: e,
                })
        };

        Ok(Some(QueueHistogramEntry {
            controller: group(1).to_string(),
            direction,
            queue_length: number(2)?,
            count: number(3)?,
        }))
    }
}

/// Sparse read and write histograms for one controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerHistogram {
    pub read: BTreeMap<u64, u64>,
    pub write: BTreeMap<u64, u64>,
}

impl ControllerHistogram {
    pub fn direction(&self, direction: Direction) -> &BTreeMap<u64, u64> {
        match direction {
            Direction::Read => &self.read,
            Direction::Write => &self.write,
        }
    }

    fn direction_mut(&mut self, direction: Direction) -> &mut BTreeMap<u64, u64> {
        match direction {
            Direction::Read => &mut self.read,
            Direction::Write => &mut self.write,
        }
    }

    /// Observed count at `queue_length`, zero if never observed.
    pub fn count(&self, direction: Direction, queue_length: u64) -> u64 {
        self.direction(direction)
            .get(&queue_length)
            .copied()
            .unwrap_or(0)
    }

    /// Largest observed queue length for `direction`.
    pub fn max_queue_length(&self, direction: Direction) -> Option<u64> {
        self.direction(direction).keys().next_back().copied()
    }
}

/// Queue-length histograms for every controller seen in the input, keyed
/// (and therefore iterated) in lexicographic controller order.
#[derive(Debug, Clone, Default)]
pub struct QueueHistograms {
    controllers: BTreeMap<String, ControllerHistogram>,
}

impl QueueHistograms {
    /// Scan `text` line by line and accumulate every matching entry.
    pub fn collect(text: &str, patterns: &HistogramPatterns) -> Result<Self, HistogramError> {
        let mut histograms = Self::default();
        let mut matched = 0usize;

        for (idx, line) in text.lines().enumerate() {
            if let Some(entry) = patterns.parse_line(idx + 1, line)? {
                histograms.record(entry);
                matched += 1;
            }
        }

        tracing::debug!(
            lines = matched,
            controllers = histograms.controllers.len(),
            "collected queue length samples"
        );
        Ok(histograms)
    }

    /// Add one sample. A repeated (controller, direction, length) replaces
    /// the earlier count.
    pub fn record(&mut self, entry: QueueHistogramEntry) {
        let histogram = self.controllers.entry(entry.controller).or_default();
        if let Some(previous) = histogram
            .direction_mut(entry.direction)
            .insert(entry.queue_length, entry.count)
        {
            tracing::debug!(
                direction = %entry.direction,
                queue_length = entry.queue_length,
                previous,
                count = entry.count,
                "duplicate queue length sample replaced"
            );
        }
    }

    /// True when no line matched either pattern.
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Controllers in sorted order.
    pub fn controllers(&self) -> impl Iterator<Item = (&str, &ControllerHistogram)> {
        self.controllers.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn controller(&self, name: &str) -> Option<&ControllerHistogram> {
        self.controllers.get(name)
    }

    /// Largest observed queue length in one direction across all controllers,
    /// or zero when that direction has no samples.
    pub fn max_queue_length_for(&self, direction: Direction) -> u64 {
        self.controllers
            .values()
            .filter_map(|h| h.max_queue_length(direction))
            .max()
            .unwrap_or(0)
    }

    /// Largest observed queue length across all controllers and both directions.
    pub fn max_queue_length(&self) -> u64 {
        self.max_queue_length_for(Direction::Read)
            .max(self.max_queue_length_for(Direction::Write))
    }
}
