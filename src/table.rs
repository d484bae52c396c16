//! CSV table assembly and output.
//!
//! Two absence conventions live here and must stay separate: a missing
//! single-row metric renders as `N/A`, while a missing histogram bucket
//! renders as `0` (it means "observed zero times").

use crate::extract::Metric;
use crate::histogram::{Direction, QueueHistograms};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Cell text for a metric whose pattern was not found.
pub const NO_DATA: &str = "N/A";

/// First column of every histogram table.
pub const QUEUE_LENGTH_COLUMN: &str = "Queue Length";

/// Render a metric value: shortest representation that round-trips,
/// always carrying a decimal point or exponent (`1.0`, `0.25`, `1e16`).
pub fn format_value(value: f64) -> String {
    format!("{value:?}")
}

/// Errors produced while writing a table.
#[derive(Debug)]
pub enum TableError {
    /// CSV serialization failed.
    Csv { path: PathBuf, source: csv::Error },
    /// Could not create the temporary output file.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Could not move the finished file into place.
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::Csv { path, source } => {
                write!(f, "failed to write CSV {}: {source}", path.display())
            }
            TableError::Io { path, source } => {
                write!(f, "failed to create temp file in {}: {source}", path.display())
            }
            TableError::Persist { path, source } => {
                write!(f, "failed to move CSV into place at {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TableError::Csv { source, .. } => Some(source),
            TableError::Io { source, .. } => Some(source),
            TableError::Persist { source, .. } => Some(source),
        }
    }
}

/// A header row plus data rows, all as rendered cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.header.len());
        self.rows.push(row);
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Single-row table of metrics. Header cells are `name (unit)`.
    pub fn from_metrics(metrics: &[Metric]) -> Self {
        let header = metrics
            .iter()
            .map(|m| format!("{} ({})", m.name, m.unit))
            .collect();
        let row = metrics
            .iter()
            .map(|m| m.value.map_or_else(|| NO_DATA.to_string(), format_value))
            .collect();

        let mut table = Self::new(header);
        table.push_row(row);
        table
    }

    /// One table with `<controller>_read`, `<controller>_write` column pairs,
    /// rows from 0 through the largest length seen in either direction.
    pub fn combined_histogram(histograms: &QueueHistograms) -> Self {
        let mut header = vec![QUEUE_LENGTH_COLUMN.to_string()];
        for (name, _) in histograms.controllers() {
            header.push(format!("{name}_{}", Direction::Read));
            header.push(format!("{name}_{}", Direction::Write));
        }

        Self::histogram_rows(header, histograms.max_queue_length(), |len| {
            histograms
                .controllers()
                .flat_map(|(_, h)| [h.count(Direction::Read, len), h.count(Direction::Write, len)])
                .collect()
        })
    }

    /// One direction only: a column per controller, rows from 0 through the
    /// largest length seen in that direction.
    pub fn direction_histogram(histograms: &QueueHistograms, direction: Direction) -> Self {
        let mut header = vec![QUEUE_LENGTH_COLUMN.to_string()];
        header.extend(histograms.controllers().map(|(name, _)| name.to_string()));

        Self::histogram_rows(header, histograms.max_queue_length_for(direction), |len| {
            histograms
                .controllers()
                .map(|(_, h)| h.count(direction, len))
                .collect()
        })
    }

    fn histogram_rows(
        header: Vec<String>,
        max_queue_length: u64,
        cells: impl Fn(u64) -> Vec<u64>,
    ) -> Self {
        let mut table = Self::new(header);
        for len in 0..=max_queue_length {
            let mut row = vec![len.to_string()];
            row.extend(cells(len).into_iter().map(|c| c.to_string()));
            table.push_row(row);
        }
        table
    }

    /// Serialize as CSV: header first, newline-terminated rows.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.header)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write the table to `path`.
    ///
    /// Writes to a temporary file in the destination directory, then renames
    /// it over `path` so readers never see a partial CSV.
    pub fn write_to_path(&self, path: &Path) -> Result<(), TableError> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| TableError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;

        self.write_to(tmp.as_file_mut())
            .map_err(|e| TableError::Csv {
                path: path.to_path_buf(),
                source: e,
            })?;

        tmp.persist(path).map_err(|e| TableError::Persist {
            path: path.to_path_buf(),
            source: e.error,
        })?;

        tracing::debug!(
            path = %path.display(),
            rows = self.rows.len(),
            columns = self.header.len(),
            "wrote CSV"
        );
        Ok(())
    }
}
