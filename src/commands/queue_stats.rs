/// `dram-queue-stats`: queue-length PDF histograms to CSV.
///
/// Two output layouts. Combined mode writes one CSV with a read and a write
/// column per controller. Split mode writes one CSV per direction with a
/// column per controller.
use super::{report, CommandError, Outcome};
use crate::cli::QueueStatsCli;
use crate::config::Settings;
use crate::histogram::{Direction, HistogramPatterns, QueueHistograms};
use crate::stats_file::read_stats;
use crate::table::Table;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const USAGE: &str = "\
Usage options:
1. Combined CSV: dram-queue-stats <stats_file> <output_csv>
   Example: dram-queue-stats stats.txt queue_histograms.csv
2. Separate CSVs: dram-queue-stats <stats_file> <read_output_csv> <write_output_csv>
   Example: dram-queue-stats stats.txt rdq_histogram.csv wrq_histogram.csv
";

/// Where the histograms go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    Combined { output: PathBuf },
    Split { read: PathBuf, write: PathBuf },
}

/// Split positional arguments into the stats file and output mode.
///
/// Returns `None` for anything other than two or three paths.
pub fn parse_invocation(files: &[PathBuf]) -> Option<(&Path, OutputMode)> {
    match files {
        [stats, output] => Some((
            stats.as_path(),
            OutputMode::Combined {
                output: output.clone(),
            },
        )),
        [stats, read, write] => Some((
            stats.as_path(),
            OutputMode::Split {
                read: read.clone(),
                write: write.clone(),
            },
        )),
        _ => None,
    }
}

/// Collect histograms from `stats_file` and write them per `mode`.
///
/// When no line matches either pattern, says so and writes nothing.
pub fn run(
    stats_file: &Path,
    mode: &OutputMode,
    patterns: &HistogramPatterns,
    out: &mut dyn Write,
) -> Result<(), CommandError> {
    let text = read_stats(stats_file)?;
    let histograms = QueueHistograms::collect(&text, patterns)?;

    if histograms.is_empty() {
        writeln!(
            out,
            "No queue length PDF data found in {}",
            stats_file.display()
        )?;
        return Ok(());
    }

    match mode {
        OutputMode::Combined { output } => {
            Table::combined_histogram(&histograms).write_to_path(output)?;
            writeln!(
                out,
                "Successfully wrote queue length histogram data to {}",
                output.display()
            )?;
        }
        OutputMode::Split { read, write } => {
            for (direction, path) in [(Direction::Read, read), (Direction::Write, write)] {
                Table::direction_histogram(&histograms, direction).write_to_path(path)?;
                writeln!(
                    out,
                    "Successfully wrote {direction} queue length histogram data to {}",
                    path.display()
                )?;
            }
        }
    }

    Ok(())
}

/// Full tool invocation after argument parsing.
pub fn execute(cli: &QueueStatsCli, out: &mut dyn Write) -> Outcome {
    let Some((stats_file, mode)) = parse_invocation(&cli.files) else {
        let _ = write!(out, "{USAGE}");
        return Outcome::Failure;
    };
    tracing::debug!(stats_file = %stats_file.display(), ?mode, "queue stats invocation");

    let result = match Settings::load(cli.common.config.as_deref()) {
        Ok(settings) => run(stats_file, &mode, &settings.histogram, out),
        Err(e) => Err(e.into()),
    };
    report(result, out)
}
