/// `stats-to-csv`: named simulator metrics to a single-row CSV.
use super::{report, CommandError, Outcome};
use crate::cli::StatsCsvCli;
use crate::config::Settings;
use crate::extract::{extract_metrics, MetricRule};
use crate::stats_file::read_stats;
use crate::table::Table;
use std::io::Write;
use std::path::Path;

pub const USAGE: &str = "\
Usage: stats-to-csv [OPTIONS] <stats_file> <csv_file>
   Example: stats-to-csv stats.txt stats_summary.csv
";

/// Extract every rule from `stats_file`, echo the values, and write one
/// data row to `csv_file`. Absent statistics become `N/A`.
pub fn run(
    stats_file: &Path,
    csv_file: &Path,
    rules: &[MetricRule],
    out: &mut dyn Write,
) -> Result<(), CommandError> {
    let text = read_stats(stats_file)?;
    let metrics = extract_metrics(&text, rules)?;

    let missing = metrics.iter().filter(|m| m.value.is_none()).count();
    if missing > 0 {
        tracing::warn!(missing, total = metrics.len(), "some statistics were not found");
    }

    writeln!(out, "Extracted Statistics:")?;
    for metric in &metrics {
        writeln!(out, "{metric}")?;
    }

    Table::from_metrics(&metrics).write_to_path(csv_file)?;
    writeln!(out, "Statistics saved to {}", csv_file.display())?;
    Ok(())
}

/// Full tool invocation after argument parsing.
pub fn execute(cli: &StatsCsvCli, out: &mut dyn Write) -> Outcome {
    let [stats_file, csv_file] = cli.files.as_slice() else {
        let _ = write!(out, "{USAGE}");
        return Outcome::Failure;
    };
    tracing::debug!(
        stats_file = %stats_file.display(),
        csv_file = %csv_file.display(),
        "stats to csv invocation"
    );

    let result = match Settings::load(cli.common.config.as_deref()) {
        Ok(settings) => run(stats_file, csv_file, &settings.rules, out),
        Err(e) => Err(e.into()),
    };
    report(result, out)
}
