use clap::error::ErrorKind;
use clap::{Args, Parser};
use std::path::PathBuf;
use std::process::ExitCode;

/// Options shared by both tools.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// TOML config file (units, topology, patterns, extra metrics)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Debug logging (pattern matches, resolved rules)
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Extract DRAM controller read/write queue length PDFs from a stats file
/// into CSV histograms.
#[derive(Parser, Debug)]
#[command(name = "dram-queue-stats", version, about)]
pub struct QueueStatsCli {
    /// <stats_file> <output_csv>  or  <stats_file> <read_csv> <write_csv>
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Extract CPU, cache, traffic generator and DRAM statistics from a stats
/// file into a single-row CSV.
#[derive(Parser, Debug)]
#[command(name = "stats-to-csv", version, about)]
pub struct StatsCsvCli {
    /// <stats_file> <csv_file>
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Parse the process arguments, printing `usage` to stdout on malformed input.
///
/// `--help` and `--version` are rendered by clap and exit successfully.
pub fn parse_args<P: Parser>(usage: &str) -> Result<P, ExitCode> {
    match P::try_parse() {
        Ok(cli) => Ok(cli),
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = e.print();
                Err(ExitCode::SUCCESS)
            }
            _ => {
                print!("{usage}");
                Err(ExitCode::FAILURE)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_stats_positional_files() {
        let cli =
            QueueStatsCli::try_parse_from(["dram-queue-stats", "stats.txt", "rd.csv", "wr.csv"])
                .unwrap();
        assert_eq!(cli.files.len(), 3);
        assert!(cli.common.config.is_none());
        assert!(!cli.common.verbose);
    }

    #[test]
    fn test_queue_stats_accepts_any_count_for_later_validation() {
        let cli = QueueStatsCli::try_parse_from(["dram-queue-stats"]).unwrap();
        assert!(cli.files.is_empty());
    }

    #[test]
    fn test_stats_csv_common_flags() {
        let cli = StatsCsvCli::try_parse_from([
            "stats-to-csv",
            "-v",
            "--config",
            "simstats.toml",
            "stats.txt",
            "out.csv",
        ])
        .unwrap();
        assert!(cli.common.verbose);
        assert_eq!(cli.common.config, Some(PathBuf::from("simstats.toml")));
        assert_eq!(
            cli.files,
            vec![PathBuf::from("stats.txt"), PathBuf::from("out.csv")]
        );
    }

    #[test]
    fn test_unknown_flag_is_error() {
        let err = StatsCsvCli::try_parse_from(["stats-to-csv", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }
}
