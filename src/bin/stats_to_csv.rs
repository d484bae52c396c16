use simstats::cli::{self, StatsCsvCli};
use simstats::commands::stats_csv;
use simstats::logging;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli: StatsCsvCli = match cli::parse_args(stats_csv::USAGE) {
        Ok(cli) => cli,
        Err(code) => return code,
    };

    logging::init(cli.common.verbose, cli.common.quiet);
    tracing::debug!(?cli, "parsed CLI arguments");

    let mut stdout = std::io::stdout().lock();
    stats_csv::execute(&cli, &mut stdout).into()
}
