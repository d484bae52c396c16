use simstats::cli::{self, QueueStatsCli};
use simstats::commands::queue_stats;
use simstats::logging;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli: QueueStatsCli = match cli::parse_args(queue_stats::USAGE) {
        Ok(cli) => cli,
        Err(code) => return code,
    };

    logging::init(cli.common.verbose, cli.common.quiet);
    tracing::debug!(?cli, "parsed CLI arguments");

    let mut stdout = std::io::stdout().lock();
    queue_stats::execute(&cli, &mut stdout).into()
}
