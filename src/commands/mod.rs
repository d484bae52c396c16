//! Top-level flows for the two tools and the mapping from errors to
//! user-facing messages and exit status.

pub mod queue_stats;
pub mod stats_csv;

use crate::config::ConfigError;
use crate::extract::ExtractError;
use crate::histogram::HistogramError;
use crate::stats_file::StatsFileError;
use crate::table::TableError;
use std::io::Write;
use std::process::ExitCode;

/// How a tool invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::Failure => ExitCode::FAILURE,
        }
    }
}

/// Any failure a command can hit.
#[derive(Debug)]
pub enum CommandError {
    Input(StatsFileError),
    Config(ConfigError),
    Extract(ExtractError),
    Histogram(HistogramError),
    Table(TableError),
    /// Writing a status message to stdout failed.
    Output(std::io::Error),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Input(e) => write!(f, "{e}"),
            CommandError::Config(e) => write!(f, "{e}"),
            CommandError::Extract(e) => write!(f, "{e}"),
            CommandError::Histogram(e) => write!(f, "{e}"),
            CommandError::Table(e) => write!(f, "{e}"),
            CommandError::Output(e) => write!(f, "failed to write output: {e}"),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::Input(e) => Some(e),
            CommandError::Config(e) => Some(e),
            CommandError::Extract(e) => Some(e),
            CommandError::Histogram(e) => Some(e),
            CommandError::Table(e) => Some(e),
            CommandError::Output(e) => Some(e),
        }
    }
}

impl From<StatsFileError> for CommandError {
    fn from(e: StatsFileError) -> Self {
        CommandError::Input(e)
    }
}

impl From<ConfigError> for CommandError {
    fn from(e: ConfigError) -> Self {
        CommandError::Config(e)
    }
}

impl From<ExtractError> for CommandError {
    fn from(e: ExtractError) -> Self {
        CommandError::Extract(e)
    }
}

impl From<HistogramError> for CommandError {
    fn from(e: HistogramError) -> Self {
        CommandError::Histogram(e)
    }
}

impl From<TableError> for CommandError {
    fn from(e: TableError) -> Self {
        CommandError::Table(e)
    }
}

impl From<std::io::Error> for CommandError {
    fn from(e: std::io::Error) -> Self {
        CommandError::Output(e)
    }
}

/// Turn a command result into a message on `out` and an outcome.
///
/// A missing statistics file is reported but is not a failure; anything
/// else is.
pub fn report(result: Result<(), CommandError>, out: &mut dyn Write) -> Outcome {
    match result {
        Ok(()) => Outcome::Success,
        Err(CommandError::Input(e @ StatsFileError::NotFound { .. })) => {
            tracing::debug!(error = %e, "statistics file missing");
            let _ = writeln!(out, "Error: {e}");
            Outcome::Success
        }
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            let _ = writeln!(out, "Error processing file: {e}");
            Outcome::Failure
        }
    }
}
