//! Post-processing for memory-system simulator statistics.
//!
//! Reads a simulator `stats.txt` dump, pulls named metrics and DRAM queue-length
//! PDFs out of it with regular expressions, and writes the results as CSV.

pub mod cli;
pub mod commands;
pub mod config;
pub mod extract;
pub mod histogram;
pub mod logging;
pub mod stats_file;
pub mod table;
pub mod topology;
