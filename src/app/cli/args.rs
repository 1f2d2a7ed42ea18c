//! Command-line arguments for the demonstration pipeline

use clap::{ArgAction, Parser};
use std::path::PathBuf;

// Every option may also come from the TOML configuration file; values given
// on the command line win.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "handoff")]
#[command(about = "Priority handoff queue driving a simulated render loop")]
#[command(version, long_version = crate::core::version::long_version())]
#[command(after_help = " * can be specified multiple times or as a comma-separated list")]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Force colored output
    #[arg(long = "color", action = ArgAction::SetTrue, conflicts_with = "no_color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long = "no-color", action = ArgAction::SetTrue)]
    pub no_color: bool,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Number of producer threads
    #[arg(short = 'p', long = "producers", value_name = "COUNT")]
    pub producers: Option<usize>,

    /// Messages published by each producer
    #[arg(short = 'm', long = "messages", value_name = "COUNT")]
    pub messages: Option<usize>,

    /// Delay between messages from one producer, in milliseconds
    #[arg(long = "pace-ms", value_name = "MILLIS")]
    pub pace_ms: Option<u64>,

    /// Message kinds rejected by a standing filter*
    #[arg(short = 'd', long = "drop-kind", value_name = "KINDS", value_delimiter = ',', action = ArgAction::Append)]
    pub drop_kinds: Vec<String>,

    /// Message kinds purged once, after producers finish*
    #[arg(long = "purge-kind", value_name = "KINDS", value_delimiter = ',', action = ArgAction::Append)]
    pub purge_kinds: Vec<String>,
}

impl Args {
    /// Resolved colour preference: explicit flag, else `None` for auto
    pub fn color_preference(&self) -> Option<bool> {
        if self.no_color {
            Some(false)
        } else if self.color {
            Some(true)
        } else {
            None
        }
    }
}
