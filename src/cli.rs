// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `watchjob`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watchjob",
    version,
    disable_version_flag = true,
    about = "Run commands when watched files change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (YAML, JSON or TOML, chosen by extension).
    ///
    /// Default: the first of `watchjob.yml`, `watchjob.yaml`,
    /// `watchjob.json`, `watchjob.toml` found in the current directory.
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Interval (ms) between two checks, for watchers without their own
    /// `interval_ms`. Overrides `config.interval_ms`.
    #[arg(short = 'i', long, value_name = "MS")]
    pub interval: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCHJOB_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load and validate the config, print what would run, and exit.
    #[arg(long)]
    pub dry_run: bool,

    /// Print version and exit.
    #[arg(short = 'v', long, action = clap::ArgAction::Version)]
    pub version: Option<bool>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
