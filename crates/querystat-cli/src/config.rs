//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use querystat_core::config::DEFAULT_METRIC_PREFIX;
use querystat_core::CounterConfig;
use querystat_driver::config::DEFAULT_PROBE_QUERY;
use querystat_driver::AdapterConfig;

use crate::formatter::OutputFormat;

/// querystat - per-query performance statistics
#[derive(Parser, Debug)]
#[command(name = "querystat")]
#[command(version, about = "Per-query latency and row statistics", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Options shared by every subcommand.
#[derive(ClapArgs, Debug)]
pub struct OutputArgs {
    /// Output format
    #[arg(long, global = true, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Prefix for Prometheus metric names
    #[arg(long, global = true, default_value = DEFAULT_METRIC_PREFIX)]
    pub metric_prefix: String,

    /// Starting latency baseline in milliseconds
    #[arg(long, global = true)]
    pub latency: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a newline-delimited JSON observation log
    Replay {
        /// Observation log file
        file: PathBuf,
    },

    /// Run SQL against a SQLite database with instrumentation attached
    Sqlite {
        /// Database file (":memory:" for an in-memory database)
        #[arg(default_value = ":memory:")]
        database: String,

        /// Statement to run (repeatable)
        #[arg(short = 'c', long = "command")]
        commands: Vec<String>,

        /// Script file with semicolon-separated statements
        #[arg(short = 'f', long)]
        script: Option<PathBuf>,

        /// Probe round trips used to calibrate latency (0 disables)
        #[arg(long, default_value_t = 0)]
        calibrate: u32,

        /// Query used for latency calibration
        #[arg(long, default_value = DEFAULT_PROBE_QUERY)]
        probe: String,

        /// Stop at the first failing statement
        #[arg(long)]
        fail_fast: bool,
    },
}

impl OutputArgs {
    /// Counter configuration derived from the flags.
    pub fn counter_config(&self) -> CounterConfig {
        let config = CounterConfig::new().with_metric_prefix(self.metric_prefix.clone());
        match self.latency {
            Some(ms) => config.with_initial_latency(ms),
            None => config,
        }
    }
}

/// Adapter configuration for the `sqlite` subcommand.
pub fn adapter_config(probe: &str, calibrate: u32) -> AdapterConfig {
    AdapterConfig::new()
        .with_probe_query(probe)
        .with_calibration_samples(calibrate)
        .with_calibrate_on_register(calibrate > 0)
}
