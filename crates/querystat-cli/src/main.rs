//! querystat command-line tool.
//!
//! Feeds query observations into a counter, either replayed from a log or
//! produced live by running SQL through the SQLite adapter, then prints the
//! resulting metrics.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod config;
mod error;
mod formatter;
mod script;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use querystat_core::{parse_observations, QueryCounter};
use querystat_driver::SqliteAdapter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{adapter_config, Args, Command};
use error::Error;

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "querystat=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Error> {
    let counter = Arc::new(QueryCounter::with_config(args.output.counter_config()));

    match args.command {
        Command::Replay { file } => replay(&counter, &file)?,
        Command::Sqlite {
            database,
            commands,
            script,
            calibrate,
            probe,
            fail_fast,
        } => {
            let mut statements = commands;
            if let Some(path) = script {
                statements.extend(script::split_statements(&read_file(&path)?));
            }
            if statements.is_empty() {
                return Err(Error::NoStatements);
            }

            let adapter = if database == ":memory:" {
                SqliteAdapter::open_in_memory()?
            } else {
                SqliteAdapter::open(&database)?
            }
            .with_adapter_config(adapter_config(&probe, calibrate));
            adapter.register(counter.clone())?;
            run_statements(&adapter, &statements, fail_fast);
        }
    }

    println!("{}", formatter::render(&counter, args.output.format)?);
    Ok(())
}

fn read_file(path: &Path) -> Result<String, Error> {
    std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Replay an observation log into the counter.
fn replay(counter: &QueryCounter, path: &Path) -> Result<(), Error> {
    let observations = parse_observations(&read_file(path)?)?;
    tracing::info!(
        path = %path.display(),
        events = observations.len(),
        "replaying observations"
    );
    counter.apply_all(&observations);
    Ok(())
}

/// Run statements through the adapter. Failures are recorded by the counter
/// and reported on stderr.
fn run_statements(adapter: &SqliteAdapter, statements: &[String], fail_fast: bool) {
    for statement in statements {
        match adapter.run(statement) {
            Ok(output) => {
                tracing::debug!(
                    statement = %statement,
                    rows = output.rows.len(),
                    changes = output.changes,
                    "statement completed"
                );
            }
            Err(e) => {
                tracing::warn!(statement = %statement, error = %e, "statement failed");
                if fail_fast {
                    break;
                }
            }
        }
    }
}
