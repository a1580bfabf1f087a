//! Output formatters for metrics.

use clap::ValueEnum;
use comfy_table::{Cell, CellAlignment, Table};
use querystat_core::QueryCounter;

/// Output format for metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON object keyed by canonical query
    Json,
    /// Prometheus text exposition
    Prometheus,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Prometheus => write!(f, "prometheus"),
        }
    }
}

/// Render the counter's current metrics.
pub fn render(counter: &QueryCounter, format: OutputFormat) -> Result<String, querystat_core::Error> {
    match format {
        OutputFormat::Table => Ok(render_table(counter)),
        OutputFormat::Json => counter.metrics_as_json_pretty(),
        OutputFormat::Prometheus => Ok(counter.to_prometheus()),
    }
}

fn render_table(counter: &QueryCounter) -> String {
    let metrics = counter.metrics();
    if metrics.is_empty() {
        return "No queries recorded".to_string();
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Query", "OK", "Err", "OK ms", "OK avg", "Err ms", "Err avg", "Fetched", "Affected",
        "Changed",
    ]);

    for (query, m) in &metrics {
        let numbers = [
            m.success_count,
            m.error_count,
            m.success_milliseconds_total,
            m.success_milliseconds_average,
            m.error_milliseconds_total,
            m.error_milliseconds_average,
            m.fetched_rows,
            m.affected_rows,
            m.changed_rows,
        ];
        let mut row = vec![Cell::new(query)];
        row.extend(
            numbers
                .iter()
                .map(|n| Cell::new(n).set_alignment(CellAlignment::Right)),
        );
        table.add_row(row);
    }

    let latency = counter
        .calibrated_latency()
        .map_or_else(|| "uncalibrated".to_string(), |ms| format!("{} ms", ms));

    format!(
        "{}\n{} query shape(s), {} running, latency baseline {}",
        table,
        metrics.len(),
        counter.running_queries_count(),
        latency
    )
}
