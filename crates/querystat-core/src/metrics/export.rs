//! Prometheus text exposition.

use std::fmt::Write;

use super::counter::QueryCounter;
use super::record::QueryMetrics;

struct Family {
    name: &'static str,
    help: &'static str,
    value: fn(&QueryMetrics) -> u64,
}

const FAMILIES: &[Family] = &[
    Family {
        name: "query_success_total",
        help: "Successful executions per canonical query",
        value: |m| m.success_count,
    },
    Family {
        name: "query_error_total",
        help: "Failed executions per canonical query",
        value: |m| m.error_count,
    },
    Family {
        name: "query_success_milliseconds_total",
        help: "Calibrated time spent in successful executions",
        value: |m| m.success_milliseconds_total,
    },
    Family {
        name: "query_error_milliseconds_total",
        help: "Calibrated time spent in failed executions",
        value: |m| m.error_milliseconds_total,
    },
    Family {
        name: "query_fetched_rows_total",
        help: "Rows returned per canonical query",
        value: |m| m.fetched_rows,
    },
    Family {
        name: "query_affected_rows_total",
        help: "Rows matched by writes per canonical query",
        value: |m| m.affected_rows,
    },
    Family {
        name: "query_changed_rows_total",
        help: "Rows modified by writes per canonical query",
        value: |m| m.changed_rows,
    },
];

impl QueryCounter {
    /// Export to Prometheus text format.
    ///
    /// Each record becomes one sample per family, labelled with its
    /// canonical query text.
    pub fn to_prometheus(&self) -> String {
        let prefix = &self.config().metric_prefix;
        let metrics = self.metrics();
        let mut out = String::new();

        // Writing into a String cannot fail.
        let _ = writeln!(out, "# HELP {prefix}_running_queries Query dispatches in flight");
        let _ = writeln!(out, "# TYPE {prefix}_running_queries gauge");
        let _ = writeln!(out, "{prefix}_running_queries {}", self.running_queries_count());

        for family in FAMILIES {
            let _ = writeln!(out);
            let _ = writeln!(out, "# HELP {prefix}_{} {}", family.name, family.help);
            let _ = writeln!(out, "# TYPE {prefix}_{} counter", family.name);
            for (query, record) in &metrics {
                let _ = writeln!(
                    out,
                    "{prefix}_{}{{query=\"{}\"}} {}",
                    family.name,
                    escape_label(query),
                    (family.value)(record)
                );
            }
        }

        out
    }
}

/// Escape a label value per the exposition format.
fn escape_label(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CounterConfig;
    use crate::metrics::RowCounts;

    #[test]
    fn test_prometheus_format() {
        let counter = QueryCounter::new();
        counter.on_query();
        counter.on_query();
        counter.on_result("SELECT 1 FROM t", 10, RowCounts::fetched(4));

        let prometheus = counter.to_prometheus();

        assert!(prometheus.contains("# TYPE querystat_running_queries gauge"));
        assert!(prometheus.contains("querystat_running_queries 1\n"));
        assert!(prometheus.contains("# TYPE querystat_query_success_total counter"));
        assert!(prometheus.contains("querystat_query_success_total{query=\"SELECT ? FROM t\"} 1"));
        assert!(prometheus.contains("querystat_query_fetched_rows_total{query=\"SELECT ? FROM t\"} 4"));
    }

    #[test]
    fn test_custom_prefix() {
        let counter = QueryCounter::with_config(CounterConfig::new().with_metric_prefix("app"));
        assert!(counter.to_prometheus().contains("app_running_queries 0"));
    }

    #[test]
    fn test_label_escaping() {
        assert_eq!(escape_label(r#"a "b" \c"#), r#"a \"b\" \\c"#);
        assert_eq!(escape_label("x\ny"), "x\\ny");
    }
}
