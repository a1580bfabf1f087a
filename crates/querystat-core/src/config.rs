//! Counter configuration.

/// Default prefix for exported metric names.
pub const DEFAULT_METRIC_PREFIX: &str = "querystat";

/// Configuration for a [`QueryCounter`](crate::QueryCounter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterConfig {
    /// Prefix used for Prometheus metric names.
    pub metric_prefix: String,

    /// Baseline latency to start with, if already known.
    pub initial_latency_ms: Option<u64>,
}

impl CounterConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self {
            metric_prefix: DEFAULT_METRIC_PREFIX.to_string(),
            initial_latency_ms: None,
        }
    }

    /// Set the metric name prefix.
    pub fn with_metric_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.metric_prefix = prefix.into();
        self
    }

    /// Start calibrated with the given baseline.
    pub fn with_initial_latency(mut self, ms: u64) -> Self {
        self.initial_latency_ms = Some(ms);
        self
    }
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CounterConfig::default();
        assert_eq!(config.metric_prefix, DEFAULT_METRIC_PREFIX);
        assert_eq!(config.initial_latency_ms, None);
    }

    #[test]
    fn test_config_builder() {
        let config = CounterConfig::new()
            .with_metric_prefix("app_db")
            .with_initial_latency(12);
        assert_eq!(config.metric_prefix, "app_db");
        assert_eq!(config.initial_latency_ms, Some(12));
    }
}
