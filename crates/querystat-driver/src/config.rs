//! Adapter configuration.

/// Default query used to measure round-trip overhead.
pub const DEFAULT_PROBE_QUERY: &str = "SELECT 1";

/// Default number of probe round trips per calibration.
pub const DEFAULT_CALIBRATION_SAMPLES: u32 = 5;

/// Driver adapter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    /// Cheap query whose round trip approximates fixed overhead.
    pub probe_query: String,

    /// Probe round trips per calibration run.
    pub calibration_samples: u32,

    /// Run a calibration as soon as an observer is registered.
    pub calibrate_on_register: bool,
}

impl AdapterConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self {
            probe_query: DEFAULT_PROBE_QUERY.to_string(),
            calibration_samples: DEFAULT_CALIBRATION_SAMPLES,
            calibrate_on_register: false,
        }
    }

    /// Set the probe query.
    pub fn with_probe_query(mut self, query: impl Into<String>) -> Self {
        self.probe_query = query.into();
        self
    }

    /// Set the number of calibration samples.
    pub fn with_calibration_samples(mut self, samples: u32) -> Self {
        self.calibration_samples = samples;
        self
    }

    /// Calibrate when an observer is registered.
    pub fn with_calibrate_on_register(mut self, enabled: bool) -> Self {
        self.calibrate_on_register = enabled;
        self
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self::new()
    }
}
