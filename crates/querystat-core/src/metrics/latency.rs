//! Latency calibration.
//!
//! Every observed duration includes a fixed round-trip overhead. The
//! calibrator keeps the smallest baseline reported so far and subtracts it
//! from durations before they are aggregated.

use parking_lot::Mutex;

/// Holds the optional calibrated baseline in milliseconds.
#[derive(Debug, Default)]
pub struct LatencyCalibrator {
    baseline_ms: Mutex<Option<u64>>,
}

impl LatencyCalibrator {
    /// Create an uncalibrated calibrator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a calibrator with an initial baseline.
    pub fn with_baseline(ms: u64) -> Self {
        Self {
            baseline_ms: Mutex::new(Some(ms)),
        }
    }

    /// Report a baseline sample.
    ///
    /// The first sample, or any sample with `reset` set, is stored as-is.
    /// Later samples only ever lower the baseline.
    pub fn set_latency(&self, ms: u64, reset: bool) {
        let mut baseline = self.baseline_ms.lock();
        let next = match *baseline {
            Some(current) if !reset => current.min(ms),
            _ => ms,
        };
        *baseline = Some(next);
    }

    /// Current baseline, if one has been reported.
    pub fn latency(&self) -> Option<u64> {
        *self.baseline_ms.lock()
    }

    /// Baseline to subtract, 0 when uncalibrated.
    pub fn offset(&self) -> u64 {
        self.latency().unwrap_or(0)
    }

    /// Subtract the baseline from `duration_ms`, flooring at 0.
    pub fn adjust(&self, duration_ms: u64) -> u64 {
        duration_ms.saturating_sub(self.offset())
    }

    /// Forget the baseline.
    pub fn reset(&self) {
        *self.baseline_ms.lock() = None;
    }
}
