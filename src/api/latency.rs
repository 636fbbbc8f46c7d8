//! Round-trip timing of Gamma and ESPN calls, served by `/stats/latency`.

use std::sync::Mutex;
use std::time::Duration;

use hdrhistogram::Histogram;
use serde::Serialize;

/// Longest round trip tracked: one minute, well past any upstream timeout.
const MAX_TRACKED_US: u64 = 60_000_000;

/// Upstream round trips in microseconds, shared by both providers.
pub struct LatencyStats {
    histogram: Mutex<Histogram<u64>>,
}

/// Percentiles in milliseconds; `None` until the first upstream call.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    pub samples: u64,
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
}

impl LatencyStats {
    pub fn new() -> Self {
        let histogram = Histogram::new_with_bounds(1, MAX_TRACKED_US, 3)
            .expect("constant histogram bounds are valid");
        Self {
            histogram: Mutex::new(histogram),
        }
    }

    /// Sub-microsecond calls count as 1us; anything past a minute is clamped.
    pub fn record(&self, elapsed: Duration) {
        let us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX).max(1);
        if let Ok(mut h) = self.histogram.lock() {
            h.saturating_record(us);
        }
    }

    pub fn summary(&self) -> LatencySummary {
        let Ok(h) = self.histogram.lock() else {
            return LatencySummary::default();
        };
        if h.len() == 0 {
            return LatencySummary::default();
        }
        let ms = |q: f64| Some(h.value_at_quantile(q) as f64 / 1000.0);
        LatencySummary {
            samples: h.len(),
            p50_ms: ms(0.50),
            p95_ms: ms(0.95),
            p99_ms: ms(0.99),
        }
    }
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}
