//! Shared health state for the /health endpoint.
//! Updated by the upstream clients, read by the API.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::fetcher::Provider;

/// Outcome counters for one upstream provider.
#[derive(Default)]
pub struct ProviderHealth {
    ok: AtomicU64,
    failed: AtomicU64,
    /// Millisecond timestamp of the last failed call (0 = none).
    last_failure_at_ms: AtomicU64,
}

impl ProviderHealth {
    pub fn record_ok(&self) {
        self.ok.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.last_failure_at_ms.store(now_ms(), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProviderSnapshot {
        let last = self.last_failure_at_ms.load(Ordering::Relaxed);
        ProviderSnapshot {
            requests_ok: self.ok.load(Ordering::Relaxed),
            requests_failed: self.failed.load(Ordering::Relaxed),
            last_failure_at_ms: (last != 0).then_some(last),
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ProviderSnapshot {
    pub requests_ok: u64,
    pub requests_failed: u64,
    pub last_failure_at_ms: Option<u64>,
}

/// Shared health metrics. Updated by upstream clients, read by API.
#[derive(Default)]
pub struct HealthState {
    gamma: ProviderHealth,
    espn: ProviderHealth,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider(&self, provider: Provider) -> &ProviderHealth {
        match provider {
            Provider::Gamma => &self.gamma,
            Provider::Espn => &self.espn,
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
