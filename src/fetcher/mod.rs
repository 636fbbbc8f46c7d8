//! Outbound HTTP to the two upstream providers.
//!
//! Each call is a single GET with a fixed client timeout. Non-2xx statuses,
//! transport failures and undecodable bodies surface as distinct
//! [`AppError`] variants; nothing here retries.

pub mod espn;
pub mod gamma;

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::config::USER_AGENT;
use crate::error::{AppError, Result};

pub use espn::EspnClient;
pub use gamma::GammaClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gamma,
    Espn,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Provider::Gamma => "gamma",
            Provider::Espn => "espn",
        };
        write!(f, "{s}")
    }
}

/// Shared GET-and-decode plumbing for one provider.
pub struct UpstreamClient {
    http: reqwest::Client,
    provider: Provider,
    health: Arc<HealthState>,
    latency: Arc<LatencyStats>,
}

impl UpstreamClient {
    pub fn new(
        provider: Provider,
        timeout: Duration,
        health: Arc<HealthState>,
        latency: Arc<LatencyStats>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Config(format!("failed to build {provider} HTTP client: {e}")))?;
        Ok(Self { http, provider, health, latency })
    }

    /// GET `url` and decode the JSON body as `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let started = Instant::now();
        let result = self.send(url).await;
        self.latency.record(started.elapsed());

        let health = self.health.provider(self.provider);
        match &result {
            Ok(_) => health.record_ok(),
            Err(e) => {
                health.record_failure();
                warn!(provider = %self.provider, url, "upstream call failed: {e}");
            }
        }
        result
    }

    async fn send<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;

        let status = resp.status();
        debug!(provider = %self.provider, url, status = status.as_u16(), "upstream responded");

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::UpstreamError {
                provider: self.provider.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await.map_err(|e| self.unreachable(e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn unreachable(&self, e: reqwest::Error) -> AppError {
        AppError::UpstreamUnreachable {
            provider: self.provider.to_string(),
            message: e.to_string(),
        }
    }
}
