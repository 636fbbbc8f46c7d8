mod aggregator;
mod api;
mod config;
mod error;
mod fetcher;
mod leagues;
mod normalizer;
mod roster;
mod state;
mod types;

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::api::routes::{router, ApiState, HttpPolicy};
use crate::config::Config;
use crate::error::Result;
use crate::fetcher::{EspnClient, GammaClient, Provider, UpstreamClient};
use crate::state::ResponseCache;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let health = Arc::new(HealthState::new());
    let latency = Arc::new(LatencyStats::new());
    let upstream_timeout = Duration::from_secs(cfg.upstream_timeout_secs);

    // --- Upstream clients ---
    let gamma = GammaClient::new(
        UpstreamClient::new(Provider::Gamma, upstream_timeout, Arc::clone(&health), Arc::clone(&latency))?,
        &cfg.gamma_api_url,
    );
    let espn = EspnClient::new(
        UpstreamClient::new(Provider::Espn, upstream_timeout, Arc::clone(&health), Arc::clone(&latency))?,
        &cfg.espn_api_url,
    );
    info!(gamma = %cfg.gamma_api_url, espn = %cfg.espn_api_url, "upstream clients ready");

    // --- HTTP API server ---
    let api_state = ApiState {
        gamma: Arc::new(gamma),
        espn: Arc::new(espn),
        market_cache: ResponseCache::new(),
        roster_cache: ResponseCache::new(),
        cache_ttl: Duration::from_secs(cfg.market_cache_ttl_secs),
        health,
        latency,
    };
    let policy = HttpPolicy {
        allowed_origin: cfg.allowed_origin.clone(),
        request_timeout: Duration::from_secs(cfg.request_timeout_secs),
    };
    let app = router(api_state, &policy)?;

    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr} (origin {})", cfg.allowed_origin);

    axum::serve(listener, app).await?;

    Ok(())
}
