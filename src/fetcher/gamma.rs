use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::fetcher::UpstreamClient;
use crate::types::GammaMarket;

/// Client for the Gamma market API.
pub struct GammaClient {
    upstream: UpstreamClient,
    base_url: String,
}

impl GammaClient {
    pub fn new(upstream: UpstreamClient, base_url: &str) -> Self {
        Self {
            upstream,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn markets_url(&self, tag_id: u32) -> String {
        format!(
            "{}/markets?sports_market_types=moneyline&closed=false&tag_id={}",
            self.base_url, tag_id
        )
    }

    pub fn market_url(&self, market_id: u64) -> String {
        format!("{}/markets/{}", self.base_url, market_id)
    }

    /// Open moneyline markets carrying `tag_id`.
    pub async fn fetch_markets(&self, tag_id: u32) -> Result<Vec<GammaMarket>> {
        let items: Vec<Value> = self.upstream.get_json(&self.markets_url(tag_id)).await?;
        let markets = decode_markets(items);
        debug!(tag_id, count = markets.len(), "fetched gamma markets");
        Ok(markets)
    }

    pub async fn fetch_market(&self, market_id: u64) -> Result<GammaMarket> {
        self.upstream.get_json(&self.market_url(market_id)).await
    }
}

/// Decode each array element on its own; a non-object element is skipped.
pub fn decode_markets(items: Vec<Value>) -> Vec<GammaMarket> {
    let total = items.len();
    let markets: Vec<GammaMarket> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if markets.len() < total {
        warn!(total, decoded = markets.len(), "skipped undecodable gamma markets");
    }
    markets
}
