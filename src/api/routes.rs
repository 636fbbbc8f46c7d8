use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

use crate::aggregator::{averages_vs_opponent, OpponentAverages};
use crate::api::health::{HealthState, ProviderSnapshot};
use crate::api::latency::{LatencyStats, LatencySummary};
use crate::config::CORS_MAX_AGE_SECS;
use crate::error::{AppError, Result};
use crate::fetcher::{EspnClient, GammaClient, Provider};
use crate::leagues::{resolve_league, resolve_team, sport_for_league};
use crate::normalizer::normalize;
use crate::roster::Athlete;
use crate::state::ResponseCache;
use crate::types::{GammaMarket, NormalizedMarket};

#[derive(Clone)]
pub struct ApiState {
    pub gamma: Arc<GammaClient>,
    pub espn: Arc<EspnClient>,
    /// League key → open markets.
    pub market_cache: Arc<ResponseCache<String, Vec<GammaMarket>>>,
    /// (league key, ESPN team ID) → roster.
    pub roster_cache: Arc<ResponseCache<(String, u32), Vec<Athlete>>>,
    pub cache_ttl: Duration,
    pub health: Arc<HealthState>,
    pub latency: Arc<LatencyStats>,
}

/// Cross-origin and deadline settings applied to every route.
pub struct HttpPolicy {
    pub allowed_origin: String,
    pub request_timeout: Duration,
}

pub fn router(state: ApiState, policy: &HttpPolicy) -> Result<Router> {
    let origin = HeaderValue::from_str(&policy.allowed_origin).map_err(|_| {
        AppError::Config(format!("invalid ALLOWED_ORIGIN: {}", policy.allowed_origin))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(Duration::from_secs(CORS_MAX_AGE_SECS));

    let v1 = Router::new()
        .route("/league/:league", get(get_league_markets))
        .route("/league/:league/:team_name", get(get_team_roster))
        .route("/market/:market_id", get(get_market))
        .route(
            "/player/:league/:athlete_id/stats-vs/:opponent",
            get(get_player_vs_opponent),
        );

    Ok(Router::new()
        .route("/", get(get_root))
        .route("/ping", get(ping))
        .route("/health", get(get_health))
        .route("/stats/latency", get(get_stats_latency))
        .route("/league/:league", get(get_league_markets))
        .route("/league/:league/:team_name", get(get_team_roster))
        .route(
            "/player/stats/:league/:athlete_id/:opponent",
            get(get_player_vs_opponent),
        )
        .route("/market/:market_id", get(get_market))
        .nest("/api/v1", v1)
        .with_state(state)
        .layer(TimeoutLayer::new(policy.request_timeout))
        .layer(middleware::map_response(timeout_as_error))
        .layer(cors))
}

/// The timeout layer answers with an empty 408; give it the usual error body.
async fn timeout_as_error(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        warn!("request deadline exceeded");
        return AppError::RequestTimeout.into_response();
    }
    response
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct CacheSnapshot {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub gamma: ProviderSnapshot,
    pub espn: ProviderSnapshot,
    pub market_cache: CacheSnapshot,
    pub roster_cache: CacheSnapshot,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "OK",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn ping() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "Hello": "World" }))
}

async fn get_league_markets(
    State(state): State<ApiState>,
    Path(league): Path<String>,
) -> Result<Json<Vec<NormalizedMarket>>> {
    let ids = resolve_league(&league)?;
    let entry = state
        .market_cache
        .get_or_fetch(ids.key.to_string(), state.cache_ttl, || {
            state.gamma.fetch_markets(ids.tag_id)
        })
        .await?;

    let markets: Vec<NormalizedMarket> = entry.value.iter().map(normalize).collect();
    info!(league = ids.key, count = markets.len(), "served league markets");
    Ok(Json(markets))
}

async fn get_team_roster(
    State(state): State<ApiState>,
    Path((league, team_name)): Path<(String, String)>,
) -> Result<Json<Vec<Athlete>>> {
    let ids = resolve_league(&league)?;
    let team_id = resolve_team(ids, &team_name)?;
    let sport_path = ids.sport_path();

    let entry = state
        .roster_cache
        .get_or_fetch((ids.key.to_string(), team_id), state.cache_ttl, || {
            state.espn.fetch_roster(&sport_path, team_id)
        })
        .await?;

    info!(league = ids.key, team_id, count = entry.value.len(), "served team roster");
    Ok(Json(entry.value.clone()))
}

async fn get_player_vs_opponent(
    State(state): State<ApiState>,
    Path((league, athlete_id, opponent)): Path<(String, String, String)>,
) -> Result<Json<OpponentAverages>> {
    let league = league.trim().to_lowercase();
    let opponent = opponent.trim();
    if league.is_empty() || opponent.is_empty() {
        return Err(AppError::InvalidArgument("league and opponent required".to_string()));
    }
    let athlete_id = athlete_id.trim();
    if athlete_id.is_empty() || !athlete_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidArgument(
            "Invalid athlete ID. Must be a number.".to_string(),
        ));
    }

    let sport = sport_for_league(&league)?;
    let log = state.espn.fetch_game_log(sport, &league, athlete_id).await?;
    let averages = averages_vs_opponent(&log, opponent)?;

    info!(
        league = %league,
        athlete_id,
        opponent,
        games = averages.games_played,
        "served player averages vs opponent"
    );
    Ok(Json(averages))
}

async fn get_market(
    State(state): State<ApiState>,
    Path(market_id): Path<String>,
) -> Result<Json<NormalizedMarket>> {
    let market_id: u64 = market_id.trim().parse().map_err(|_| {
        AppError::InvalidArgument("Invalid market ID. Must be a number.".to_string())
    })?;
    let market = state.gamma.fetch_market(market_id).await?;
    Ok(Json(normalize(&market)))
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        gamma: state.health.provider(Provider::Gamma).snapshot(),
        espn: state.health.provider(Provider::Espn).snapshot(),
        market_cache: CacheSnapshot {
            entries: state.market_cache.len(),
            hits: state.market_cache.hits(),
            misses: state.market_cache.misses(),
        },
        roster_cache: CacheSnapshot {
            entries: state.roster_cache.len(),
            hits: state.roster_cache.hits(),
            misses: state.roster_cache.misses(),
        },
    })
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<LatencySummary> {
    Json(state.latency.summary())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::testing::spawn_upstream;
    use crate::fetcher::UpstreamClient;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    /// Router whose upstreams point at a closed loopback port.
    fn test_app() -> (Router, ApiState) {
        app_with("http://127.0.0.1:9", Duration::from_secs(5))
    }

    fn app_with(upstream_base: &str, request_timeout: Duration) -> (Router, ApiState) {
        let health = Arc::new(HealthState::new());
        let latency = Arc::new(LatencyStats::new());
        let upstream = |provider| {
            UpstreamClient::new(provider, Duration::from_secs(2), health.clone(), latency.clone())
                .unwrap()
        };
        let state = ApiState {
            gamma: Arc::new(GammaClient::new(upstream(Provider::Gamma), upstream_base)),
            espn: Arc::new(EspnClient::new(upstream(Provider::Espn), upstream_base)),
            market_cache: ResponseCache::new(),
            roster_cache: ResponseCache::new(),
            cache_ttl: Duration::from_secs(300),
            health: health.clone(),
            latency: latency.clone(),
        };
        let policy = HttpPolicy {
            allowed_origin: "http://localhost:5173".to_string(),
            request_timeout,
        };
        (router(state.clone(), &policy).unwrap(), state)
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn ping_says_hello() {
        let (app, _) = test_app();
        let (status, body) = get(&app, "/ping").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"Hello": "World"}));
    }

    #[tokio::test]
    async fn non_numeric_market_id_is_bad_request() {
        let (app, state) = test_app();
        for uri in ["/market/abc", "/api/v1/market/abc"] {
            let (status, body) = get(&app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, serde_json::json!({"error": "Invalid market ID. Must be a number."}));
        }
        // Rejected before any upstream call.
        assert_eq!(state.health.provider(Provider::Gamma).snapshot().requests_failed, 0);
    }

    #[tokio::test]
    async fn unknown_league_is_bad_request() {
        let (app, _) = test_app();
        let (status, body) = get(&app, "/league/xfl").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "unknown league: xfl");
    }

    #[tokio::test]
    async fn unknown_team_is_bad_request() {
        let (app, _) = test_app();
        let (status, body) = get(&app, "/league/NBA/sonics").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "unknown team: sonics in league nba");
    }

    #[tokio::test]
    async fn blank_opponent_is_bad_request() {
        let (app, _) = test_app();
        let (status, body) = get(&app, "/player/stats/nba/1966/%20%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "league and opponent required");
    }

    #[tokio::test]
    async fn player_stats_validate_athlete_and_league() {
        let (app, _) = test_app();
        let (status, body) = get(&app, "/player/stats/nba/lebron/celtics").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid athlete ID. Must be a number.");

        let (status, body) = get(&app, "/api/v1/player/wnba/1966/stats-vs/liberty").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "unsupported league: wnba");
    }

    #[tokio::test]
    async fn unreachable_upstream_is_server_error() {
        let (app, state) = test_app();
        let (status, body) = get(&app, "/league/nba").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().starts_with("gamma request failed"));
        // Failures are not cached.
        assert_eq!(state.market_cache.len(), 0);
        assert_eq!(state.health.provider(Provider::Gamma).snapshot().requests_failed, 1);
    }

    #[tokio::test]
    async fn cached_markets_are_served_and_normalized() {
        let (app, state) = test_app();
        let seeded: Vec<GammaMarket> = serde_json::from_value(serde_json::json!([
            {"id": "7", "question": "Lakers vs. Celtics", "outcomePrices": "[\"0.6667\",\"0.3333\"]",
             "volumeNum": 1500, "liquidityNum": 999}
        ]))
        .unwrap();
        state
            .market_cache
            .get_or_fetch("nba".to_string(), state.cache_ttl, || async { Ok(seeded) })
            .await
            .unwrap();

        let (status, body) = get(&app, "/league/Nba").await;
        assert_eq!(status, StatusCode::OK);
        let market = &body[0];
        assert_eq!(market["id"], "7");
        assert_eq!(market["outcomes"], serde_json::json!(["Yes", "No"]));
        assert_eq!(market["probabilities"], serde_json::json!([66.7, 33.3]));
        assert_eq!(market["volumeFormatted"], "$1.50K");
        assert_eq!(market["liquidityFormatted"], "$999");
        assert_eq!(state.market_cache.hits(), 1);
    }

    #[tokio::test]
    async fn request_deadline_returns_error_body() {
        let slow = Router::new().route(
            "/markets/:id",
            axum::routing::get(|| async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Json(serde_json::json!({"id": "1"}))
            }),
        );
        let base = spawn_upstream(slow).await;
        let (app, _) = app_with(&base, Duration::from_millis(100));

        let (status, body) = get(&app, "/market/1").await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body, serde_json::json!({"error": "request timed out"}));
    }

    #[tokio::test]
    async fn health_reports_counters() {
        let (app, _) = test_app();
        let (status, body) = get(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["gamma"]["requests_ok"], 0);
        assert_eq!(body["market_cache"]["entries"], 0);

        let (status, body) = get(&app, "/stats/latency").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["samples"], 0);
        assert!(body["p50_ms"].is_null());
    }

    #[tokio::test]
    async fn preflight_allows_configured_origin() {
        let (app, _) = test_app();
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/ping")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5173"
        );
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_MAX_AGE).unwrap(),
            "43200"
        );
    }
}
