use crate::error::{AppError, Result};

pub const GAMMA_API_URL: &str = "https://gamma-api.polymarket.com";
pub const ESPN_API_URL: &str = "https://site.web.api.espn.com/apis";

/// The only browser origin allowed to call the API unless ALLOWED_ORIGIN overrides it.
pub const ALLOWED_ORIGIN: &str = "http://localhost:5173";

/// Pre-flight cache duration advertised to browsers (seconds).
pub const CORS_MAX_AGE_SECS: u64 = 12 * 60 * 60;

/// Client-side timeout for a single outbound upstream call (seconds).
pub const UPSTREAM_TIMEOUT_SECS: u64 = 12;

/// Deadline for a whole inbound request, upstream call included (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 15;

/// How long a bulk upstream fetch is served from memory (seconds).
pub const MARKET_CACHE_TTL_SECS: u64 = 300;

/// Market descriptions are cut to this many characters after trimming.
pub const DESCRIPTION_MAX_CHARS: usize = 280;

pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; SidelineGateway/0.1)";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_port: u16,
    pub log_level: String,
    pub gamma_api_url: String,
    pub espn_api_url: String,
    /// Single origin permitted by the CORS layer (ALLOWED_ORIGIN)
    pub allowed_origin: String,
    /// Outbound call timeout (UPSTREAM_TIMEOUT_SECS)
    pub upstream_timeout_secs: u64,
    /// Inbound request deadline (REQUEST_TIMEOUT_SECS)
    pub request_timeout_secs: u64,
    /// Response cache TTL for league markets and rosters (MARKET_CACHE_TTL_SECS)
    pub market_cache_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            gamma_api_url: std::env::var("GAMMA_API_URL")
                .unwrap_or_else(|_| GAMMA_API_URL.to_string()),
            espn_api_url: std::env::var("ESPN_API_URL")
                .unwrap_or_else(|_| ESPN_API_URL.to_string()),
            allowed_origin: std::env::var("ALLOWED_ORIGIN")
                .unwrap_or_else(|_| ALLOWED_ORIGIN.to_string()),
            upstream_timeout_secs: parse_secs("UPSTREAM_TIMEOUT_SECS", UPSTREAM_TIMEOUT_SECS)?,
            request_timeout_secs: parse_secs("REQUEST_TIMEOUT_SECS", REQUEST_TIMEOUT_SECS)?,
            market_cache_ttl_secs: parse_secs("MARKET_CACHE_TTL_SECS", MARKET_CACHE_TTL_SECS)?,
        })
    }
}

fn parse_secs(var: &str, default: u64) -> Result<u64> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| AppError::Config(format!("{var} must be a whole number of seconds"))),
        Err(_) => Ok(default),
    }
}
