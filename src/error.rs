use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unknown league: {0}")]
    UnknownLeague(String),

    #[error("unknown team: {team} in league {league}")]
    UnknownTeam { league: String, team: String },

    #[error("unsupported league: {0}")]
    UnsupportedLeague(String),

    /// Malformed path parameter. The message is returned to the caller verbatim.
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{provider} request failed: {message}")]
    UpstreamUnreachable { provider: String, message: String },

    #[error("{provider} returned {status}: {body}")]
    UpstreamError {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("failed to decode upstream response: {0}")]
    UpstreamDecode(#[from] serde_json::Error),

    #[error("request timed out")]
    RequestTimeout,

    #[error("missing required stat labels in response: {0}")]
    MissingStatLabels(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UnknownLeague(_)
            | AppError::UnknownTeam { .. }
            | AppError::UnsupportedLeague(_)
            | AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_input_errors_map_to_bad_request() {
        assert_eq!(AppError::UnknownLeague("xfl".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::InvalidArgument("nope".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::UnknownTeam { league: "nba".into(), team: "sonics".into() }.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn upstream_errors_map_to_server_error() {
        let err = AppError::UpstreamError {
            provider: "espn".into(),
            status: 503,
            body: "down".into(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "espn returned 503: down");
        assert_eq!(
            AppError::MissingStatLabels("MIN".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
