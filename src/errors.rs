use axum::http::StatusCode;
use thiserror::Error;

/// Failures of the operations that talk to the sync backend.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("network error: {0}")]
    Network(String),
    #[error("{status} ({reason}): {body}")]
    Http {
        status: u16,
        reason: String,
        body: String,
    },
    #[error("No API endpoint mapped for module {0}")]
    NoEndpointMapped(String),
    #[error("No records found to download for {0}.")]
    EmptyResult(String),
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("sync rejected by backend: {0}")]
    Rejected(String),
}

impl DashboardError {
    pub fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_secs)
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: message.into(),
        }
    }
}

impl From<DashboardError> for AppError {
    fn from(err: DashboardError) -> Self {
        let status = match &err {
            DashboardError::NoEndpointMapped(_) | DashboardError::EmptyResult(_) => {
                StatusCode::NOT_FOUND
            }
            DashboardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            DashboardError::Network(_)
            | DashboardError::Http { .. }
            | DashboardError::Decode(_)
            | DashboardError::Rejected(_) => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
