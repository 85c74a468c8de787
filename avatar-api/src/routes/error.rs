use avatar_chain::{EgressError, ProfileUrlError, ProxyError, ResolveError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback_url: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    fallback_url: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            fallback_url: None,
        }
    }

    pub fn with_fallback(mut self, fallback_url: impl Into<String>) -> Self {
        self.fallback_url = Some(fallback_url.into());
        self
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            fallback_url: self.fallback_url,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::UnsupportedPlatform(_) => Self::bad_request(err.to_string()),
        }
    }
}

impl From<ProfileUrlError> for ApiError {
    fn from(err: ProfileUrlError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<EgressError> for ApiError {
    fn from(err: EgressError) -> Self {
        match &err {
            EgressError::InvalidUrl(_) => Self::bad_request(err.to_string()),
            EgressError::Exhausted { fallback_url, .. } => {
                tracing::error!("Image egress failed: {err}");
                Self::bad_gateway(err.to_string()).with_fallback(fallback_url.clone())
            }
        }
    }
}

impl From<ProxyError> for ApiError {
    fn from(err: ProxyError) -> Self {
        match err {
            ProxyError::Upstream(status) => Self::new(
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                err.to_string(),
            ),
            ProxyError::Fetch(ref e) => {
                tracing::error!("Image proxy failed: {e}");
                Self::internal(err.to_string())
            }
        }
    }
}
