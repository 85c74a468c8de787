use thiserror::Error;

/// The only error a resolution can surface to its caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Unsupported platform")]
    UnsupportedPlatform(String),
}

/// Transport level failure of a single HTTP exchange.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("request timed out")]
    Timeout,
    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_builder() {
            FetchError::InvalidUrl(err.to_string())
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

/// Why a strategy produced nothing. Never leaves the chain executor.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("malformed payload: {0}")]
    Payload(String),
}

impl From<serde_json::Error> for StrategyError {
    fn from(err: serde_json::Error) -> Self {
        StrategyError::Payload(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum EgressError {
    #[error("Invalid URL format")]
    InvalidUrl(String),
    #[error("Failed to fetch image after {attempts} attempts")]
    Exhausted { attempts: u32, fallback_url: String },
}

impl EgressError {
    /// Placeholder the caller may show instead, when one is known.
    pub fn fallback_url(&self) -> Option<&str> {
        match self {
            EgressError::InvalidUrl(_) => None,
            EgressError::Exhausted { fallback_url, .. } => Some(fallback_url),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProfileUrlError {
    #[error("'{0}' does not match any supported platform")]
    UnknownPlatform(String),
    #[error("'{0}' does not point at a profile")]
    NotAProfile(String),
}

/// Failure of the single-shot image passthrough.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Failed to fetch image")]
    Upstream(u16),
    #[error("Failed to proxy image")]
    Fetch(#[from] FetchError),
}
