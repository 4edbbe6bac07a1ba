use std::time::Duration;

use http::StatusCode;
use thiserror::Error;

/// A permit was requested before the minimum interval elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Too many requests. Please wait.")]
pub struct RateLimitExceeded {
    /// Time left until the next permit can be granted.
    pub retry_after: Duration,
}

/// Terminal failure of a catalog fetch, as seen by consumers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Too many requests. Please wait.")]
    RateLimitExceeded,
    #[error("Request timeout. Please try again.")]
    Timeout,
    #[error("Failed to fetch starships: HTTP {0}")]
    Status(StatusCode),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Unexpected catalog payload: {0}")]
    Decode(String),
}

impl FetchError {
    /// Transient failures are retried; a rejected permit or a bad payload is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Status(_) | Self::Network(_))
    }
}

impl From<RateLimitExceeded> for FetchError {
    fn from(_: RateLimitExceeded) -> Self {
        Self::RateLimitExceeded
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Favorites I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize favorites: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to replace favorites file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Errors surfaced at the HTTP boundary.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Favorite not found: {0}")]
    NotFound(String),
}

impl warp::reject::Reject for GatewayError {}
