use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;

use crate::errors::FetchError;

/// A completed HTTP exchange: status plus raw body.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// One GET against the catalog endpoint. Implementations report transport
/// failures as `FetchError::Network`; status handling is left to the caller.
#[async_trait]
pub trait CatalogTransport: Send + Sync + 'static {
    async fn get(&self, url: &str) -> Result<TransportResponse, FetchError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("starship-catalog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CatalogTransport for HttpTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::warn!("Error requesting {}: {}", url, e);
            FetchError::Network(e.to_string())
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            tracing::warn!("Error reading response body from {}: {}", url, e);
            FetchError::Network(e.to_string())
        })?;

        Ok(TransportResponse { status, body })
    }
}
