//! HTTP transport for tile sources.

use super::types::ProviderError;
use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Trait for asynchronous HTTP client operations.
///
/// `404 Not Found` and `204 No Content` are not errors: they resolve to
/// `Ok(None)` so tile sources can report absence without string matching.
pub trait AsyncHttpClient: Send + Sync {
    /// GET `url`, returning the body or `None` when the server has no tile.
    fn get(&self, url: &str) -> impl Future<Output = Result<Option<Vec<u8>>, ProviderError>> + Send;

    /// GET with extra `(name, value)` request headers.
    fn get_with_headers(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> impl Future<Output = Result<Option<Vec<u8>>, ProviderError>> + Send;
}

const USER_AGENT: &str = concat!("terratile/", env!("CARGO_PKG_VERSION"));

/// [`AsyncHttpClient`] backed by a shared `reqwest` connection pool.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a client with the default timeout.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a client with a custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                ProviderError::HttpError(format!("cannot build HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<Option<Vec<u8>>, ProviderError> {
        trace!(url, "Tile request");

        let response = request.send().await.map_err(|e| {
            warn!(url, error = %e, timeout = e.is_timeout(), "Tile request failed");
            ProviderError::HttpError(format!("request to {} failed: {}", url, e))
        })?;

        let status = response.status();
        debug!(url, status = status.as_u16(), "Tile response");
        if !tile_expected(status, url)? {
            return Ok(None);
        }

        let body = response.bytes().await.map_err(|e| {
            warn!(url, error = %e, "Tile body truncated");
            ProviderError::HttpError(format!("reading body of {} failed: {}", url, e))
        })?;
        trace!(url, bytes = body.len(), "Tile body read");
        Ok(Some(body.to_vec()))
    }
}

/// Maps a response status to "body follows" (`true`) or "no such tile"
/// (`false`).
fn tile_expected(status: StatusCode, url: &str) -> Result<bool, ProviderError> {
    match status {
        StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => Ok(false),
        s if s.is_success() => Ok(true),
        s => {
            warn!(url, status = s.as_u16(), "Tile server refused request");
            Err(ProviderError::HttpError(format!("HTTP {} from {}", s, url)))
        }
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<Option<Vec<u8>>, ProviderError> {
        self.send(self.client.get(url), url).await
    }

    async fn get_with_headers(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<Option<Vec<u8>>, ProviderError> {
        let request = headers
            .iter()
            .fold(self.client.get(url), |request, (name, value)| {
                request.header(*name, *value)
            });
        self.send(request, url).await
    }
}
