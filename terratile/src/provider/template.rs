//! URL-template tile source.
//!
//! Fills a URL template with a tile's coordinates and fetches it over HTTP.
//! Supported placeholders:
//!
//! - `{quadkey}` - Bing-style quadkey (empty for the root tile)
//! - `{z}` - level
//! - `{x}` - column
//! - `{y}` - row

use super::http::AsyncHttpClient;
use super::types::{ProviderError, TileSource};
use crate::cache::BoxFuture;
use crate::coord::{TileIndex, MAX_LEVEL};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Tile source backed by an HTTP endpoint.
pub struct UrlTemplateSource<C: AsyncHttpClient> {
    client: C,
    name: String,
    template: String,
    min_level: u8,
    max_level: u8,
    headers: Vec<(String, String)>,
}

impl<C: AsyncHttpClient> UrlTemplateSource<C> {
    /// Creates a source serving every level.
    pub fn new(client: C, name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
            template: template.into(),
            min_level: 0,
            max_level: MAX_LEVEL,
            headers: Vec::new(),
        }
    }

    /// Restricts the levels this source answers for.
    pub fn with_levels(mut self, min_level: u8, max_level: u8) -> Self {
        self.min_level = min_level;
        self.max_level = max_level.min(MAX_LEVEL);
        self
    }

    /// Adds a header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// The raw URL template.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Builds the request URL for one tile.
    pub fn build_url(&self, tile: &TileIndex) -> Result<String, ProviderError> {
        if tile.level() < self.min_level || tile.level() > self.max_level {
            return Err(ProviderError::UnsupportedLevel(tile.level()));
        }

        Ok(self
            .template
            .replace("{quadkey}", &tile.to_quadkey())
            .replace("{z}", &tile.level().to_string())
            .replace("{x}", &tile.col().to_string())
            .replace("{y}", &tile.row().to_string()))
    }

    async fn request(&self, url: &str) -> Result<Option<Vec<u8>>, ProviderError> {
        if self.headers.is_empty() {
            return self.client.get(url).await;
        }
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        self.client.get_with_headers(url, &headers).await
    }
}

impl<C: AsyncHttpClient> TileSource for UrlTemplateSource<C> {
    fn fetch_tile<'a>(
        &'a self,
        tile: TileIndex,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Option<Vec<u8>>, ProviderError>> {
        Box::pin(async move {
            let url = match self.build_url(&tile) {
                Ok(url) => url,
                Err(ProviderError::UnsupportedLevel(level)) => {
                    debug!(source = %self.name, level, "Level outside source range");
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ProviderError::Cancelled),
                result = self.request(&url) => result,
            }
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
