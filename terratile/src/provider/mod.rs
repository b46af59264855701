//! Remote tile sources
//!
//! A [`TileSource`] returns the raw encoded bytes for a tile from somewhere
//! other than the local store. [`UrlTemplateSource`] fetches over HTTP
//! through an [`AsyncHttpClient`], which keeps network access mockable.
//!
//! ```ignore
//! use terratile::provider::{AsyncReqwestClient, UrlTemplateSource};
//!
//! let client = AsyncReqwestClient::new()?;
//! let source = UrlTemplateSource::new(client, "dem", "https://dem.example.com/{z}/{x}/{y}.png");
//! ```

mod http;
mod template;
mod types;

pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_TIMEOUT_SECS};
pub use template::UrlTemplateSource;
pub use types::{ProviderError, TileSource};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
