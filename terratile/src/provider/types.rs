//! Provider types and traits

use crate::cache::BoxFuture;
use crate::coord::TileIndex;
use crate::error::TerraError;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors that can occur during provider operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Level not served by this source
    #[error("Level {0} not supported by provider")]
    UnsupportedLevel(u8),

    /// Invalid response data from provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The request was abandoned on cancellation
    #[error("Request cancelled")]
    Cancelled,
}

impl From<ProviderError> for TerraError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Cancelled => TerraError::Cancelled,
            other => TerraError::Provider(other.to_string()),
        }
    }
}

/// A remote or alternate source of raw tile bytes.
///
/// `Ok(None)` means the source has no such tile.
pub trait TileSource: Send + Sync {
    /// Fetches the encoded bytes of one tile.
    fn fetch_tile<'a>(
        &'a self,
        tile: TileIndex,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Option<Vec<u8>>, ProviderError>>;

    /// Returns the source's name for logging and identification.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_maps_to_cancelled() {
        let err: TerraError = ProviderError::Cancelled.into();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_http_error_maps_to_provider() {
        let err: TerraError = ProviderError::HttpError("HTTP 500".to_string()).into();
        assert!(matches!(err, TerraError::Provider(ref msg) if msg.contains("HTTP 500")));
    }
}
