//! Crate-level error kinds.
//!
//! Module-local errors ([`CoordError`](crate::coord::CoordError),
//! [`ProviderError`](crate::provider::ProviderError),
//! [`ConfigError`](crate::config::ConfigError)) convert into [`TerraError`]
//! so callers deal with a single error type at the API surface. Record and
//! codec failures become [`TerraError::Corrupt`] at the point where the
//! offending tile is known.

use thiserror::Error;

/// Errors surfaced by geodesy, coordinate, cache and elevation operations.
#[derive(Debug, Error)]
pub enum TerraError {
    /// The tile is absent at this cache tier.
    #[error("Tile not found: '{tile}'")]
    NotFound {
        /// Quadkey of the missing tile
        tile: String,
    },

    /// A stored row or payload could not be decoded.
    #[error("Corrupt tile '{tile}': {reason}")]
    Corrupt {
        /// Quadkey of the damaged tile
        tile: String,
        /// What failed to decode
        reason: String,
    },

    /// Cooperative cancellation was observed.
    #[error("Operation cancelled")]
    Cancelled,

    /// Invalid construction parameters (ellipsoid radii, unwritable store).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A geometric query has no defined answer (pole crossing, exact pole).
    #[error("Geometry error: {0}")]
    Geometry(String),

    /// A remote tile or elevation source failed.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TerraError {
    /// Creates a corrupt-row error.
    pub fn corrupt(tile: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            tile: tile.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns true for errors that behave like a cache miss.
    ///
    /// Corrupt rows degrade to misses so a damaged entry falls through to
    /// the next provider instead of failing the query.
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Corrupt { .. })
    }
}
