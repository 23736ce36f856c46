//! Error types for the memoization cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache and backend operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backend failed to open, read, or write
    #[error("Backend error: {0}")]
    Backend(String),

    /// Operation attempted after the cache or backend was closed
    #[error("Cache is closed")]
    Closed,

    /// A stored value or access time could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Configuration value could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CacheError {
    /// Builds a `Backend` error from a context message and the underlying cause.
    pub fn backend(context: impl std::fmt::Display, cause: impl std::fmt::Display) -> Self {
        CacheError::Backend(format!("{}: {}", context, cause))
    }

    /// Returns true if this error was raised because the cache is closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, CacheError::Closed)
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
