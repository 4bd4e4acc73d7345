//! Provider error types.

use thiserror::Error;

/// Errors from an external search, catalog or feature provider.
///
/// None of these are ever memoized: a failed lookup leaves the memo as it
/// was.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// An HTTP request to the provider failed.
    #[error("HTTP error from {source_name}: {message}")]
    Http {
        source_name: String,
        message: String,
    },

    /// The provider returned a rate-limit response.
    #[error("rate limited by {source_name}")]
    RateLimited { source_name: String },

    /// A response from the provider could not be parsed.
    #[error("parse error from {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// An error propagated from `reqwest`.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned feature values that do not form a valid feel.
    #[error("invalid features: {0}")]
    InvalidFeatures(#[from] watsong_core::Error),

    /// A batch response did not line up with its request.
    #[error("batch response has {returned} entries for {requested} requested")]
    MisalignedBatch { requested: usize, returned: usize },
}

/// Convenience alias for provider results.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
