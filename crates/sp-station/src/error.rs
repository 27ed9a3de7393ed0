//! Error types for sp-station.

use sp_provider::ProviderError;
use thiserror::Error;

/// Errors that end a station run.
#[derive(Debug, Error)]
pub enum StationError {
    #[cfg(feature = "http")]
    #[error("request to {url} failed: {source}")]
    Http {
        url:    String,
        #[source]
        source: reqwest::Error,
    },

    #[cfg(feature = "http")]
    #[error("invalid provider address {addr:?}: {reason}")]
    Address { addr: String, reason: String },

    #[error("provider answered {status} for {url}")]
    Status { url: String, status: u16 },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
}

/// Alias for `Result<T, StationError>`.
pub type StationResult<T> = Result<T, StationError>;
