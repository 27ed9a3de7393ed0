use sp_core::{StationId, Timestep};
use sp_sync::SyncError;
use thiserror::Error;

/// A per-request failure.  Never leaves barrier or index state changed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("timestep {ts} is past the last simulated timestep {max_ts}")]
    OutOfRange { ts: Timestep, max_ts: Timestep },

    #[error("unknown station {0}")]
    UnknownStation(StationId),

    #[error("coverage request cancelled")]
    Cancelled,

    #[error("provider is shutting down")]
    Closed,

    #[error("provider configuration error: {0}")]
    Config(String),
}

impl From<SyncError> for ProviderError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::Cancelled => ProviderError::Cancelled,
            SyncError::Closed => ProviderError::Closed,
            SyncError::EmptyFleet => ProviderError::Config(e.to_string()),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
