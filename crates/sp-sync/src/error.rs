use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("wait cancelled by caller")]
    Cancelled,

    #[error("barrier closed")]
    Closed,

    #[error("a barrier needs at least one station")]
    EmptyFleet,
}

pub type SyncResult<T> = Result<T, SyncError>;
