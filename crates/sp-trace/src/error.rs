use std::path::PathBuf;

use sp_core::SpError;
use thiserror::Error;

use crate::TraceKind;

/// A trace could not be turned into an index set.  Always fatal at startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unable to read {}: {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {trace} trace: {source}")]
    Json {
        trace:  TraceKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed {trace} trace: {reason}")]
    Malformed { trace: TraceKind, reason: String },

    #[error(transparent)]
    Config(#[from] SpError),
}

impl LoadError {
    pub(crate) fn malformed(trace: TraceKind, reason: impl Into<String>) -> Self {
        LoadError::Malformed { trace, reason: reason.into() }
    }
}

pub type LoadResult<T> = Result<T, LoadError>;
