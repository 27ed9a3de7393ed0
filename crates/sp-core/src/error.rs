//! Workspace base error type.
//!
//! Sub-crates define their own error enums and convert `SpError` into them
//! via `From` impls where a core value (an id, a config) fails validation.

use thiserror::Error;

/// The top-level error type for `sp-core`.
#[derive(Debug, Error)]
pub enum SpError {
    #[error("invalid {kind} {raw:?}")]
    InvalidId { kind: &'static str, raw: String },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `sp-core`.
pub type SpResult<T> = Result<T, SpError>;
