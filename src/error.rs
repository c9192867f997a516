//! Error taxonomy for the results engine.
//!
//! Individual lookups that find nothing surface as [`ResultsError::NotFound`], store failures as
//! [`ResultsError::UpstreamUnavailable`]. Data-quality problems are logged where they are found
//! and only materialize as [`ResultsError::DataInconsistency`] when a caller asks for one.

use std::path::PathBuf;
use thiserror::Error;

use crate::storage::StorageError;

pub type Result<T, E = ResultsError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ResultsError {
    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("{store} unavailable: {reason}")]
    UpstreamUnavailable {
        store: &'static str,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("data inconsistency: {details}")]
    DataInconsistency { details: String },

    #[error("invalid input: {details}")]
    InvalidInput { details: String },

    #[error("failed to write export {path}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode results document")]
    Encode(#[from] serde_json::Error),
}

impl ResultsError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ResultsError::NotFound { what: what.into() }
    }

    pub fn inconsistency(details: impl Into<String>) -> Self {
        ResultsError::DataInconsistency {
            details: details.into(),
        }
    }

    pub fn invalid_input(details: impl Into<String>) -> Self {
        ResultsError::InvalidInput {
            details: details.into(),
        }
    }

    /// Whether the periodic export should simply try again on its next tick.
    pub fn is_retryable(&self) -> bool {
        match self {
            ResultsError::UpstreamUnavailable { .. } => true,
            ResultsError::Export { .. } => true,
            ResultsError::NotFound { .. } => false,
            ResultsError::DataInconsistency { .. } => false,
            ResultsError::InvalidInput { .. } => false,
            ResultsError::Encode(_) => false,
        }
    }
}

impl From<StorageError> for ResultsError {
    fn from(err: StorageError) -> Self {
        let store = err.store();
        let reason = err.message().to_string();
        ResultsError::UpstreamUnavailable {
            store,
            reason,
            source: Some(Box::new(err)),
        }
    }
}
