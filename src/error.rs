//! Error types for noticeboard.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Notice type or key failed validation.
    #[error("invalid notice identity: {0}")]
    InvalidIdentity(String),

    /// A filter value supplied by the caller is not one of the accepted values.
    #[error("invalid {param} parameter {value:?}: expected {accepted}")]
    InvalidFilter {
        param: &'static str,
        value: String,
        accepted: String,
    },

    /// A stored notice could not be projected into its legacy shape.
    #[error("cannot convert notice {identity}: {reason}")]
    Conversion { identity: String, reason: String },

    #[error("notice state lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build an [`Error::InvalidFilter`] listing the accepted values.
    pub fn invalid_filter(param: &'static str, value: impl Into<String>, accepted: &[&str]) -> Self {
        let accepted = accepted
            .iter()
            .map(|a| format!("{a:?}"))
            .collect::<Vec<_>>()
            .join(" or ");
        Error::InvalidFilter {
            param,
            value: value.into(),
            accepted,
        }
    }

    /// Caller mistakes: bad identity components or filter values.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::InvalidIdentity(_) | Error::InvalidFilter { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
