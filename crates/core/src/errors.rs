//! Error types

use thiserror::Error;

use crate::Accessor;

/// Core error types
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

impl From<::config::ConfigError> for CoreError {
    fn from(e: ::config::ConfigError) -> Self {
        CoreError::InvalidConfig(e.to_string())
    }
}

/// Raised when post-processing meets a payload it cannot slice or project.
///
/// Unlike upstream I/O failures these are never turned into an absent value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("{accessor}: expected a JSON array, got {found}")]
    NotSequence {
        accessor: Accessor,
        found: &'static str,
    },

    #[error("{accessor}: expected a JSON object, got {found}")]
    NotObject {
        accessor: Accessor,
        found: &'static str,
    },

    #[error("{accessor}: missing field '{field}'")]
    MissingField {
        accessor: Accessor,
        field: &'static str,
    },
}

impl ShapeError {
    pub fn accessor(&self) -> Accessor {
        match self {
            ShapeError::NotSequence { accessor, .. }
            | ShapeError::NotObject { accessor, .. }
            | ShapeError::MissingField { accessor, .. } => *accessor,
        }
    }
}

/// Result type alias
pub type CoreResult<T> = Result<T, CoreError>;
