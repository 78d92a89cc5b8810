//! Error handling for SiteBox

use thiserror::Error;

use crate::engine::EngineError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("download engine error: {0}")]
    Engine(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

impl Error {
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, Error::Persistence(_))
    }
}

impl From<EngineError> for Error {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidInput { field, message } => {
                Error::Validation(format!("{}: {}", field, message))
            }
            other => Error::Engine(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
