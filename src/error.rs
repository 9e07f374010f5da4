//! Error types for queue-gateway.

use crate::model::Backend;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Caller input was malformed. Always a 4xx at the boundary.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A call to a backing service failed. Never retried within a request.
    #[error("{backend} unavailable: {reason}")]
    BackendUnavailable { backend: Backend, reason: String },

    /// The broker refused the publish (negative acknowledgement).
    #[error("publish rejected: {0}")]
    PublishRejected(String),

    /// Bootstrap gave up on a backend. Terminates the process.
    #[error("could not connect to {backend} after {attempts} attempts")]
    Fatal { backend: Backend, attempts: u32 },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn store(reason: impl std::fmt::Display) -> Self {
        Self::BackendUnavailable {
            backend: Backend::Store,
            reason: reason.to_string(),
        }
    }

    pub fn queue(reason: impl std::fmt::Display) -> Self {
        Self::BackendUnavailable {
            backend: Backend::Queue,
            reason: reason.to_string(),
        }
    }

    /// The backing service responsible for this error, if any.
    pub fn backend(&self) -> Option<Backend> {
        match self {
            Self::BackendUnavailable { backend, .. } | Self::Fatal { backend, .. } => {
                Some(*backend)
            }
            Self::PublishRejected(_) => Some(Backend::Queue),
            _ => None,
        }
    }
}

impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Self::store(e)
    }
}

impl From<lapin::Error> for Error {
    fn from(e: lapin::Error) -> Self {
        Self::queue(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
