use thiserror::Error;

use super::WorkerState;
use crate::cache::CacheError;
use crate::network::FetchError;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Invalid resource path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Duplicate resource in app shell: {0}")]
    DuplicateResource(String),

    #[error("Failed to fetch {path}: {source}")]
    Fetch {
        path: String,
        #[source]
        source: FetchError,
    },

    #[error("Bad response for {path}: status {status}")]
    BadStatus { path: String, status: u16 },

    #[error("Cache error: {0}")]
    Store(#[from] CacheError),

    #[error("Worker cannot install from state {0}")]
    InvalidState(WorkerState),
}

impl InstallError {
    /// Resource path the failure is attributed to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            InstallError::InvalidPath { path, .. }
            | InstallError::Fetch { path, .. }
            | InstallError::BadStatus { path, .. } => Some(path),
            InstallError::DuplicateResource(path) => Some(path),
            InstallError::Store(_) | InstallError::InvalidState(_) => None,
        }
    }
}
