use thiserror::Error;

use crate::cache::CacheError;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Network unavailable: {0}")]
    Unavailable(String),

    #[error("Cache lookup failed: {0}")]
    Cache(#[from] CacheError),
}

impl FetchError {
    /// True when the failure came from the transport rather than local storage.
    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Network(_) | FetchError::Unavailable(_))
    }
}
