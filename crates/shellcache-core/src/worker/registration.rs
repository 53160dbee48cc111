//! Persisted record of the active worker version.
//!
//! A version only serves requests once it has installed and activated. The
//! registration survives restarts so a later process can pick up the
//! active version without installing again.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::CacheError;
use crate::utils::format_age;

/// Registration file name in the storage root
const REGISTRATION_FILE: &str = "registration.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub cache_name: String,
    pub origin: String,
    pub activated_at: DateTime<Utc>,
}

impl Registration {
    pub fn new(cache_name: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            cache_name: cache_name.into(),
            origin: origin.into(),
            activated_at: Utc::now(),
        }
    }

    pub fn age_display(&self) -> String {
        format_age((Utc::now() - self.activated_at).num_minutes())
    }
}

pub struct Registry {
    dir: PathBuf,
}

impl Registry {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Load the active registration, if one was saved.
    pub fn load(&self) -> Result<Option<Registration>, CacheError> {
        let path = self.registration_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read(&path).map_err(|e| CacheError::io(&path, e))?;
        Ok(Some(serde_json::from_slice(&contents)?))
    }

    pub fn save(&self, registration: &Registration) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| CacheError::io(&self.dir, e))?;
        let path = self.registration_path();
        let contents = serde_json::to_vec_pretty(registration)?;
        std::fs::write(&path, contents).map_err(|e| CacheError::io(&path, e))?;
        Ok(())
    }

    fn registration_path(&self) -> PathBuf {
        self.dir.join(REGISTRATION_FILE)
    }
}
