//! Application configuration management.
//!
//! Configuration is stored at `~/.config/shellcache/config.json`. Every field
//! is optional; missing fields fall back to the library app shell defaults.
//! `SHELLCACHE_ORIGIN` and `SHELLCACHE_CACHE_DIR` override the file.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::network::client::REQUEST_TIMEOUT_SECS;
use crate::worker::{ResourceList, Shell, CACHE_NAME};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "shellcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Origin used when none is configured (the Flask development server)
pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:5000";

/// Environment variable overriding `origin`
pub const ORIGIN_ENV: &str = "SHELLCACHE_ORIGIN";

/// Environment variable overriding `cache_dir`
pub const CACHE_DIR_ENV: &str = "SHELLCACHE_CACHE_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub origin: Option<String>,
    pub cache_name: Option<String>,
    pub resources: Option<Vec<String>>,
    pub cache_dir: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Load from the default location and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// `load`). Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(origin) = lookup(ORIGIN_ENV).filter(|v| !v.is_empty()) {
            self.origin = Some(origin);
        }
        if let Some(dir) = lookup(CACHE_DIR_ENV).filter(|v| !v.is_empty()) {
            self.cache_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn origin(&self) -> Result<Url> {
        let raw = self.origin.as_deref().unwrap_or(DEFAULT_ORIGIN);
        let url = Url::parse(raw).with_context(|| format!("Invalid origin: {}", raw))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("Origin must be http or https: {}", raw);
        }
        Ok(url)
    }

    pub fn cache_name(&self) -> &str {
        self.cache_name.as_deref().unwrap_or(CACHE_NAME)
    }

    pub fn resources(&self) -> ResourceList {
        match self.resources {
            Some(ref paths) => ResourceList::new(paths.iter().cloned()),
            None => ResourceList::app_shell(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(REQUEST_TIMEOUT_SECS))
    }

    /// Storage root for cache generations and the worker registration.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn shell(&self) -> Result<Shell> {
        Ok(Shell {
            cache_name: self.cache_name().to_string(),
            origin: self.origin()?,
            resources: self.resources(),
        })
    }
}
