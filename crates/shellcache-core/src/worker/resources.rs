//! The fixed list of application shell resources.

use std::collections::HashSet;

use reqwest::Url;

use super::InstallError;
use crate::models::RequestKey;

/// Version token of the shell cache. Changing it starts a new, disjoint store.
pub const CACHE_NAME: &str = "library-cache-v1";

/// Core pages and assets needed for the app to open offline.
/// Librarian pages are left out; they are rarely used on the go.
pub const APP_SHELL: &[&str] = &[
    "/",
    "/student_login",
    "/student_register",
    "/static/icon-192x192.png",
    "/static/icon-512x512.png",
];

/// Ordered list of shell paths, resolved against the origin at install time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceList {
    paths: Vec<String>,
}

impl ResourceList {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn app_shell() -> Self {
        Self::new(APP_SHELL.iter().copied())
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Resolve every path against `origin`. Two paths naming the same
    /// request identity are rejected, as a batch may store each key once.
    pub fn resolve(&self, origin: &Url) -> Result<Vec<(String, Url)>, InstallError> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            let url = origin.join(path).map_err(|e| InstallError::InvalidPath {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(InstallError::InvalidPath {
                    path: path.clone(),
                    reason: format!("unsupported scheme {:?}", url.scheme()),
                });
            }
            if !seen.insert(RequestKey::from_url(&url)) {
                return Err(InstallError::DuplicateResource(path.clone()));
            }
            resolved.push((path.clone(), url));
        }
        Ok(resolved)
    }
}

impl Default for ResourceList {
    fn default() -> Self {
        Self::app_shell()
    }
}
