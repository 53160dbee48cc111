//! The offline shell worker.
//!
//! `ShellWorker` reacts to the two lifecycle events:
//! - `on_install`: open the versioned cache and store every shell resource
//! - `on_fetch`: answer a request from the cache, or from the network on a miss
//!
//! `WorkerHost` drives the lifecycle around it and only routes requests
//! through the worker once the version has installed and activated.

pub mod bootstrap;
pub mod error;
pub mod host;
pub mod intercept;
pub mod registration;
pub mod resources;

use std::fmt;
use std::sync::Arc;

use reqwest::Url;
use tracing::{info, warn};

pub use bootstrap::InstallReport;
pub use error::InstallError;
pub use host::WorkerHost;
pub use intercept::{Resolved, ResponseSource};
pub use registration::{Registration, Registry};
pub use resources::{ResourceList, APP_SHELL, CACHE_NAME};

use crate::cache::CacheStorage;
use crate::models::{Request, Response};
use crate::network::{FetchError, Network};

/// Lifecycle state of one worker version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; this version never serves requests.
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

/// What a worker version caches and where it comes from.
#[derive(Debug, Clone)]
pub struct Shell {
    pub cache_name: String,
    pub origin: Url,
    pub resources: ResourceList,
}

impl Shell {
    /// The library app shell under the default cache name.
    pub fn app_shell(origin: Url) -> Self {
        Self {
            cache_name: CACHE_NAME.to_string(),
            origin,
            resources: ResourceList::app_shell(),
        }
    }
}

/// Install and fetch handlers for one worker version.
/// Clone is cheap; storage, network and shell are shared.
#[derive(Clone)]
pub struct ShellWorker {
    storage: Arc<CacheStorage>,
    network: Arc<dyn Network>,
    shell: Arc<Shell>,
}

impl ShellWorker {
    pub fn new(storage: Arc<CacheStorage>, network: Arc<dyn Network>, shell: Shell) -> Self {
        Self {
            storage,
            network,
            shell: Arc::new(shell),
        }
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    pub fn network(&self) -> &dyn Network {
        self.network.as_ref()
    }

    /// Populate the shell cache. Fails as a whole if any resource fails.
    pub async fn on_install(&self) -> Result<InstallReport, InstallError> {
        match bootstrap::install_shell(&self.storage, self.network.as_ref(), &self.shell).await {
            Ok(report) => {
                info!(cache = %report.cache_name, stored = report.stored, "Shell cached");
                Ok(report)
            }
            Err(e) => {
                warn!(cache = %self.shell.cache_name, error = %e, "Install failed");
                Err(e)
            }
        }
    }

    /// Answer a request from the cache, falling back to the network.
    pub async fn on_fetch(&self, request: &Request) -> Result<Response, FetchError> {
        self.resolve(request).await.map(|resolved| resolved.response)
    }

    /// Like `on_fetch`, also reporting which branch served the request.
    pub async fn resolve(&self, request: &Request) -> Result<Resolved, FetchError> {
        intercept::resolve(
            &self.storage,
            &self.shell.cache_name,
            self.network.as_ref(),
            request,
        )
        .await
    }
}
