//! Lifecycle driver for a worker version.

use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{InstallError, InstallReport, Registration, Registry, Resolved, ResponseSource};
use super::{ShellWorker, WorkerState};
use crate::cache::CacheError;
use crate::models::Request;
use crate::network::FetchError;

/// Hosts one `ShellWorker` version and dispatches lifecycle events to it.
///
/// Requests are only intercepted once the version is `Activated`. Until
/// then (and forever, once `Redundant`) they go straight to the network.
pub struct WorkerHost {
    worker: ShellWorker,
    registry: Registry,
    state: RwLock<WorkerState>,
}

impl WorkerHost {
    /// A fresh, not yet installed version.
    pub fn new(worker: ShellWorker, registry: Registry) -> Self {
        Self {
            worker,
            registry,
            state: RwLock::new(WorkerState::Parsed),
        }
    }

    /// Resume from a saved registration. The version starts `Activated` when
    /// the registration names this worker's cache and origin and the store
    /// still exists; otherwise it has to install first.
    pub fn restore(worker: ShellWorker, registry: Registry) -> Result<Self, CacheError> {
        let shell = worker.shell();
        let active = match registry.load()? {
            Some(registration) => {
                registration.cache_name == shell.cache_name
                    && registration.origin == shell.origin.as_str()
                    && worker.storage().has(&shell.cache_name)?
            }
            None => false,
        };
        let state = if active {
            WorkerState::Activated
        } else {
            WorkerState::Parsed
        };
        debug!(cache = %shell.cache_name, state = %state, "Restored worker");

        Ok(Self {
            worker,
            registry,
            state: RwLock::new(state),
        })
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    pub fn worker(&self) -> &ShellWorker {
        &self.worker
    }

    pub fn registration(&self) -> Result<Option<Registration>, CacheError> {
        self.registry.load()
    }

    /// Run the install event, then activate. The call completes only once the
    /// whole shell is cached. Any failure leaves the version `Redundant`.
    pub async fn install(&self) -> Result<InstallReport, InstallError> {
        self.begin_install().await?;

        let report = match self.worker.on_install().await {
            Ok(report) => report,
            Err(e) => {
                self.set_state(WorkerState::Redundant).await;
                return Err(e);
            }
        };
        self.set_state(WorkerState::Installed).await;

        self.set_state(WorkerState::Activating).await;
        let shell = self.worker.shell();
        let registration = Registration::new(shell.cache_name.clone(), shell.origin.as_str());
        if let Err(e) = self.registry.save(&registration) {
            self.set_state(WorkerState::Redundant).await;
            return Err(e.into());
        }
        self.set_state(WorkerState::Activated).await;
        info!(cache = %shell.cache_name, "Worker activated");

        Ok(report)
    }

    /// Route a request from a controlled page.
    pub async fn dispatch_fetch(&self, request: &Request) -> Result<Resolved, FetchError> {
        if self.state().await == WorkerState::Activated {
            return self.worker.resolve(request).await;
        }

        debug!(url = %request.url, "Worker not active, passing request through");
        let response = self.worker.network().fetch(request).await?;
        Ok(Resolved {
            response,
            source: ResponseSource::Network,
        })
    }

    async fn begin_install(&self) -> Result<(), InstallError> {
        let mut state = self.state.write().await;
        if *state != WorkerState::Parsed {
            return Err(InstallError::InvalidState(*state));
        }
        *state = WorkerState::Installing;
        Ok(())
    }

    async fn set_state(&self, next: WorkerState) {
        let mut state = self.state.write().await;
        let previous = *state;
        debug!(from = %previous, to = %next, "Worker state change");
        *state = next;
    }
}
