//! Install-time population of the shell cache.

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

use super::{InstallError, Shell};
use crate::cache::CacheStorage;
use crate::models::{Request, RequestKey, Response};
use crate::network::Network;

/// Maximum concurrent shell fetches during install.
const MAX_CONCURRENT_FETCHES: usize = 4;

/// Outcome of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub cache_name: String,
    pub stored: usize,
}

/// Open the shell cache and fill it with every resource in the list.
///
/// Every fetch must succeed with a 2xx status before anything is written;
/// the responses are then committed in a single batch. The first failure
/// aborts the remaining fetches and leaves the store untouched.
pub(crate) async fn install_shell(
    storage: &CacheStorage,
    network: &dyn Network,
    shell: &Shell,
) -> Result<InstallReport, InstallError> {
    let targets = shell.resources.resolve(&shell.origin)?;

    let cache = storage.open(&shell.cache_name).await?;
    info!(cache = %shell.cache_name, "Opened cache");

    let fetched: Vec<(RequestKey, Response)> = stream::iter(targets)
        .map(|(path, url)| async move {
            let request = Request::get(url);
            let response = network
                .fetch(&request)
                .await
                .map_err(|source| InstallError::Fetch {
                    path: path.clone(),
                    source,
                })?;
            if !response.is_ok() {
                return Err(InstallError::BadStatus {
                    path,
                    status: response.status,
                });
            }
            debug!(path = %path, bytes = response.body.len(), "Fetched shell resource");
            Ok::<_, InstallError>((RequestKey::from_url(&request.url), response))
        })
        .buffer_unordered(MAX_CONCURRENT_FETCHES)
        .try_collect()
        .await?;

    let stored = fetched.len();
    cache.put_all(fetched).await?;

    Ok(InstallReport {
        cache_name: shell.cache_name.clone(),
        stored,
    })
}
