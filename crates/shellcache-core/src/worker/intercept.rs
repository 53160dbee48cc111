//! Fetch-time cache-or-network resolution.

use tracing::debug;

use crate::cache::CacheStorage;
use crate::models::{Request, Response};
use crate::network::{FetchError, Network};

/// Which branch produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
}

/// A response together with the branch that served it.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub response: Response,
    pub source: ResponseSource,
}

/// Serve `request` from the named store, or from the network on a miss.
///
/// Misses are not written back. A missing store is an ordinary miss.
pub(crate) async fn resolve(
    storage: &CacheStorage,
    cache_name: &str,
    network: &dyn Network,
    request: &Request,
) -> Result<Resolved, FetchError> {
    if let Some(cache) = storage.get(cache_name).await? {
        if let Some(response) = cache.match_request(request).await? {
            debug!(method = %request.method, url = %request.url, "Cache hit");
            return Ok(Resolved {
                response,
                source: ResponseSource::Cache,
            });
        }
    }

    debug!(method = %request.method, url = %request.url, "Cache miss, fetching from network");
    let response = network.fetch(request).await?;
    Ok(Resolved {
        response,
        source: ResponseSource::Network,
    })
}
