use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::hash::body_file_name;
use super::CacheError;
use crate::models::{Request, RequestKey, Response};
use crate::utils::format_age;

/// Index file name inside each store directory
const INDEX_FILE: &str = "index.json";

/// Scratch file the index is written to before being renamed into place
const INDEX_TMP_FILE: &str = "index.json.tmp";

/// On-disk index layout version
const INDEX_VERSION: u32 = 1;

/// Metadata for one stored response. The body lives in `body_file`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEntry {
    pub key: RequestKey,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub url: String,
    pub body_file: String,
    pub body_len: u64,
    pub stored_at: DateTime<Utc>,
}

impl StoredEntry {
    fn new(key: RequestKey, response: &Response) -> Self {
        Self {
            body_file: body_file_name(&key, &response.body),
            body_len: response.body.len() as u64,
            key,
            status: response.status,
            status_text: response.status_text.clone(),
            headers: response.headers.clone(),
            url: response.url.clone(),
            stored_at: Utc::now(),
        }
    }

    fn to_response(&self, body: Vec<u8>) -> Response {
        Response {
            status: self.status,
            status_text: self.status_text.clone(),
            headers: self.headers.clone(),
            body,
            url: self.url.clone(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.stored_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        format_age(self.age_minutes())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheIndex {
    version: u32,
    entries: Vec<StoredEntry>,
}

/// A single named response store.
///
/// Reads hold the index read lock while the body is loaded; writes hold the
/// write lock for the whole batch, so a reader observes either none or all of
/// a `put_all`.
pub struct Cache {
    name: String,
    dir: PathBuf,
    index: RwLock<BTreeMap<RequestKey, StoredEntry>>,
}

impl Cache {
    /// Load the store in `dir`, creating the directory if it does not exist.
    pub(crate) fn load(name: &str, dir: PathBuf) -> Result<Self, CacheError> {
        std::fs::create_dir_all(&dir).map_err(|e| CacheError::io(&dir, e))?;

        let index_path = dir.join(INDEX_FILE);
        let entries = if index_path.exists() {
            let contents =
                std::fs::read(&index_path).map_err(|e| CacheError::io(&index_path, e))?;
            let index: CacheIndex = serde_json::from_slice(&contents)?;
            if index.version != INDEX_VERSION {
                return Err(CacheError::Corrupt(format!(
                    "{}: unsupported index version {}",
                    name, index.version
                )));
            }
            index
                .entries
                .into_iter()
                .map(|entry| (entry.key.clone(), entry))
                .collect()
        } else {
            BTreeMap::new()
        };

        debug!(cache = name, entries = entries.len(), "Loaded cache index");

        Ok(Self {
            name: name.to_string(),
            dir,
            index: RwLock::new(entries),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Look up the stored response for a request. Requests that can never be
    /// cached (anything but GET) always miss.
    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>, CacheError> {
        match request.cache_key() {
            Some(key) => self.match_key(&key).await,
            None => Ok(None),
        }
    }

    pub async fn match_key(&self, key: &RequestKey) -> Result<Option<Response>, CacheError> {
        let index = self.index.read().await;
        let Some(entry) = index.get(key) else {
            return Ok(None);
        };
        let body = self.read_body(entry)?;
        Ok(Some(entry.to_response(body)))
    }

    pub async fn put(&self, key: RequestKey, response: Response) -> Result<(), CacheError> {
        self.put_all(vec![(key, response)]).await
    }

    /// Store a batch of responses. Either every entry is committed or, on
    /// error, the store is left exactly as it was.
    pub async fn put_all(&self, entries: Vec<(RequestKey, Response)>) -> Result<(), CacheError> {
        let mut index = self.index.write().await;
        let mut next = (*index).clone();
        let mut written = Vec::new();

        if let Err(e) = self.stage_batch(&entries, &mut next, &mut written) {
            for path in written {
                let _ = std::fs::remove_file(path);
            }
            return Err(e);
        }

        // Drop bodies the new index no longer references.
        for (key, old) in index.iter() {
            let still_used = next.values().any(|entry| entry.body_file == old.body_file);
            if !still_used {
                if let Err(e) = std::fs::remove_file(self.dir.join(&old.body_file)) {
                    debug!(cache = %self.name, key = %key, error = %e, "Failed to remove replaced body");
                }
            }
        }

        *index = next;
        Ok(())
    }

    /// Stored keys in sorted order.
    pub async fn keys(&self) -> Vec<RequestKey> {
        self.index.read().await.keys().cloned().collect()
    }

    /// Metadata for every stored entry, sorted by key.
    pub async fn entries(&self) -> Vec<StoredEntry> {
        self.index.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.index.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.index.read().await.is_empty()
    }

    /// Write new bodies and the updated index. Paths of freshly written
    /// bodies are pushed to `written` so a failed batch can be rolled back.
    /// A key given more than once keeps its last response.
    fn stage_batch(
        &self,
        entries: &[(RequestKey, Response)],
        next: &mut BTreeMap<RequestKey, StoredEntry>,
        written: &mut Vec<PathBuf>,
    ) -> Result<(), CacheError> {
        let batch: BTreeMap<&RequestKey, &Response> =
            entries.iter().map(|(key, response)| (key, response)).collect();

        for (key, response) in batch {
            let entry = StoredEntry::new(key.clone(), response);
            let path = self.dir.join(&entry.body_file);
            match std::fs::metadata(&path) {
                Ok(meta) if meta.len() == entry.body_len => {}
                existing => {
                    self.write_body(&path, &response.body)?;
                    if existing.is_err() {
                        written.push(path);
                    }
                }
            }
            next.insert(key.clone(), entry);
        }
        self.write_index(next)
    }

    /// Write a body under its final name via a scratch file, so the name
    /// never refers to a partial body.
    fn write_body(&self, path: &Path, body: &[u8]) -> Result<(), CacheError> {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        if let Err(e) = std::fs::write(&tmp, body) {
            let _ = std::fs::remove_file(&tmp);
            return Err(CacheError::io(&tmp, e));
        }
        std::fs::rename(&tmp, path).map_err(|e| CacheError::io(path, e))
    }

    fn read_body(&self, entry: &StoredEntry) -> Result<Vec<u8>, CacheError> {
        let path = self.dir.join(&entry.body_file);
        let body = match std::fs::read(&path) {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CacheError::Corrupt(format!("missing body for {}", entry.key)));
            }
            Err(e) => return Err(CacheError::io(&path, e)),
        };
        if body.len() as u64 != entry.body_len {
            return Err(CacheError::Corrupt(format!(
                "body length mismatch for {}: expected {}, found {}",
                entry.key,
                entry.body_len,
                body.len()
            )));
        }
        Ok(body)
    }

    fn write_index(&self, entries: &BTreeMap<RequestKey, StoredEntry>) -> Result<(), CacheError> {
        let index = CacheIndex {
            version: INDEX_VERSION,
            entries: entries.values().cloned().collect(),
        };
        let contents = serde_json::to_vec_pretty(&index)?;

        let tmp = self.dir.join(INDEX_TMP_FILE);
        std::fs::write(&tmp, contents).map_err(|e| CacheError::io(&tmp, e))?;
        let path = self.dir.join(INDEX_FILE);
        std::fs::rename(&tmp, &path).map_err(|e| CacheError::io(&path, e))?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
