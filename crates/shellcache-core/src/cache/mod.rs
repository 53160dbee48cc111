//! Named persistent response stores.
//!
//! `CacheStorage` owns a root directory with one sub-directory per named
//! store. Each `Cache` keeps an `index.json` with response metadata and one
//! body file per entry. Stores are created lazily on first open and are
//! never deleted; a new version token simply means a new directory.

pub mod error;
pub mod hash;
pub mod storage;
pub mod store;

pub use error::CacheError;
pub use storage::CacheStorage;
pub use store::{Cache, StoredEntry};
