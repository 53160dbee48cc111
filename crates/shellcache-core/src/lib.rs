//! Offline app-shell caching for the library web app.
//!
//! On install, the worker fetches a fixed list of shell resources into a
//! versioned cache store. Afterwards every request is answered from that
//! store when it holds a match, and from the network otherwise.

pub mod cache;
pub mod config;
pub mod models;
pub mod network;
pub mod utils;
pub mod worker;

pub use cache::{Cache, CacheError, CacheStorage};
pub use config::Config;
pub use models::{Request, RequestKey, Response};
pub use network::{FetchError, HttpNetwork, Network};
pub use reqwest::{Method, Url};
pub use worker::{
    InstallError, InstallReport, Registry, ResourceList, ResponseSource, Shell, ShellWorker,
    WorkerHost, WorkerState,
};
