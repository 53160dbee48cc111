//! Network access for the worker.
//!
//! The worker never talks to reqwest directly; it goes through the `Network`
//! trait so the same install and intercept logic runs against the live
//! origin (`HttpNetwork`) or any other transport.

pub mod client;
pub mod error;

pub use client::HttpNetwork;
pub use error::FetchError;

use crate::models::{Request, Response};

/// A transport that turns a request into a response.
///
/// Implementations follow fetch semantics: an HTTP error status is a
/// successful fetch (`Ok` with a non-2xx response); only transport failures
/// are `Err`.
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError>;
}
