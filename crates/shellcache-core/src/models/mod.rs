//! Data models for intercepted traffic.
//!
//! - `Request`: what the controlled page asked for, forwarded verbatim on a miss
//! - `RequestKey`: the identity a request is stored and matched under
//! - `Response`: a network or cached response

pub mod request;
pub mod response;

pub use request::{Request, RequestKey};
pub use response::Response;
