//! Response model shared by the network and the cache.

use serde::{Deserialize, Serialize};

/// A fully buffered HTTP response.
///
/// Headers are kept as ordered name/value pairs so a stored response is
/// returned exactly as it was received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    #[serde(skip)]
    pub body: Vec<u8>,
    /// Final URL after redirects.
    pub url: String,
}

impl Response {
    pub fn new(status: u16, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: String::new(),
            headers: Vec::new(),
            body: body.into(),
            url: url.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// True for 2xx statuses, matching the fetch API's `ok` flag.
    pub fn is_ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// First header with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_ok_range() {
        assert!(Response::new(200, "/", "").is_ok());
        assert!(Response::new(204, "/", "").is_ok());
        assert!(!Response::new(304, "/", "").is_ok());
        assert!(!Response::new(404, "/", "").is_ok());
        assert!(!Response::new(500, "/", "").is_ok());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = Response::new(200, "/", "").with_header("Content-Type", "text/html");
        assert_eq!(response.header("content-type"), Some("text/html"));
        assert_eq!(response.header("etag"), None);
    }
}
