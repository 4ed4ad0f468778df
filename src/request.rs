//! Request and response descriptors.
//!
//! Requests are immutable once scheduled. Their identity (method, url,
//! headers, body) is hashed into a [`CacheKey`]; the size estimate used for
//! speculative budgeting is deliberately excluded from the key.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable SHA-256 digest of a request's identity-defining fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// An outgoing HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// Header names are stored lowercased so that casing does not split cache entries.
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
    /// Expected response size. Charged against the speculative budget at admission.
    pub estimated_bytes: Option<u64>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            estimated_bytes: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self::new(Method::Post, url).with_body(body)
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_estimated_bytes(mut self, bytes: u64) -> Self {
        self.estimated_bytes = Some(bytes);
        self
    }

    /// Compute the cache key from method, url, headers and body.
    ///
    /// Each field is length-prefixed so adjacent fields cannot alias.
    pub fn cache_key(&self) -> CacheKey {
        let mut hasher = Sha256::new();
        update_field(&mut hasher, self.method.as_str().as_bytes());
        update_field(&mut hasher, self.url.as_bytes());
        hasher.update((self.headers.len() as u64).to_le_bytes());
        for (name, value) in &self.headers {
            update_field(&mut hasher, name.as_bytes());
            update_field(&mut hasher, value.as_bytes());
        }
        match &self.body {
            Some(body) => {
                hasher.update([1u8]);
                update_field(&mut hasher, body);
            }
            None => hasher.update([0u8]),
        }
        CacheKey(hasher.finalize().into())
    }
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// A completed HTTP response as returned by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, headers: BTreeMap::new(), body: body.into() }
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body size in bytes.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_deterministic() {
        let a = HttpRequest::get("https://example.com/a").with_header("Accept", "text/html");
        let b = HttpRequest::get("https://example.com/a").with_header("Accept", "text/html");
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn cache_key_ignores_header_case_and_estimate() {
        let a = HttpRequest::get("https://example.com/a").with_header("ACCEPT", "*/*");
        let b = HttpRequest::get("https://example.com/a")
            .with_header("accept", "*/*")
            .with_estimated_bytes(4096);
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn cache_key_differs_by_identity_fields() {
        let base = HttpRequest::get("https://example.com/a");
        let other_url = HttpRequest::get("https://example.com/b");
        let other_method = HttpRequest::new(Method::Head, "https://example.com/a");
        let with_body = HttpRequest::post("https://example.com/a", b"x".to_vec());
        let empty_body = HttpRequest::get("https://example.com/a").with_body(Vec::new());

        assert_ne!(base.cache_key(), other_url.cache_key());
        assert_ne!(base.cache_key(), other_method.cache_key());
        assert_ne!(base.cache_key(), with_body.cache_key());
        assert_ne!(base.cache_key(), empty_body.cache_key());
    }

    #[test]
    fn length_prefix_prevents_field_aliasing() {
        let a = HttpRequest::get("ab").with_header("c", "d");
        let b = HttpRequest::get("a").with_header("bc", "d");
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn cache_key_display_is_hex() {
        let key = HttpRequest::get("https://example.com").cache_key();
        let text = key.to_string();
        assert_eq!(text.len(), 64);
        assert!(text.starts_with(&key.short()));
    }

    #[test]
    fn response_success_range() {
        assert!(HttpResponse::new(204, Vec::new()).is_success());
        assert!(!HttpResponse::new(404, Vec::new()).is_success());
        assert_eq!(HttpResponse::new(200, b"abc".to_vec()).len(), 3);
    }
}
