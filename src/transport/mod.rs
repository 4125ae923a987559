//! Transport abstraction for the postback protocol.
//!
//! Defines the `Transport` trait the session talks through. The production
//! implementation is [`http::HttpTransport`] (reqwest); tests inject
//! canned-response fakes.

pub mod http;

use crate::error::Result;
use async_trait::async_trait;

/// An HTTP transport that returns decoded response body text.
///
/// Implementations own everything below the postback state machine:
/// browser-like headers, cookie persistence across the requests of a query,
/// timeouts, retry/backoff on 429/5xx, and character decoding. A non-success
/// status surfaces as `ScrapeError::Status`; the core assumes every `Ok`
/// body came from a status-success response.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET a URL and return the decoded body.
    async fn get(&self, url: &str) -> Result<String>;

    /// POST a form-encoded payload and return the decoded body.
    async fn post_form(&self, url: &str, fields: &[(String, String)]) -> Result<String>;
}
