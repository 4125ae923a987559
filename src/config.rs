//! Client configuration.

use crate::postback::FORM_URL;

/// Configuration surface for [`crate::client::CadastroClient`].
///
/// `base_url` exists for tests against a local mock server; production use
/// keeps the registry's fixed form URL.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Form URL to query.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Transport retry budget for 5xx/429/connect failures.
    pub max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: FORM_URL.to_string(),
            timeout_ms: 15_000,
            max_retries: 2,
        }
    }
}

impl ClientConfig {
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}
