//! Error taxonomy for the scraper.
//!
//! Two fatal classes: transport failures (network, timeout, bad status) and
//! protocol failures (the remote form no longer looks like the form we know
//! how to drive). Malformed pager text is deliberately *not* an error — the
//! parser falls back to a single-page interpretation and records a
//! diagnostic instead (see `postback::page`).

/// Errors surfaced to callers of the client.
#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    /// Network failure or timeout after transport-level retries.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status after transport-level retries.
    #[error("HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

    /// The remote form's expected structure was not found, or pagination
    /// desynchronized. Continuing would risk incomplete or duplicated data.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ScrapeError {
    /// Whether this is a transport-class failure (network or HTTP status).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { .. })
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ScrapeError>;
