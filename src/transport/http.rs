//! Async HTTP transport wrapping reqwest.
//!
//! Not a browser — just HTTP requests with conventional browser headers,
//! a cookie jar (the remote site is session-stateful), retry on 5xx,
//! exponential backoff on 429, and charset-sniffing body decoding for a
//! server that mis-declares legacy encodings.

use crate::error::{Result, ScrapeError};
use crate::transport::Transport;
use async_trait::async_trait;
use regex::Regex;
use std::time::Duration;
use tracing::{debug, warn};

/// Desktop-browser headers the registry expects. Anything less conventional
/// gets served error pages or content-negotiation surprises.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7";

/// HTTP transport for the postback session.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
    max_retries: u32,
}

impl HttpTransport {
    /// Build a transport with the given request timeout and retry budget.
    pub fn new(timeout_ms: u64, max_retries: u32) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::ACCEPT, ACCEPT.parse().unwrap());
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            ACCEPT_LANGUAGE.parse().unwrap(),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| ScrapeError::Transport(format!("client build failed: {e}")))?;

        Ok(Self {
            client,
            timeout: Duration::from_millis(timeout_ms),
            max_retries,
        })
    }

    /// Send a prepared request with retry on 5xx/connect errors and backoff
    /// on 429, then decode the body. Non-success after retries is an error.
    async fn execute(&self, url: &str, build: impl Fn() -> reqwest::RequestBuilder) -> Result<String> {
        let mut retries = 0u32;

        loop {
            let resp = build().timeout(self.timeout).send().await;

            match resp {
                Ok(r) => {
                    let status = r.status().as_u16();

                    if status >= 500 && retries < self.max_retries {
                        retries += 1;
                        let delay = Duration::from_millis(500 * 2u64.pow(retries - 1));
                        warn!("HTTP {status} from {url}, retry {retries} in {delay:?}");
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    if status == 429 && retries < self.max_retries {
                        retries += 1;
                        let retry_after = r
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .unwrap_or(2);
                        let delay = Duration::from_secs(retry_after.min(10));
                        warn!("HTTP 429 from {url}, backing off {delay:?}");
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    if status >= 400 {
                        return Err(ScrapeError::Status {
                            url: url.to_string(),
                            status,
                        });
                    }

                    let declared_charset = charset_from_content_type(
                        r.headers()
                            .get(reqwest::header::CONTENT_TYPE)
                            .and_then(|v| v.to_str().ok()),
                    );
                    let bytes = r
                        .bytes()
                        .await
                        .map_err(|e| ScrapeError::Transport(format!("body read failed: {e}")))?;

                    return Ok(decode_body(&bytes, declared_charset.as_deref()));
                }
                Err(e) => {
                    if retries < self.max_retries {
                        retries += 1;
                        let delay = Duration::from_millis(500 * 2u64.pow(retries - 1));
                        warn!("request to {url} failed ({e}), retry {retries} in {delay:?}");
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(ScrapeError::Transport(e.to_string()));
                }
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String> {
        self.execute(url, || self.client.get(url)).await
    }

    async fn post_form(&self, url: &str, fields: &[(String, String)]) -> Result<String> {
        self.execute(url, || self.client.post(url).form(fields)).await
    }
}

/// Extract a charset label from a Content-Type header value.
fn charset_from_content_type(content_type: Option<&str>) -> Option<String> {
    let ct = content_type?;
    let lower = ct.to_ascii_lowercase();
    let idx = lower.find("charset=")?;
    let rest = &ct[idx + "charset=".len()..];
    let label = rest
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches('"');
    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}

/// Decode a response body, distrusting legacy charset declarations.
///
/// The registry has been observed serving accented characters while
/// declaring no charset, or declaring ISO-8859-1 when the body says
/// otherwise. Decoding order:
/// 1. a declared charset other than ISO-8859-1 is taken at face value;
/// 2. otherwise a `<meta>` charset sniffed from the body wins;
/// 3. otherwise UTF-8 if the bytes validate, else windows-1252
///    (the superset ISO-8859-1 content is actually served as).
fn decode_body(bytes: &[u8], declared: Option<&str>) -> String {
    if let Some(label) = declared {
        if !label.eq_ignore_ascii_case("iso-8859-1") {
            if let Some(enc) = encoding_rs::Encoding::for_label(label.as_bytes()) {
                let (text, _, _) = enc.decode(bytes);
                return text.into_owned();
            }
        }
    }

    if let Some(label) = sniff_meta_charset(bytes) {
        if let Some(enc) = encoding_rs::Encoding::for_label(label.as_bytes()) {
            debug!("using sniffed charset {label}");
            let (text, _, _) = enc.decode(bytes);
            return text.into_owned();
        }
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            text.into_owned()
        }
    }
}

/// Look for `<meta charset=...>` or the http-equiv content-type form in the
/// first 1KiB of the body. ASCII-compatible prefix is enough for sniffing.
fn sniff_meta_charset(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(1024)];
    let head = String::from_utf8_lossy(head);
    let re = Regex::new(r#"(?i)<meta[^>]*charset\s*=\s*["']?([a-zA-Z0-9_\-]+)"#).ok()?;
    re.captures(&head)
        .map(|c| c.get(1).unwrap().as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charset_from_content_type() {
        assert_eq!(
            charset_from_content_type(Some("text/html; charset=utf-8")),
            Some("utf-8".to_string())
        );
        assert_eq!(
            charset_from_content_type(Some("text/html; charset=\"ISO-8859-1\"")),
            Some("ISO-8859-1".to_string())
        );
        assert_eq!(charset_from_content_type(Some("text/html")), None);
        assert_eq!(charset_from_content_type(None), None);
    }

    #[test]
    fn test_decode_utf8_body() {
        let body = "razão social".as_bytes();
        assert_eq!(decode_body(body, None), "razão social");
    }

    #[test]
    fn test_decode_windows_1252_without_declaration() {
        // "razão" in windows-1252: ã = 0xE3
        let body = b"raz\xe3o";
        assert_eq!(decode_body(body, None), "razão");
    }

    #[test]
    fn test_declared_legacy_charset_is_distrusted() {
        // Declared ISO-8859-1 but the body sniffs as UTF-8.
        let body = "<meta charset=\"utf-8\"><p>razão</p>".as_bytes();
        let decoded = decode_body(body, Some("iso-8859-1"));
        assert!(decoded.contains("razão"));
    }

    #[test]
    fn test_meta_charset_sniffing() {
        let body = b"<html><head><meta http-equiv=\"Content-Type\" \
                     content=\"text/html; charset=windows-1252\"></head>";
        assert_eq!(
            sniff_meta_charset(body),
            Some("windows-1252".to_string())
        );
        assert_eq!(sniff_meta_charset(b"<html><head></head>"), None);
    }
}
