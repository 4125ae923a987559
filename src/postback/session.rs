//! Postback session: one authoritative form payload per query.
//!
//! The session owns the mutable "hidden-state + filter fields" mapping
//! across the life of a query and performs the bootstrap + submit protocol
//! through the injected transport and markup collaborators.

use crate::error::{Result, ScrapeError};
use crate::markup::MarkupExtractor;
use crate::postback::{
    page_argument, APPLY_FILTER, APPLY_FILTER_VALUE, EVENT_ARGUMENT, EVENT_TARGET, FIELD_CNPJ,
    FIELD_IE, FIELD_SITUACAO, FIELD_UF, HIDDEN_FIELDS, PAGER_TARGET, SITUACAO_ALL,
    VIEWSTATE_ENCRYPTED,
};
use crate::transport::Transport;
use crate::types::{only_digits, QueryFilters};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// A postback session against the registry's lookup form.
///
/// Not safe for concurrent queries: every postback's hidden tokens depend on
/// the immediately preceding response, so all steps are strictly sequential.
/// Use one session per query.
pub struct PostbackSession {
    transport: Arc<dyn Transport>,
    extractor: Arc<dyn MarkupExtractor>,
    form_url: String,
    /// The one mutable request payload. BTreeMap keeps the encoded form
    /// body deterministic, which matters for request assertions in tests.
    payload: BTreeMap<String, String>,
    first_submit_done: bool,
}

impl PostbackSession {
    pub fn new(
        transport: Arc<dyn Transport>,
        extractor: Arc<dyn MarkupExtractor>,
        form_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            extractor,
            form_url: form_url.into(),
            payload: BTreeMap::new(),
            first_submit_done: false,
        }
    }

    /// Seed the payload from an initial GET of the form page.
    ///
    /// Extracts the three hidden-state tokens and initializes all filter
    /// fields to their "match all" defaults with the one-shot filter
    /// trigger armed. A missing hidden field means the remote form contract
    /// was violated.
    pub async fn bootstrap(&mut self) -> Result<()> {
        let body = self.transport.get(&self.form_url).await?;

        self.payload.clear();
        self.absorb_hidden_state(&body)?;

        self.payload
            .insert(VIEWSTATE_ENCRYPTED.to_string(), String::new());
        self.payload.insert(EVENT_TARGET.to_string(), String::new());
        self.payload
            .insert(EVENT_ARGUMENT.to_string(), String::new());
        self.payload.insert(FIELD_CNPJ.to_string(), String::new());
        self.payload.insert(FIELD_IE.to_string(), String::new());
        self.payload.insert(FIELD_UF.to_string(), String::new());
        self.payload
            .insert(FIELD_SITUACAO.to_string(), SITUACAO_ALL.to_string());
        self.payload
            .insert(APPLY_FILTER.to_string(), APPLY_FILTER_VALUE.to_string());

        self.first_submit_done = false;
        debug!("session bootstrapped from {}", self.form_url);
        Ok(())
    }

    /// Overwrite the filter fields from caller-supplied filters.
    ///
    /// Identifier values are normalized to digits before entering the
    /// payload — the remote form expects digit strings. Re-arms the
    /// one-shot trigger and clears any pending pager event.
    pub fn set_filters(&mut self, filters: &QueryFilters) {
        self.payload.insert(
            FIELD_CNPJ.to_string(),
            filters.cnpj.as_deref().map(only_digits).unwrap_or_default(),
        );
        self.payload.insert(
            FIELD_IE.to_string(),
            filters.ie.as_deref().map(only_digits).unwrap_or_default(),
        );
        self.payload.insert(
            FIELD_UF.to_string(),
            filters.uf.clone().unwrap_or_default(),
        );
        self.payload.insert(
            FIELD_SITUACAO.to_string(),
            filters
                .situacao
                .clone()
                .unwrap_or_else(|| SITUACAO_ALL.to_string()),
        );
        self.payload.insert(EVENT_TARGET.to_string(), String::new());
        self.payload
            .insert(EVENT_ARGUMENT.to_string(), String::new());
        self.payload
            .insert(APPLY_FILTER.to_string(), APPLY_FILTER_VALUE.to_string());
        self.first_submit_done = false;
    }

    /// POST the current payload and return the response body.
    ///
    /// After the first successful submit of a query the one-shot filter
    /// trigger is removed: it must only appear once.
    pub async fn submit(&mut self) -> Result<String> {
        let fields: Vec<(String, String)> = self
            .payload
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let body = self.transport.post_form(&self.form_url, &fields).await?;

        if !self.first_submit_done {
            self.payload.remove(APPLY_FILTER);
            self.first_submit_done = true;
        }
        Ok(body)
    }

    /// Prepare the payload for the given grid page.
    ///
    /// Re-extracts the hidden tokens from `body` — they rotate every
    /// postback, and stale tokens invalidate the session — then sets the
    /// pager event target/argument.
    pub fn advance_to(&mut self, page: u32, body: &str) -> Result<()> {
        self.absorb_hidden_state(body)?;
        self.payload
            .insert(EVENT_TARGET.to_string(), PAGER_TARGET.to_string());
        self.payload
            .insert(EVENT_ARGUMENT.to_string(), page_argument(page));
        debug!("advancing pager to page {page}");
        Ok(())
    }

    /// Markup extractor shared with the page parser.
    pub fn extractor(&self) -> &dyn MarkupExtractor {
        self.extractor.as_ref()
    }

    /// Copy the three hidden tokens out of a response body.
    fn absorb_hidden_state(&mut self, body: &str) -> Result<()> {
        for name in HIDDEN_FIELDS {
            let value = self
                .extractor
                .input_value(body, name)
                .ok_or_else(|| ScrapeError::Protocol(format!("missing hidden field {name}")))?;
            self.payload.insert(name.to_string(), value);
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn payload_value(&self, name: &str) -> Option<&str> {
        self.payload.get(name).map(String::as_str)
    }

    #[cfg(test)]
    pub(crate) fn payload_len(&self) -> usize {
        self.payload.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::CssExtractor;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Transport fake that serves canned bodies and records POST payloads.
    struct FakeTransport {
        get_body: String,
        post_body: String,
        posts: Mutex<Vec<Vec<(String, String)>>>,
    }

    impl FakeTransport {
        fn new(get_body: &str, post_body: &str) -> Self {
            Self {
                get_body: get_body.to_string(),
                post_body: post_body.to_string(),
                posts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn get(&self, _url: &str) -> Result<String> {
            Ok(self.get_body.clone())
        }

        async fn post_form(&self, _url: &str, fields: &[(String, String)]) -> Result<String> {
            self.posts.lock().unwrap().push(fields.to_vec());
            Ok(self.post_body.clone())
        }
    }

    fn form_html(vs: &str) -> String {
        format!(
            r#"<html><body><form>
            <input type="hidden" name="__VIEWSTATE" value="{vs}" />
            <input type="hidden" name="__VIEWSTATEGENERATOR" value="gen-{vs}" />
            <input type="hidden" name="__EVENTVALIDATION" value="ev-{vs}" />
            </form></body></html>"#
        )
    }

    fn session_with(transport: Arc<FakeTransport>) -> PostbackSession {
        PostbackSession::new(transport, Arc::new(CssExtractor), "http://test.local/form.aspx")
    }

    #[tokio::test]
    async fn test_bootstrap_populates_hidden_and_default_fields() {
        let transport = Arc::new(FakeTransport::new(&form_html("vs1"), &form_html("vs2")));
        let mut session = session_with(transport);
        session.bootstrap().await.unwrap();

        assert_eq!(session.payload_value("__VIEWSTATE"), Some("vs1"));
        assert_eq!(session.payload_value("__VIEWSTATEGENERATOR"), Some("gen-vs1"));
        assert_eq!(session.payload_value("__EVENTVALIDATION"), Some("ev-vs1"));
        assert_eq!(session.payload_value("CmdSituacao"), Some("99"));
        assert_eq!(session.payload_value("CmdUF"), Some(""));
        assert_eq!(session.payload_value("txtCNPJ"), Some(""));
        assert_eq!(session.payload_value("txtie"), Some(""));
        assert_eq!(session.payload_value("AplicarFiltro"), Some("Aplicar+Filtro"));
        // 3 hidden + 3 control + 4 filter + 1 trigger
        assert_eq!(session.payload_len(), 11);
    }

    #[tokio::test]
    async fn test_bootstrap_missing_hidden_field_is_protocol_error() {
        let html = r#"<html><body><form>
            <input type="hidden" name="__VIEWSTATE" value="vs1" />
            </form></body></html>"#;
        let transport = Arc::new(FakeTransport::new(html, ""));
        let mut session = session_with(transport);

        let err = session.bootstrap().await.unwrap_err();
        match err {
            ScrapeError::Protocol(msg) => {
                assert!(msg.contains("__VIEWSTATEGENERATOR"), "got: {msg}")
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_filters_are_digit_normalized() {
        let transport = Arc::new(FakeTransport::new(&form_html("vs1"), &form_html("vs2")));
        let mut session = session_with(transport);
        session.bootstrap().await.unwrap();

        session.set_filters(&QueryFilters {
            cnpj: Some("08.408.316/6".to_string()),
            ie: Some("12.345-6".to_string()),
            uf: Some("BA".to_string()),
            situacao: None,
        });

        assert_eq!(session.payload_value("txtCNPJ"), Some("084083166"));
        assert_eq!(session.payload_value("txtie"), Some("123456"));
        assert_eq!(session.payload_value("CmdUF"), Some("BA"));
        assert_eq!(session.payload_value("CmdSituacao"), Some("99"));
    }

    #[tokio::test]
    async fn test_apply_filter_is_one_shot() {
        let transport = Arc::new(FakeTransport::new(&form_html("vs1"), &form_html("vs2")));
        let mut session = session_with(transport.clone());
        session.bootstrap().await.unwrap();

        session.submit().await.unwrap();
        assert_eq!(session.payload_value("AplicarFiltro"), None);

        session.submit().await.unwrap();

        let posts = transport.posts.lock().unwrap();
        assert!(posts[0].iter().any(|(k, _)| k == "AplicarFiltro"));
        assert!(!posts[1].iter().any(|(k, _)| k == "AplicarFiltro"));
    }

    #[tokio::test]
    async fn test_advance_to_rotates_tokens_and_sets_pager_event() {
        let transport = Arc::new(FakeTransport::new(&form_html("vs1"), &form_html("vs2")));
        let mut session = session_with(transport);
        session.bootstrap().await.unwrap();

        let body = session.submit().await.unwrap();
        session.advance_to(2, &body).unwrap();

        assert_eq!(session.payload_value("__VIEWSTATE"), Some("vs2"));
        assert_eq!(session.payload_value("__EVENTVALIDATION"), Some("ev-vs2"));
        assert_eq!(session.payload_value("__EVENTTARGET"), Some("Grid"));
        assert_eq!(session.payload_value("__EVENTARGUMENT"), Some("Page$2"));
    }

    #[tokio::test]
    async fn test_set_filters_rearms_trigger() {
        let transport = Arc::new(FakeTransport::new(&form_html("vs1"), &form_html("vs2")));
        let mut session = session_with(transport);
        session.bootstrap().await.unwrap();

        session.submit().await.unwrap();
        assert_eq!(session.payload_value("AplicarFiltro"), None);

        session.set_filters(&QueryFilters::by_ie("123"));
        assert_eq!(session.payload_value("AplicarFiltro"), Some("Aplicar+Filtro"));
        assert_eq!(session.payload_value("__EVENTTARGET"), Some(""));
    }
}
