//! Caller-facing client for the state-registration registry.
//!
//! Every call runs one complete query: a fresh postback session is
//! bootstrapped, the filters applied, and every remote result page consumed
//! before returning. Callers never see a single remote page in isolation.

use crate::config::ClientConfig;
use crate::error::Result;
use crate::markup::{CssExtractor, MarkupExtractor};
use crate::postback::driver::{run_query, CancelFlag, QueryOutcome};
use crate::postback::session::PostbackSession;
use crate::transport::http::HttpTransport;
use crate::transport::Transport;
use crate::types::{QueryFilters, Registration};
use std::sync::Arc;
use tracing::info;

/// Client for the registry's lookup form.
///
/// The client itself is cheap to clone and safe to share; each query gets
/// its own [`PostbackSession`], so the sequential-postback invariant holds
/// without external locking.
#[derive(Clone)]
pub struct CadastroClient {
    transport: Arc<dyn Transport>,
    extractor: Arc<dyn MarkupExtractor>,
    form_url: String,
}

impl CadastroClient {
    /// Build a client with the production HTTP transport and CSS extractor.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.timeout_ms, config.max_retries)?;
        Ok(Self {
            transport: Arc::new(transport),
            extractor: Arc::new(CssExtractor),
            form_url: config.base_url,
        })
    }

    /// Build a client from injected collaborators (testing seam).
    pub fn with_collaborators(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        extractor: Arc<dyn MarkupExtractor>,
    ) -> Self {
        Self {
            transport,
            extractor,
            form_url: config.base_url,
        }
    }

    /// Look up registrations by state registration number (IE).
    pub async fn find_by_ie(&self, ie: &str) -> Result<Vec<Registration>> {
        self.search(&QueryFilters::by_ie(ie)).await
    }

    /// Look up registrations by CNPJ.
    pub async fn find_by_cnpj(&self, cnpj: &str) -> Result<Vec<Registration>> {
        self.search(&QueryFilters::by_cnpj(cnpj)).await
    }

    /// Run a filtered query and return the complete aggregated result set.
    pub async fn search(&self, filters: &QueryFilters) -> Result<Vec<Registration>> {
        let outcome = self.search_with_cancel(filters, &CancelFlag::new()).await?;
        Ok(outcome.records)
    }

    /// Run a filtered query with a cancellation handle.
    ///
    /// When the flag is set mid-query the driver finishes the in-flight
    /// page and returns the partial aggregate with `cancelled == true`.
    pub async fn search_with_cancel(
        &self,
        filters: &QueryFilters,
        cancel: &CancelFlag,
    ) -> Result<QueryOutcome> {
        let mut session = PostbackSession::new(
            self.transport.clone(),
            self.extractor.clone(),
            self.form_url.clone(),
        );

        session.bootstrap().await?;
        session.set_filters(filters);
        info!("running registry query against {}", self.form_url);
        run_query(&mut session, cancel).await
    }
}
