//! Pagination driver: submit → parse → advance until the pager is done.
//!
//! Two-state machine (fetching / done) with the pager position threaded as
//! an explicit value between iterations. A stall guard turns a pager that
//! stops advancing into a protocol error instead of an infinite loop — the
//! remote postback contract desynchronizes when hidden tokens are
//! mishandled, and the symptom is the same page served forever.

use crate::error::{Result, ScrapeError};
use crate::postback::page::parse_results_page;
use crate::postback::session::PostbackSession;
use crate::types::{PagerPosition, Registration};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Cooperative cancellation handle, checked between postbacks.
///
/// Cancelling never aborts an in-flight request; the driver finishes the
/// current page and returns what it has.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation after the in-flight page completes.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Aggregated result of one query.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    /// All records across all fetched pages, in page order.
    pub records: Vec<Registration>,
    /// How many remote pages were fetched.
    pub pages_fetched: u32,
    /// True when the query stopped early because of cancellation; the
    /// records are the partial aggregate up to the last completed page.
    pub cancelled: bool,
    /// Non-fatal pager-parse diagnostics collected along the way.
    pub diagnostics: Vec<String>,
}

/// Drive a bootstrapped, filtered session through all result pages.
pub async fn run_query(session: &mut PostbackSession, cancel: &CancelFlag) -> Result<QueryOutcome> {
    let mut records: Vec<Registration> = Vec::new();
    let mut diagnostics: Vec<String> = Vec::new();
    let mut previous: Option<PagerPosition> = None;
    let mut pages_fetched = 0u32;
    let mut cancelled = false;

    loop {
        let body = session.submit().await?;
        let page = parse_results_page(session.extractor(), &body);
        pages_fetched += 1;

        if let Some(diag) = page.fallback {
            warn!("pager fallback on page {pages_fetched}: {diag}");
            diagnostics.push(diag);
        }
        records.extend(page.records);

        // Stall guard: the same pager position on two consecutive
        // iterations means the advance postback had no effect.
        if previous == Some(page.pager) {
            return Err(ScrapeError::Protocol("pagination not advancing".into()));
        }

        if page.pager.is_last() {
            break;
        }

        if cancel.is_cancelled() {
            info!(
                "query cancelled after page {}/{}",
                page.pager.current, page.pager.total
            );
            cancelled = true;
            break;
        }

        session.advance_to(page.pager.current + 1, &body)?;
        previous = Some(page.pager);
    }

    info!(
        "query complete: {} records over {} page(s){}",
        records.len(),
        pages_fetched,
        if cancelled { " (partial)" } else { "" }
    );

    Ok(QueryOutcome {
        records,
        pages_fetched,
        cancelled,
        diagnostics,
    })
}
