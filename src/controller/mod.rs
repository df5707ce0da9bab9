// src/controller/mod.rs
// Query controller core shared by both pagination strategies: builds one
// remote request from the current filter, enforces the at-most-one-in-flight
// / last-request-wins discipline via request signatures, and surfaces typed
// fetch errors.

pub mod feed;
pub mod offset;
pub mod results;

use std::sync::Arc;

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use thiserror::Error;

use crate::filter::{FilterState, Signature};
use crate::news::NewsRecord;
use crate::store::{QuerySpec, RowStore, StoreError};

/// Page size of the infinite-scroll feed view.
pub const FEED_PAGE_SIZE: u32 = 10;
/// Page size of the numbered-page table view.
pub const TABLE_PAGE_SIZE: u32 = 20;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("dashboard_fetch_total", "Row store queries issued.");
        describe_counter!("dashboard_fetch_errors_total", "Row store queries that failed.");
        describe_counter!(
            "dashboard_fetch_debounced_total",
            "Fetches skipped because an identical request was already pending."
        );
        describe_counter!(
            "dashboard_stale_discarded_total",
            "Responses discarded because their signature no longer matched."
        );
        describe_counter!("dashboard_rows_loaded_total", "Rows delivered to result windows.");
    });
}

/// A remote fetch failed. Carries the request fingerprint for correlation
/// with the issue-time log line.
#[derive(Debug, Error)]
#[error("fetch {fingerprint} failed: {source}")]
pub struct FetchError {
    pub fingerprint: String,
    pub source: StoreError,
}

/// A completed page fetch, tagged with the signature it was issued under.
#[derive(Debug)]
pub struct FetchedPage {
    pub signature: Signature,
    pub rows: Vec<NewsRecord>,
    pub total: Option<u64>,
}

/// Translates filter state into a single row-store request and tracks which
/// request is currently outstanding. Supersession is decided by comparing
/// signatures at response arrival, not by a busy flag.
pub struct QueryExecutor {
    store: Arc<dyn RowStore>,
    issued: Option<Signature>,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        ensure_metrics_described();
        Self {
            store,
            issued: None,
        }
    }

    /// Gate for issuing a request. Returns `false` when an identical request
    /// is already pending (debounce). A different pending request is
    /// superseded: it stays in flight but its response will be discarded.
    pub fn begin(&mut self, sig: &Signature) -> bool {
        match &self.issued {
            Some(prev) if prev == sig => {
                counter!("dashboard_fetch_debounced_total").increment(1);
                tracing::debug!(fingerprint = %sig.fingerprint(), "identical fetch already pending");
                false
            }
            Some(prev) => {
                tracing::debug!(
                    superseded = %prev.fingerprint(),
                    fingerprint = %sig.fingerprint(),
                    "superseding pending fetch"
                );
                self.issued = Some(sig.clone());
                true
            }
            None => {
                self.issued = Some(sig.clone());
                true
            }
        }
    }

    /// Settle a response at arrival. Returns `true` iff it belongs to the
    /// most recently issued request; the in-flight marker is cleared so a
    /// retry with the same signature is possible afterwards.
    pub fn accept(&mut self, sig: &Signature) -> bool {
        if self.issued.as_ref() == Some(sig) {
            self.issued = None;
            true
        } else {
            false
        }
    }

    /// Run one remote query for the current filter. Pure with respect to
    /// controller state; the caller applies the result through its strategy.
    pub async fn execute(
        &self,
        filter: &FilterState,
        page_size: u32,
    ) -> Result<FetchedPage, FetchError> {
        let sig = filter.signature();
        let spec = build_spec(filter, page_size);
        counter!("dashboard_fetch_total").increment(1);
        tracing::debug!(
            fingerprint = %sig.fingerprint(),
            range_start = spec.range_start,
            range_end = spec.range_end,
            "issuing row store query"
        );

        let resp = self.store.query(&spec).await.map_err(|e| {
            counter!("dashboard_fetch_errors_total").increment(1);
            FetchError {
                fingerprint: sig.fingerprint(),
                source: e,
            }
        })?;

        counter!("dashboard_rows_loaded_total").increment(resp.rows.len() as u64);
        Ok(FetchedPage {
            signature: sig,
            rows: resp.rows,
            total: resp.total,
        })
    }
}

/// One request per call: predicates from the filter, half-open page window
/// expressed as the store's inclusive zero-based range.
pub fn build_spec(filter: &FilterState, page_size: u32) -> QuerySpec {
    let start = filter.cursor() as u64 * page_size as u64;
    QuerySpec {
        text: if filter.query().is_empty() {
            None
        } else {
            Some(filter.query().to_string())
        },
        tickers: filter.tickers().to_vec(),
        sort_key: filter.sort_key(),
        sort_dir: filter.sort_dir(),
        range_start: start,
        range_end: start + page_size as u64 - 1,
    }
}
