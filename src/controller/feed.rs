// src/controller/feed.rs
// Incremental accumulation ("load more" / infinite scroll): pages are
// appended to a growing prefix until the filter set is exhausted. Any
// filter change hard-resets the window and starts over from page zero.

use std::sync::Arc;

use metrics::counter;

use crate::controller::results::ResultWindow;
use crate::controller::{FetchError, FetchedPage, QueryExecutor, FEED_PAGE_SIZE};
use crate::filter::{FilterState, Signature, SortDir, SortKey};
use crate::news::NewsRecord;
use crate::store::RowStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    /// Nothing fetched yet for the current filter.
    Idle,
    Loading,
    HasMore,
    Exhausted,
}

/// Infinite-scroll controller. The cursor always names the next unfetched
/// page, so a failed fetch retries the same page instead of skipping it.
pub struct NewsFeed {
    filter: FilterState,
    results: ResultWindow,
    executor: QueryExecutor,
    page_size: u32,
    phase: FeedPhase,
    last_error: Option<String>,
}

impl NewsFeed {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self::with_page_size(store, FEED_PAGE_SIZE)
    }

    pub fn with_page_size(store: Arc<dyn RowStore>, page_size: u32) -> Self {
        Self {
            filter: FilterState::new(),
            results: ResultWindow::new(),
            executor: QueryExecutor::new(store),
            page_size: page_size.max(1),
            phase: FeedPhase::Idle,
            last_error: None,
        }
    }

    pub fn rows(&self) -> &[NewsRecord] {
        self.results.rows()
    }

    pub fn total(&self) -> Option<u64> {
        self.results.total()
    }

    pub fn phase(&self) -> FeedPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == FeedPhase::Loading
    }

    pub fn has_more(&self) -> bool {
        !self.results.is_exhausted()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Replace the text query and hard-reset the window.
    pub fn set_query(&mut self, text: &str) {
        self.filter.set_query(text);
        self.hard_reset();
    }

    /// Replace the ticker filter (raw comma-separated input) and hard-reset.
    pub fn set_tickers(&mut self, raw_csv: &str) {
        self.filter.set_tickers(raw_csv);
        self.hard_reset();
    }

    /// Change the sort order and hard-reset.
    pub fn set_sort(&mut self, key: SortKey, dir: SortDir) {
        self.filter.set_sort(key, dir);
        self.hard_reset();
    }

    fn hard_reset(&mut self) {
        self.results.clear();
        self.last_error = None;
        self.phase = FeedPhase::Idle;
    }

    /// Load the next page. No-op while loading or once exhausted; the
    /// proximity trigger from the presentation layer may fire repeatedly.
    pub async fn load_more(&mut self) -> Result<(), FetchError> {
        let Some(sig) = self.begin_load() else {
            return Ok(());
        };
        let outcome = self.fetch_current().await;
        self.finish_load(sig, outcome)
    }

    /// Hard-reset and fetch the first page, as on view mount.
    pub async fn refresh(&mut self) -> Result<(), FetchError> {
        self.hard_reset();
        self.load_more().await
    }

    /// Set the query and immediately fetch the first page for it.
    pub async fn search(&mut self, query: &str) -> Result<(), FetchError> {
        self.set_query(query);
        self.load_more().await
    }

    /// Set the ticker filter and immediately fetch the first page for it.
    pub async fn filter_tickers(&mut self, raw_csv: &str) -> Result<(), FetchError> {
        self.set_tickers(raw_csv);
        self.load_more().await
    }

    /// Change the sort order and immediately fetch the first page for it.
    pub async fn sort_by(&mut self, key: SortKey, dir: SortDir) -> Result<(), FetchError> {
        self.set_sort(key, dir);
        self.load_more().await
    }

    /// Issue half of a load: record the request signature and enter
    /// `Loading`. Returns `None` when no fetch should be issued (already
    /// loading, exhausted, or an identical request is pending).
    pub fn begin_load(&mut self) -> Option<Signature> {
        match self.phase {
            FeedPhase::Loading | FeedPhase::Exhausted => return None,
            FeedPhase::Idle | FeedPhase::HasMore => {}
        }
        let sig = self.filter.signature();
        if !self.executor.begin(&sig) {
            return None;
        }
        self.phase = FeedPhase::Loading;
        Some(sig)
    }

    /// Run the remote query for the current filter without touching
    /// controller state. Pair with `begin_load`/`finish_load`.
    pub async fn fetch_current(&self) -> Result<FetchedPage, FetchError> {
        self.executor.execute(&self.filter, self.page_size).await
    }

    /// Apply half of a load. The response is applied only when `sig` still
    /// matches both the latest issued request and the current filter;
    /// anything else is discarded (including stale errors).
    pub fn finish_load(
        &mut self,
        sig: Signature,
        outcome: Result<FetchedPage, FetchError>,
    ) -> Result<(), FetchError> {
        let is_latest = self.executor.accept(&sig);
        let is_current = sig == self.filter.signature();
        if !(is_latest && is_current) {
            counter!("dashboard_stale_discarded_total").increment(1);
            tracing::debug!(fingerprint = %sig.fingerprint(), "discarding stale feed response");
            if is_latest {
                // latest request, but the filter moved on: stop loading
                self.settle_phase();
            }
            return Ok(());
        }

        match outcome {
            Ok(page) => {
                self.results.append(page.rows, page.total, self.page_size);
                self.last_error = None;
                self.filter.advance_cursor();
                self.phase = if self.results.is_exhausted() {
                    FeedPhase::Exhausted
                } else {
                    FeedPhase::HasMore
                };
                Ok(())
            }
            Err(e) => {
                // stable retryable state; previously loaded rows stay visible
                self.last_error = Some(e.to_string());
                self.settle_phase();
                Err(e)
            }
        }
    }

    fn settle_phase(&mut self) {
        self.phase = if self.results.is_exhausted() {
            FeedPhase::Exhausted
        } else if self.results.is_empty() && self.results.total().is_none() {
            FeedPhase::Idle
        } else {
            FeedPhase::HasMore
        };
    }
}
