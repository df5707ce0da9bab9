// src/controller/offset.rs
// Numbered-page strategy: each navigation replaces the window with exactly
// one page. Pages are 1-based toward the presentation layer; the filter
// cursor stays zero-based.

use std::sync::Arc;

use metrics::counter;

use crate::controller::results::ResultWindow;
use crate::controller::{FetchError, FetchedPage, QueryExecutor, TABLE_PAGE_SIZE};
use crate::filter::{FilterState, Signature, SortDir, SortKey};
use crate::news::NewsRecord;
use crate::store::RowStore;

pub struct OffsetPager {
    filter: FilterState,
    results: ResultWindow,
    executor: QueryExecutor,
    page_size: u32,
    loading: bool,
    last_error: Option<String>,
}

impl OffsetPager {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self::with_page_size(store, TABLE_PAGE_SIZE)
    }

    pub fn with_page_size(store: Arc<dyn RowStore>, page_size: u32) -> Self {
        Self {
            filter: FilterState::new(),
            results: ResultWindow::new(),
            executor: QueryExecutor::new(store),
            page_size: page_size.max(1),
            loading: false,
            last_error: None,
        }
    }

    pub fn rows(&self) -> &[NewsRecord] {
        self.results.rows()
    }

    pub fn total(&self) -> Option<u64> {
        self.results.total()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Current 1-based page number.
    pub fn page(&self) -> u32 {
        self.filter.cursor() + 1
    }

    /// Highest reachable page: `ceil(total / page_size)`, at least 1 when
    /// the total is zero or not yet known.
    pub fn last_page(&self) -> u32 {
        match self.results.total() {
            Some(t) if t > 0 => t.div_ceil(self.page_size as u64) as u32,
            _ => 1,
        }
    }

    /// Backward/first navigation is available.
    pub fn can_prev(&self) -> bool {
        !self.loading && self.page() > 1
    }

    /// Forward/last navigation is available.
    pub fn can_next(&self) -> bool {
        !self.loading && self.page() < self.last_page()
    }

    /// Replace the text query; invalidates the window and resets to page 1.
    pub fn set_query(&mut self, text: &str) {
        self.filter.set_query(text);
        self.invalidate();
    }

    /// Replace the ticker filter; invalidates the window and resets to page 1.
    pub fn set_tickers(&mut self, raw_csv: &str) {
        self.filter.set_tickers(raw_csv);
        self.invalidate();
    }

    /// Change the sort order; invalidates the window and resets to page 1.
    pub fn set_sort(&mut self, key: SortKey, dir: SortDir) {
        self.filter.set_sort(key, dir);
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.results.clear();
        self.last_error = None;
        // any pending fetch now belongs to a dead filter; allow a fresh
        // superseding request immediately
        self.loading = false;
    }

    /// Fetch the current page (mount, or after a filter change).
    pub async fn refresh(&mut self) -> Result<(), FetchError> {
        self.load().await
    }

    /// Jump to a 1-based page and fetch it. Ignored while loading.
    pub async fn go_to(&mut self, page: u32) -> Result<(), FetchError> {
        if self.loading {
            return Ok(());
        }
        self.filter.set_cursor(page.max(1) - 1);
        self.load().await
    }

    pub async fn next(&mut self) -> Result<(), FetchError> {
        if !self.can_next() {
            return Ok(());
        }
        self.go_to(self.page() + 1).await
    }

    pub async fn prev(&mut self) -> Result<(), FetchError> {
        if !self.can_prev() {
            return Ok(());
        }
        self.go_to(self.page() - 1).await
    }

    pub async fn first(&mut self) -> Result<(), FetchError> {
        self.go_to(1).await
    }

    pub async fn last(&mut self) -> Result<(), FetchError> {
        self.go_to(self.last_page()).await
    }

    async fn load(&mut self) -> Result<(), FetchError> {
        let Some(sig) = self.begin_load() else {
            return Ok(());
        };
        let outcome = self.fetch_current().await;
        self.finish_load(sig, outcome)
    }

    /// Issue half of a load; `None` when a fetch must not be issued.
    pub fn begin_load(&mut self) -> Option<Signature> {
        if self.loading {
            return None;
        }
        let sig = self.filter.signature();
        if !self.executor.begin(&sig) {
            return None;
        }
        self.loading = true;
        Some(sig)
    }

    /// Run the remote query for the current filter without touching
    /// controller state. Pair with `begin_load`/`finish_load`.
    pub async fn fetch_current(&self) -> Result<FetchedPage, FetchError> {
        self.executor.execute(&self.filter, self.page_size).await
    }

    /// Apply half of a load; stale responses (superseded request or changed
    /// filter) are discarded without touching the loaded page.
    pub fn finish_load(
        &mut self,
        sig: Signature,
        outcome: Result<FetchedPage, FetchError>,
    ) -> Result<(), FetchError> {
        let is_latest = self.executor.accept(&sig);
        let is_current = sig == self.filter.signature();
        if !(is_latest && is_current) {
            counter!("dashboard_stale_discarded_total").increment(1);
            tracing::debug!(fingerprint = %sig.fingerprint(), "discarding stale page response");
            if is_latest {
                self.loading = false;
            }
            return Ok(());
        }

        self.loading = false;
        match outcome {
            Ok(page) => {
                self.results.replace(page.rows, page.total, self.page_size);
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                // back to Idle with the previous page still visible
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }
}
