// src/store/mod.rs
// Narrow interface to the remote row store: one filtered/sorted/ranged
// query plus a by-id lookup. `PostgrestStore` is the production backend;
// `MemoryStore` implements the same semantics in-process for tests.

pub mod postgrest;

use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

use async_trait::async_trait;
use thiserror::Error;

use crate::filter::{SortDir, SortKey};
use crate::news::{parse_timestamp_utc, NewsRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),

    #[error("store error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Network(err.to_string())
    }
}

/// One remote query: filter predicates, sort, and an inclusive zero-based
/// row range whose span never exceeds the page size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    /// Case-insensitive substring over title OR description; `None` when
    /// the query text is empty.
    pub text: Option<String>,
    /// Ticker-overlap predicate; empty means "match all".
    pub tickers: Vec<String>,
    pub sort_key: SortKey,
    pub sort_dir: SortDir,
    pub range_start: u64,
    pub range_end: u64,
}

#[derive(Debug, Clone, Default)]
pub struct QueryResponse {
    pub rows: Vec<NewsRecord>,
    /// Exact count of the unpaginated filtered set, when the store reports it.
    pub total: Option<u64>,
}

/// All-or-nothing query interface; a call either returns a full page with
/// its count or fails entirely.
#[async_trait]
pub trait RowStore: Send + Sync {
    async fn query(&self, spec: &QuerySpec) -> Result<QueryResponse, StoreError>;
    async fn fetch_by_id(&self, id: &str) -> Result<Option<NewsRecord>, StoreError>;
}

/// In-process row store with the same predicate/sort/range semantics as the
/// remote one. Used by tests; supports injected failures and call counting.
pub struct MemoryStore {
    rows: Vec<NewsRecord>,
    fail_queries: AtomicU32,
    query_calls: AtomicU32,
}

impl MemoryStore {
    pub fn new(rows: Vec<NewsRecord>) -> Self {
        Self {
            rows,
            fail_queries: AtomicU32::new(0),
            query_calls: AtomicU32::new(0),
        }
    }

    /// Make the next `n` queries fail with a network error.
    pub fn fail_next_queries(&self, n: u32) {
        self.fail_queries.store(n, AtomicOrdering::SeqCst);
    }

    /// Number of `query` calls issued so far (including failed ones).
    pub fn query_calls(&self) -> u32 {
        self.query_calls.load(AtomicOrdering::SeqCst)
    }

    fn matches(record: &NewsRecord, spec: &QuerySpec) -> bool {
        if let Some(text) = &spec.text {
            let needle = text.to_lowercase();
            let title_hit = record
                .title
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(&needle));
            let desc_hit = record
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !title_hit && !desc_hit {
                return false;
            }
        }
        if !spec.tickers.is_empty() {
            let overlaps = record.tickers.iter().any(|t| spec.tickers.contains(t));
            if !overlaps {
                return false;
            }
        }
        true
    }

    fn sort_ts(record: &NewsRecord, key: SortKey) -> Option<chrono::DateTime<chrono::Utc>> {
        let raw = match key {
            SortKey::PublishedUtc => record.published_utc.as_deref(),
            SortKey::CreatedAt => record.created_at.as_deref(),
        };
        raw.and_then(parse_timestamp_utc)
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn query(&self, spec: &QuerySpec) -> Result<QueryResponse, StoreError> {
        self.query_calls.fetch_add(1, AtomicOrdering::SeqCst);
        if self.fail_queries.load(AtomicOrdering::SeqCst) > 0 {
            self.fail_queries.fetch_sub(1, AtomicOrdering::SeqCst);
            return Err(StoreError::Network("injected failure".into()));
        }

        let mut hits: Vec<&NewsRecord> =
            self.rows.iter().filter(|r| Self::matches(r, spec)).collect();
        hits.sort_by(|a, b| {
            let ord = Self::sort_ts(a, spec.sort_key)
                .cmp(&Self::sort_ts(b, spec.sort_key))
                .then_with(|| a.id.cmp(&b.id));
            if spec.sort_dir.is_ascending() {
                ord
            } else {
                ord.reverse()
            }
        });

        let total = hits.len() as u64;
        let start = spec.range_start.min(total) as usize;
        let end_excl = spec
            .range_end
            .saturating_add(1)
            .min(total) as usize;
        let rows = if start < end_excl {
            hits[start..end_excl].iter().map(|r| (*r).clone()).collect()
        } else {
            Vec::new()
        };
        Ok(QueryResponse {
            rows,
            total: Some(total),
        })
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<NewsRecord>, StoreError> {
        Ok(self.rows.iter().find(|r| r.id == id).cloned())
    }
}
