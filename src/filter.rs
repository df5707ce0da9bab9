// src/filter.rs
// User-entered filter state for the news list: free-text query, ticker set,
// sort order and pagination cursor. Mutating query/tickers/sort resets the
// cursor; nothing here issues fetches (that is the executor's job).

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Column used for ordering the news list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Source publication time (`published_utc`).
    PublishedUtc,
    /// Ingestion time (`created_at`).
    CreatedAt,
}

impl SortKey {
    pub fn column(&self) -> &'static str {
        match self {
            SortKey::PublishedUtc => "published_utc",
            SortKey::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn is_ascending(&self) -> bool {
        matches!(self, SortDir::Asc)
    }
}

/// Parse a comma-separated ticker list: trim, upper-case, drop empties,
/// keep first-seen order.
pub fn parse_tickers(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tok in raw.split(',') {
        let t = tok.trim().to_ascii_uppercase();
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
    }
    out
}

/// Identity of one remote request: the filter predicate, sort and cursor
/// in effect when the request was issued. A response is applied only when
/// its signature still matches the current filter at arrival time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub query: String,
    pub tickers: Vec<String>,
    pub sort_key: SortKey,
    pub sort_dir: SortDir,
    pub cursor: u32,
}

impl Signature {
    /// Short stable hex fingerprint, for logs and error messages.
    pub fn fingerprint(&self) -> String {
        let mut canon = String::new();
        let _ = write!(
            canon,
            "q={}|t={}|s={}.{:?}|c={}",
            self.query,
            self.tickers.join(","),
            self.sort_key.column(),
            self.sort_dir,
            self.cursor
        );
        let hash = Sha256::digest(canon.as_bytes());
        let mut out = String::with_capacity(12);
        for b in hash.iter().take(6) {
            let _ = write!(out, "{b:02x}");
        }
        out
    }
}

/// Mutable filter state owned by one view instance.
#[derive(Debug, Clone)]
pub struct FilterState {
    query: String,
    tickers: Vec<String>,
    sort_key: SortKey,
    sort_dir: SortDir,
    cursor: u32,
}

impl Default for FilterState {
    /// View-mount defaults: everything, newest first by publication time.
    fn default() -> Self {
        Self {
            query: String::new(),
            tickers: Vec::new(),
            sort_key: SortKey::PublishedUtc,
            sort_dir: SortDir::Desc,
            cursor: 0,
        }
    }
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn sort_dir(&self) -> SortDir {
        self.sort_dir
    }

    /// Zero-based page index (offset paging) or accumulation step
    /// (incremental feed).
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Replace the free-text query. Resets the cursor.
    pub fn set_query(&mut self, text: &str) {
        self.query = text.trim().to_string();
        self.reset_cursor();
    }

    /// Replace the ticker filter from raw comma-separated input.
    /// Empty tokens are dropped silently; resets the cursor.
    pub fn set_tickers(&mut self, raw_csv: &str) {
        self.tickers = parse_tickers(raw_csv);
        self.reset_cursor();
    }

    /// Change sort column/direction. Resets the cursor.
    pub fn set_sort(&mut self, key: SortKey, dir: SortDir) {
        self.sort_key = key;
        self.sort_dir = dir;
        self.reset_cursor();
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    /// Advance to the next page index (cursor-only change, no invalidation).
    pub fn advance_cursor(&mut self) {
        self.cursor += 1;
    }

    /// Jump to an explicit zero-based page index (cursor-only change).
    pub fn set_cursor(&mut self, page: u32) {
        self.cursor = page;
    }

    pub fn signature(&self) -> Signature {
        Signature {
            query: self.query.clone(),
            tickers: self.tickers.clone(),
            sort_key: self.sort_key,
            sort_dir: self.sort_dir,
            cursor: self.cursor,
        }
    }
}
