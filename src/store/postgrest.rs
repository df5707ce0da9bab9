// src/store/postgrest.rs
// PostgREST-backed row store (Supabase REST). Predicates map to
// `or=(title.ilike.*q*,description.ilike.*q*)` and `tickers=ov.{...}`,
// pagination to `Range` headers with `Prefer: count=exact`; the exact
// total comes back in the `Content-Range` header.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::news::NewsRecord;
use crate::store::{QueryResponse, QuerySpec, RowStore, StoreError};

#[derive(Clone)]
pub struct PostgrestStore {
    base: String,
    api_key: String,
    table: String,
    client: Client,
    timeout: Duration,
}

impl PostgrestStore {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            table: "news".to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_table(mut self, table: &str) -> Self {
        self.table = table.to_string();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    fn rest_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base, self.table)
    }

    /// Query-string pairs for one page request (everything except the
    /// `Range` headers, which carry the row window).
    fn query_params(spec: &QuerySpec) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        if let Some(text) = &spec.text {
            let q = sanitize_text(text);
            if !q.is_empty() {
                params.push((
                    "or".to_string(),
                    format!("(title.ilike.*{q}*,description.ilike.*{q}*)"),
                ));
            }
        }
        if !spec.tickers.is_empty() {
            params.push((
                "tickers".to_string(),
                format!("ov.{{{}}}", spec.tickers.join(",")),
            ));
        }
        let dir = if spec.sort_dir.is_ascending() {
            "asc"
        } else {
            "desc"
        };
        params.push((
            "order".to_string(),
            format!("{}.{dir}", spec.sort_key.column()),
        ));
        params
    }
}

/// Strip PostgREST reserved characters from user text before it is embedded
/// in an `ilike` pattern.
fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '"' | '\\' | '*' | '%'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Total from a `Content-Range` header: `items 0-9/57`, `0-9/57` or `*/57`.
/// `*` or garbage after the slash means the count is unknown.
fn parse_content_range(header: &str) -> Option<u64> {
    let tail = header.rsplit('/').next()?;
    tail.trim().parse::<u64>().ok()
}

#[async_trait]
impl RowStore for PostgrestStore {
    async fn query(&self, spec: &QuerySpec) -> Result<QueryResponse, StoreError> {
        let resp = self
            .client
            .get(self.rest_url())
            .timeout(self.timeout)
            .query(&Self::query_params(spec))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Range-Unit", "items")
            .header("Range", format!("{}-{}", spec.range_start, spec.range_end))
            .header("Prefer", "count=exact")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let total = resp
            .headers()
            .get("content-range")
            .and_then(|h| h.to_str().ok())
            .and_then(parse_content_range);
        let rows: Vec<NewsRecord> = resp
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(QueryResponse { rows, total })
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<NewsRecord>, StoreError> {
        let id_filter = format!("eq.{id}");
        let resp = self
            .client
            .get(self.rest_url())
            .timeout(self.timeout)
            .query(&[
                ("select", "*"),
                ("id", id_filter.as_str()),
                ("limit", "1"),
            ])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut rows: Vec<NewsRecord> = resp
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }
}
