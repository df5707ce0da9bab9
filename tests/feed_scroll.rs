// tests/feed_scroll.rs
// Incremental accumulation against an in-memory row store: append-on-scroll,
// exhaustion, zero-match terminal state, and error recovery.

use std::collections::HashSet;
use std::sync::Arc;

use news_sentiment_dashboard::{FeedPhase, MemoryStore, NewsFeed, NewsRecord};

fn rec(i: u32) -> NewsRecord {
    NewsRecord {
        id: format!("n{i:03}"),
        title: Some(format!("Market update {i}")),
        tickers: vec!["SPY".to_string()],
        published_utc: Some(format!("2026-08-01T{:02}:{:02}:00Z", i / 60, i % 60)),
        created_at: Some(format!("2026-08-01T{:02}:{:02}:00Z", i / 60, i % 60)),
        ..Default::default()
    }
}

fn store_with(n: u32) -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new((0..n).map(rec).collect()))
}

#[tokio::test]
async fn pages_accumulate_until_exhaustion() {
    let store = store_with(25);
    let mut feed = NewsFeed::new(store.clone());

    feed.refresh().await.unwrap();
    assert_eq!(feed.rows().len(), 10);
    assert_eq!(feed.total(), Some(25));
    assert_eq!(feed.phase(), FeedPhase::HasMore);
    // newest first by default
    assert_eq!(feed.rows()[0].id, "n024");

    feed.load_more().await.unwrap();
    assert_eq!(feed.rows().len(), 20);

    feed.load_more().await.unwrap();
    assert_eq!(feed.rows().len(), 25);
    assert_eq!(feed.phase(), FeedPhase::Exhausted);
    assert!(!feed.has_more());

    // exhausted: further triggers issue no fetch
    let calls = store.query_calls();
    feed.load_more().await.unwrap();
    feed.load_more().await.unwrap();
    assert_eq!(store.query_calls(), calls);
}

#[tokio::test]
async fn accumulated_rows_have_no_duplicates() {
    let mut feed = NewsFeed::new(store_with(25));
    feed.refresh().await.unwrap();
    feed.load_more().await.unwrap();
    feed.load_more().await.unwrap();

    let ids: HashSet<&str> = feed.rows().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids.len(), feed.rows().len());
}

#[tokio::test]
async fn zero_matches_is_terminal_not_an_error() {
    let mut feed = NewsFeed::new(store_with(0));
    feed.refresh().await.unwrap();

    assert!(feed.rows().is_empty());
    assert_eq!(feed.total(), Some(0));
    assert_eq!(feed.phase(), FeedPhase::Exhausted);
    assert!(feed.last_error().is_none());
}

#[tokio::test]
async fn failed_page_keeps_rows_and_retry_appends_without_duplicates() {
    let store = store_with(25);
    let mut feed = NewsFeed::new(store.clone());

    feed.refresh().await.unwrap();
    assert_eq!(feed.rows().len(), 10);

    store.fail_next_queries(1);
    let err = feed.load_more().await.unwrap_err();
    assert!(err.to_string().contains("injected failure"));

    // previously loaded rows stay visible; state is retryable
    assert_eq!(feed.rows().len(), 10);
    assert_eq!(feed.phase(), FeedPhase::HasMore);
    assert!(feed.last_error().is_some());

    feed.load_more().await.unwrap();
    assert_eq!(feed.rows().len(), 20);
    assert!(feed.last_error().is_none());
    let ids: HashSet<&str> = feed.rows().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids.len(), 20);
}

#[tokio::test]
async fn filter_change_hard_resets_and_refetches() {
    let mut feed = NewsFeed::new(store_with(25));
    feed.refresh().await.unwrap();
    feed.load_more().await.unwrap();
    assert_eq!(feed.rows().len(), 20);

    feed.search("update 7").await.unwrap();
    assert_eq!(feed.rows().len(), 1);
    assert_eq!(feed.rows()[0].id, "n007");
    assert_eq!(feed.phase(), FeedPhase::Exhausted);
    assert_eq!(feed.total(), Some(1));
    assert_eq!(feed.filter().cursor(), 1);
}

#[tokio::test]
async fn ticker_filter_uses_overlap_semantics() {
    let mut rows: Vec<NewsRecord> = (0..5).map(rec).collect();
    rows[1].tickers = vec!["AAPL".to_string()];
    rows[3].tickers = vec!["AAPL".to_string(), "SPY".to_string()];
    let mut feed = NewsFeed::new(Arc::new(MemoryStore::new(rows)));

    feed.filter_tickers("aapl").await.unwrap();
    assert_eq!(feed.rows().len(), 2);
    assert_eq!(feed.total(), Some(2));
}
