// tests/offset_paging.rs
// Numbered-page navigation: replace-on-change, last-page math, disabled
// navigation at the bounds, and error recovery.

use std::collections::HashSet;
use std::sync::Arc;

use news_sentiment_dashboard::{MemoryStore, NewsRecord, OffsetPager};

fn rec(i: u32) -> NewsRecord {
    NewsRecord {
        id: format!("n{i:03}"),
        title: Some(format!("Headline {i}")),
        published_utc: Some(format!("2026-08-01T{:02}:{:02}:00Z", i / 60, i % 60)),
        ..Default::default()
    }
}

fn store_with(n: u32) -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new((0..n).map(rec).collect()))
}

#[tokio::test]
async fn total_25_page_size_10_spans_three_pages() {
    let mut pager = OffsetPager::with_page_size(store_with(25), 10);

    pager.refresh().await.unwrap();
    assert_eq!(pager.page(), 1);
    assert_eq!(pager.rows().len(), 10);
    assert_eq!(pager.total(), Some(25));
    assert_eq!(pager.last_page(), 3);
    assert!(!pager.can_prev());
    assert!(pager.can_next());

    pager.go_to(3).await.unwrap();
    assert_eq!(pager.rows().len(), 5);
    assert!(pager.can_prev());
    assert!(!pager.can_next());
}

#[tokio::test]
async fn next_at_last_page_is_a_no_op() {
    let store = store_with(25);
    let mut pager = OffsetPager::with_page_size(store.clone(), 10);
    pager.refresh().await.unwrap();
    pager.last().await.unwrap();
    assert_eq!(pager.page(), 3);

    let calls = store.query_calls();
    pager.next().await.unwrap();
    assert_eq!(pager.page(), 3);
    assert_eq!(store.query_calls(), calls);

    pager.first().await.unwrap();
    assert_eq!(pager.page(), 1);
    let calls = store.query_calls();
    pager.prev().await.unwrap();
    assert_eq!(store.query_calls(), calls);
}

#[tokio::test]
async fn pages_are_replaced_not_merged() {
    let mut pager = OffsetPager::with_page_size(store_with(25), 10);
    pager.refresh().await.unwrap();
    let page1: HashSet<String> = pager.rows().iter().map(|r| r.id.clone()).collect();

    pager.next().await.unwrap();
    assert_eq!(pager.rows().len(), 10);
    let page2: HashSet<String> = pager.rows().iter().map(|r| r.id.clone()).collect();
    assert!(page1.is_disjoint(&page2));
}

#[tokio::test]
async fn empty_result_set_pins_last_page_to_one() {
    let mut pager = OffsetPager::with_page_size(store_with(0), 10);
    pager.refresh().await.unwrap();

    assert!(pager.rows().is_empty());
    assert_eq!(pager.total(), Some(0));
    assert_eq!(pager.last_page(), 1);
    assert!(!pager.can_prev());
    assert!(!pager.can_next());
    assert!(pager.last_error().is_none());
}

#[tokio::test]
async fn failed_navigation_keeps_previous_page_and_is_retryable() {
    let store = store_with(25);
    let mut pager = OffsetPager::with_page_size(store.clone(), 10);
    pager.refresh().await.unwrap();
    let before: Vec<String> = pager.rows().iter().map(|r| r.id.clone()).collect();

    store.fail_next_queries(1);
    assert!(pager.go_to(2).await.is_err());
    let after: Vec<String> = pager.rows().iter().map(|r| r.id.clone()).collect();
    assert_eq!(before, after);
    assert!(pager.last_error().is_some());
    assert!(!pager.is_loading());

    pager.go_to(2).await.unwrap();
    assert_eq!(pager.page(), 2);
    assert_eq!(pager.rows().len(), 10);
    assert!(pager.last_error().is_none());
}

#[tokio::test]
async fn filter_change_resets_to_first_page() {
    let mut pager = OffsetPager::with_page_size(store_with(25), 10);
    pager.refresh().await.unwrap();
    pager.go_to(2).await.unwrap();
    assert_eq!(pager.page(), 2);

    pager.set_query("Headline 3");
    assert_eq!(pager.page(), 1);
    assert!(pager.rows().is_empty());

    pager.refresh().await.unwrap();
    assert_eq!(pager.rows().len(), 1);
    assert_eq!(pager.rows()[0].id, "n003");
    assert_eq!(pager.last_page(), 1);
}
