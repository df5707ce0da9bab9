// src/controller/results.rs
// Materialized result window for one view: the row list, the store's total
// for the unpaginated filter, and the exhaustion flag.

use std::collections::HashSet;

use crate::news::NewsRecord;

/// Row accumulator. `replace` holds exactly one page (offset paging),
/// `append` grows a prefix (incremental accumulation); both update the
/// total and recompute exhaustion.
#[derive(Debug, Default)]
pub struct ResultWindow {
    rows: Vec<NewsRecord>,
    seen_ids: HashSet<String>,
    total: Option<u64>,
    exhausted: bool,
}

impl ResultWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[NewsRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// True when no further pages exist for the current filter.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Replace the window with one freshly fetched page.
    pub fn replace(&mut self, rows: Vec<NewsRecord>, total: Option<u64>, page_size: u32) {
        let returned = rows.len();
        self.seen_ids = rows.iter().map(|r| r.id.clone()).collect();
        self.rows = rows;
        self.total = total;
        self.exhausted = Self::exhaustion(returned, self.rows.len(), total, page_size);
    }

    /// Append one freshly fetched page. Idempotent against duplicate
    /// delivery: rows whose id is already present are skipped.
    pub fn append(&mut self, rows: Vec<NewsRecord>, total: Option<u64>, page_size: u32) {
        let returned = rows.len();
        for row in rows {
            if self.seen_ids.insert(row.id.clone()) {
                self.rows.push(row);
            }
        }
        self.total = total;
        self.exhausted = Self::exhaustion(returned, self.rows.len(), total, page_size);
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.seen_ids.clear();
        self.total = None;
        self.exhausted = false;
    }

    /// Exhausted when the fetched page came back short, or the accumulated
    /// count has reached the reported total.
    fn exhaustion(returned: usize, accumulated: usize, total: Option<u64>, page_size: u32) -> bool {
        if returned < page_size as usize {
            return true;
        }
        match total {
            Some(t) => accumulated as u64 >= t,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str) -> NewsRecord {
        NewsRecord {
            id: id.to_string(),
            ..Default::default()
        }
    }

    fn page(ids: &[&str]) -> Vec<NewsRecord> {
        ids.iter().map(|id| rec(id)).collect()
    }

    #[test]
    fn append_is_idempotent_by_id() {
        let mut w = ResultWindow::new();
        w.append(page(&["a", "b"]), Some(4), 2);
        w.append(page(&["a", "b"]), Some(4), 2);
        assert_eq!(w.len(), 2);
        assert!(!w.is_exhausted());

        w.append(page(&["c", "d"]), Some(4), 2);
        assert_eq!(w.len(), 4);
        assert!(w.is_exhausted());
    }

    #[test]
    fn short_page_exhausts_even_without_total() {
        let mut w = ResultWindow::new();
        w.append(page(&["a"]), None, 10);
        assert!(w.is_exhausted());
    }

    #[test]
    fn empty_page_with_zero_total_is_terminal() {
        let mut w = ResultWindow::new();
        w.append(Vec::new(), Some(0), 10);
        assert!(w.is_empty());
        assert!(w.is_exhausted());
        assert_eq!(w.total(), Some(0));
    }

    #[test]
    fn replace_swaps_the_page_and_resets_seen_ids() {
        let mut w = ResultWindow::new();
        w.replace(page(&["a", "b"]), Some(10), 2);
        assert_eq!(w.len(), 2);
        assert!(!w.is_exhausted());

        w.replace(page(&["c", "d"]), Some(10), 2);
        assert_eq!(w.rows()[0].id, "c");
        assert_eq!(w.len(), 2);

        // a page replaced away can come back
        w.replace(page(&["a", "b"]), Some(10), 2);
        assert_eq!(w.len(), 2);
    }

    #[test]
    fn clear_drops_rows_total_and_exhaustion() {
        let mut w = ResultWindow::new();
        w.append(page(&["a"]), Some(1), 10);
        assert!(w.is_exhausted());
        w.clear();
        assert!(w.is_empty());
        assert_eq!(w.total(), None);
        assert!(!w.is_exhausted());
    }

    #[test]
    fn full_final_page_exhausts_via_total() {
        let mut w = ResultWindow::new();
        w.append(page(&["a", "b"]), Some(2), 2);
        assert!(w.is_exhausted());
    }
}
