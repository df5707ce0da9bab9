// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod controller;
pub mod filter;
pub mod metrics;
pub mod news;
pub mod session;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::controller::feed::{FeedPhase, NewsFeed};
pub use crate::controller::offset::OffsetPager;
pub use crate::controller::results::ResultWindow;
pub use crate::controller::{FetchError, FEED_PAGE_SIZE, TABLE_PAGE_SIZE};
pub use crate::filter::{FilterState, SortDir, SortKey};
pub use crate::news::NewsRecord;
pub use crate::session::{Session, SessionHolder};
pub use crate::store::{MemoryStore, QueryResponse, QuerySpec, RowStore, StoreError};
