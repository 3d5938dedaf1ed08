//! Query engine.
//!
//! A search runs in fixed steps against one table of the current snapshot:
//!
//! ```text
//! table[size] ─► filter (AND) ─► stable sort ─► one row per cluster ─►
//!   locate highlight ─► page slice ─► merge identical instance rows
//! ```
//!
//! Tables hold one row per (cluster, instance). After deduplication the
//! kept row is the sort winner; other instance rows of the same cluster are
//! folded into it only if every requested sort key has the same value.
//!
//! ```ignore
//! use sts_inquiry::query::{QueryEngine, SearchRequest, SortKey, SortSpec};
//!
//! let engine = QueryEngine::new(cache, 50);
//! let result = engine.search(
//!     &SearchRequest::new(3)
//!         .with_free_only(true)
//!         .with_sort(SortSpec::desc(SortKey::Difent)),
//! )?;
//! ```

mod catalog;
mod engine;
mod error;
mod request;
mod result;

pub use catalog::{Catalog, RegionEntry, SuperRegionEntry};
pub use engine::QueryEngine;
pub use error::SearchError;
pub use request::{
    RegionSelector, SearchRequest, SortDirection, SortKey, SortSpec, MAX_SORT_KEYS,
};
pub use result::{InstanceEntry, InstanceField, SearchResult, SearchRow, MERGE_SEPARATOR};
