//! Station cluster search.
//!
//! Builds every connected grouping of up to a few stations in a landscape,
//! computes difficulty, handover and occupancy metrics for each, and serves
//! filtered and sorted pages of them while a background task keeps the data
//! current.
//!
//! # Architecture
//!
//! ```text
//! source ──► pipeline ──► cache ◄── refresh (single writer)
//!                           │
//!                           └──► query (many readers)
//! ```
//!
//! - [`source`]: landscape and player record providers
//! - [`pipeline`]: graph linking, cluster enumeration, metrics
//! - [`cache`]: the published snapshot
//! - [`refresh`]: fast and full refresh cycles
//! - [`query`]: search requests against the snapshot

pub mod cache;
pub mod config;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod query;
pub mod refresh;
pub mod source;

/// Version of the sts-inquiry library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
