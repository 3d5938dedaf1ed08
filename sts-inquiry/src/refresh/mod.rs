//! Periodic refresh of the snapshot cache.
//!
//! Two cycles share one loop:
//!
//! - **full**: fetch landscape and players, rebuild world, clusters and all
//!   metrics, publish
//! - **fast**: fetch players, recompute occupancy metrics against the cached
//!   world, publish
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use sts_inquiry::refresh::{RefreshSchedule, RefreshScheduler, Refresher};
//!
//! let refresher = Arc::new(Refresher::new(landscape, players, Arc::clone(&cache), 5));
//! let schedule = RefreshSchedule::new(Duration::from_secs(60), Duration::from_secs(21600))?;
//! let handle = RefreshScheduler::start(refresher, schedule, &tokio::runtime::Handle::current());
//!
//! // ...
//! handle.shutdown().await;
//! ```

mod error;
mod refresher;
mod scheduler;

pub use error::{error_chain, RefreshError};
pub use refresher::{RefreshKind, RefreshOutcome, Refresher};
pub use scheduler::{RefreshSchedule, RefreshScheduler, SchedulerHandle};
