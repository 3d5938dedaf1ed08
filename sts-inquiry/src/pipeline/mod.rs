//! The cluster-and-metrics pipeline.
//!
//! ```text
//! LandscapeRecords ──► link_landscape ──► World
//!                                           │
//!                      cluster_landscape ◄──┘
//!                              │
//!                      landscape_metrics ──► [LandscapeTable; max size]
//!                                                    │
//! PlayerRecords ──► link_players ──► Occupancy ──► player_metrics ──► [MetricsTable]
//! ```
//!
//! The upper half only runs on a full refresh. The lower half also runs on
//! every fast refresh, reusing the cached world and landscape tables.

mod cluster;
mod error;
mod link;
mod metrics;
pub mod stats;

use std::sync::Arc;

use tracing::info;

pub use cluster::{cluster_landscape, cluster_neighbors, Cluster, Clusters};
pub use error::PipelineError;
pub use link::{link_landscape, link_players};
pub use metrics::{
    landscape_metrics, player_metrics, LandscapeMetrics, LandscapeTable, MetricsRow,
    MetricsTable, OccupancyMetrics, NAME_SEPARATOR,
};

use crate::model::World;
use crate::source::LandscapeRecords;

/// Output of the graph-only part of the pipeline.
#[derive(Debug, Clone)]
pub struct Landscape {
    pub world: Arc<World>,
    /// One table per cluster size, index 0 holding size 1.
    pub tables: Vec<Arc<LandscapeTable>>,
}

/// Link, cluster and compute landscape metrics.
///
/// # Errors
///
/// - [`PipelineError::NoRegionsFound`] for an empty landscape
/// - [`PipelineError::InvalidClusterSize`] for `max_cluster_size == 0`
pub fn run_landscape_pipeline(
    records: LandscapeRecords,
    max_cluster_size: usize,
) -> Result<Landscape, PipelineError> {
    let world = link_landscape(records)?;
    let clusters = cluster_landscape(&world, max_cluster_size)?;
    let tables = landscape_metrics(&world, &clusters);

    info!(
        stations = world.station_count(),
        clusters = clusters.total(),
        "Landscape pipeline finished"
    );

    Ok(Landscape {
        world: Arc::new(world),
        tables,
    })
}
