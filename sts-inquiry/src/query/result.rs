//! Search results, copied out of the snapshot.

use crate::model::{Aid, Instance};
use crate::pipeline::{Cluster, LandscapeMetrics, OccupancyMetrics};

/// Separator between merged per-instance values.
pub const MERGE_SEPARATOR: &str = "|";

/// A per-instance column of a result row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceField {
    Instance,
    IntraOccupants,
    NghbrOccupants,
    RegionOccupants,
}

/// The occupancy of a result row in one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceEntry {
    pub instance: Instance,
    pub occupancy: OccupancyMetrics,
}

impl InstanceEntry {
    fn field(&self, field: InstanceField) -> String {
        match field {
            InstanceField::Instance => self.instance.to_string(),
            InstanceField::IntraOccupants => self.occupancy.intra_occupants.to_string(),
            InstanceField::NghbrOccupants => self.occupancy.nghbr_occupants.to_string(),
            InstanceField::RegionOccupants => match self.occupancy.region_occupants {
                Some(n) => n.to_string(),
                None => "-".to_string(),
            },
        }
    }
}

/// One cluster on the result page.
///
/// `instances` holds the row that won the sort first, followed by the rows
/// of the other instances that sorted identically and were merged into it.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRow {
    /// 0-based position in the full filtered listing.
    pub rank: usize,
    pub metrics: LandscapeMetrics,
    pub instances: Vec<InstanceEntry>,
    /// Occupancy rolled up over all instances.
    pub max_occupancy: OccupancyMetrics,
}

impl SearchRow {
    pub fn cluster(&self) -> &Cluster {
        &self.metrics.cluster
    }

    pub fn members(&self) -> &[Aid] {
        self.metrics.cluster.members()
    }

    /// The instance that won the sort.
    pub fn instance(&self) -> Option<Instance> {
        self.instances.first().map(|entry| entry.instance)
    }

    /// Whether rows of more than one instance were merged.
    pub fn is_merged(&self) -> bool {
        self.instances.len() > 1
    }

    /// The values of `field` over the merged instances, joined by
    /// [`MERGE_SEPARATOR`].
    pub fn merged_field(&self, field: InstanceField) -> String {
        self.instances
            .iter()
            .map(|entry| entry.field(field))
            .collect::<Vec<_>>()
            .join(MERGE_SEPARATOR)
    }
}

/// What a search returns.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub cluster_size: usize,
    /// The page shown; differs from the requested page when a highlighted
    /// cluster was found.
    pub page: usize,
    /// Rank of the highlighted cluster in the full listing, if found.
    pub highlight_row_index: Option<usize>,
    /// Number of distinct clusters after filtering.
    pub total_rows: usize,
    pub rows: Vec<SearchRow>,
}

impl SearchResult {
    /// Number of pages needed for `total_rows` at `rows_per_page`.
    pub fn page_count(&self, rows_per_page: usize) -> usize {
        if rows_per_page == 0 {
            return 0;
        }
        self.total_rows.div_ceil(rows_per_page)
    }
}
