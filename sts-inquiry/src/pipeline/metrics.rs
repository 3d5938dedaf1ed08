//! Metrics computer: derives per-cluster statistics, one table per size.
//!
//! Metrics come in two layers with different lifetimes:
//!
//! ```text
//! LandscapeTable (graph only)          MetricsTable
//! ┌────────────────────────────┐      ┌─────────────────────────────────┐
//! │ cid → LandscapeMetrics     │◄─Arc─│ landscape                       │
//! │  neighbors, edges, scores, │      │ cid → [OccupancyMetrics; 2]     │
//! │  names, regions, ...       │      │ cid → max over instances        │
//! └────────────────────────────┘      └─────────────────────────────────┘
//!    rebuilt on full refresh             rebuilt on every refresh
//! ```
//!
//! Rows of a [`MetricsTable`] are (cluster, instance) pairs laid out
//! instance-major: all clusters of instance 1, then all clusters of
//! instance 2.

use std::collections::BTreeSet;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::info;

use super::cluster::{cluster_neighbors, Cluster, Clusters};
use super::stats::{mean, min, mode};
use crate::model::{
    Aid, Edge, Instance, Occupancy, PlayingTime, Rid, Urid, World, INSTANCES, N_INSTANCES,
};

/// Separator between member names in [`LandscapeMetrics::concat_names`].
pub const NAME_SEPARATOR: &str = "+++";

/// Graph-derived metrics of one cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct LandscapeMetrics {
    /// Dense index of the cluster within its size.
    pub cid: usize,
    pub cluster: Cluster,
    /// Member names in member order.
    pub names: Vec<String>,
    /// Stations adjacent to the cluster but not in it.
    pub neighbors: BTreeSet<Aid>,
    /// Edges with both endpoints inside the cluster.
    pub intra_edges: Vec<Edge>,
    /// Edges with exactly one endpoint inside the cluster.
    pub nghbr_edges: Vec<Edge>,
    pub rids: BTreeSet<Rid>,
    pub urids: BTreeSet<Urid>,
    pub intra_handovers: usize,
    pub nghbr_handovers: usize,
    pub n_neighbors: usize,
    pub difficulty: Option<f64>,
    pub entertainment: Option<f64>,
    /// Mean of `difficulty` and `entertainment`.
    pub difent: Option<f64>,
    pub min_difficulty: Option<f64>,
    pub min_entertainment: Option<f64>,
    /// Minimum over members of each member's own difficulty/entertainment mean.
    pub min_difent: Option<f64>,
    pub mode_playing_time: Option<PlayingTime>,
    pub concat_names: String,
}

/// Occupancy-derived metrics of one cluster in one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OccupancyMetrics {
    /// No member is occupied.
    pub free: bool,
    /// Occupied members.
    pub intra_occupants: usize,
    /// Occupied neighbor stations.
    pub nghbr_occupants: usize,
    /// Over the regions the cluster touches, the largest number of occupied
    /// stations outside the cluster.
    pub region_occupants: Option<usize>,
}

impl OccupancyMetrics {
    /// Roll up per-instance metrics: `free` if free in any instance, counts
    /// at their maximum.
    pub fn max_over<'a, I>(per_instance: I) -> Self
    where
        I: IntoIterator<Item = &'a OccupancyMetrics>,
    {
        per_instance
            .into_iter()
            .fold(OccupancyMetrics::default(), |acc, m| OccupancyMetrics {
                free: acc.free || m.free,
                intra_occupants: acc.intra_occupants.max(m.intra_occupants),
                nghbr_occupants: acc.nghbr_occupants.max(m.nghbr_occupants),
                region_occupants: acc.region_occupants.max(m.region_occupants),
            })
    }
}

/// Landscape metrics of all clusters of one size, indexed by `cid`.
#[derive(Debug, Clone, Default)]
pub struct LandscapeTable {
    size: usize,
    rows: Vec<LandscapeMetrics>,
}

impl LandscapeTable {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn rows(&self) -> &[LandscapeMetrics] {
        &self.rows
    }

    pub fn get(&self, cid: usize) -> Option<&LandscapeMetrics> {
        self.rows.get(cid)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One row of a [`MetricsTable`].
#[derive(Debug, Clone, Copy)]
pub struct MetricsRow<'a> {
    pub instance: Instance,
    pub landscape: &'a LandscapeMetrics,
    pub occupancy: &'a OccupancyMetrics,
    /// Occupancy rolled up over all instances.
    pub max_occupancy: &'a OccupancyMetrics,
}

impl MetricsRow<'_> {
    pub fn cid(&self) -> usize {
        self.landscape.cid
    }
}

/// The complete table for one cluster size: landscape metrics shared with
/// previous tables plus occupancy metrics for the current player list.
#[derive(Debug, Clone)]
pub struct MetricsTable {
    landscape: Arc<LandscapeTable>,
    occupancy: Vec<[OccupancyMetrics; N_INSTANCES]>,
    max_occupancy: Vec<OccupancyMetrics>,
}

impl MetricsTable {
    /// Compute occupancy metrics for `landscape` against `occupancy`.
    pub fn new(world: &World, landscape: Arc<LandscapeTable>, occupancy: &Occupancy) -> Self {
        let per_cluster: Vec<[OccupancyMetrics; N_INSTANCES]> = landscape
            .rows
            .par_iter()
            .map(|metrics| INSTANCES.map(|inst| occupancy_metrics(world, metrics, occupancy, inst)))
            .collect();
        let max_occupancy = per_cluster
            .iter()
            .map(|instances| OccupancyMetrics::max_over(instances.iter()))
            .collect();

        Self {
            landscape,
            occupancy: per_cluster,
            max_occupancy,
        }
    }

    /// A table with the same landscape metrics and fresh occupancy metrics.
    pub fn with_occupancy(&self, world: &World, occupancy: &Occupancy) -> Self {
        Self::new(world, Arc::clone(&self.landscape), occupancy)
    }

    pub fn size(&self) -> usize {
        self.landscape.size
    }

    pub fn landscape(&self) -> &Arc<LandscapeTable> {
        &self.landscape
    }

    /// Number of distinct clusters.
    pub fn n_clusters(&self) -> usize {
        self.landscape.len()
    }

    /// Number of (cluster, instance) rows.
    pub fn n_rows(&self) -> usize {
        self.n_clusters() * N_INSTANCES
    }

    /// Row `idx` in instance-major order.
    pub fn row(&self, idx: usize) -> Option<MetricsRow<'_>> {
        let n = self.n_clusters();
        if n == 0 {
            return None;
        }
        let instance = *INSTANCES.get(idx / n)?;
        self.cluster_row(idx % n, instance)
    }

    /// The row of cluster `cid` in `instance`.
    pub fn cluster_row(&self, cid: usize, instance: Instance) -> Option<MetricsRow<'_>> {
        Some(MetricsRow {
            instance,
            landscape: self.landscape.get(cid)?,
            occupancy: &self.occupancy.get(cid)?[instance.index()],
            max_occupancy: self.max_occupancy.get(cid)?,
        })
    }

    /// All rows in instance-major order.
    pub fn rows(&self) -> impl Iterator<Item = MetricsRow<'_>> {
        (0..self.n_rows()).filter_map(move |idx| self.row(idx))
    }
}

/// Compute the landscape table of every cluster size.
pub fn landscape_metrics(world: &World, clusters: &Clusters) -> Vec<Arc<LandscapeTable>> {
    info!("Computing landscape metrics for all clusters");

    let tables: Vec<Arc<LandscapeTable>> = clusters
        .iter()
        .map(|(size, of_size)| {
            let rows = of_size
                .par_iter()
                .enumerate()
                .map(|(cid, cluster)| cluster_metrics(world, cid, cluster))
                .collect();
            Arc::new(LandscapeTable { size, rows })
        })
        .collect();

    info!(
        tables = tables.len(),
        rows = tables.iter().map(|t| t.len()).sum::<usize>(),
        "Finished computing landscape metrics"
    );
    tables
}

/// Compute the full metrics tables for `occupancy`.
pub fn player_metrics(
    world: &World,
    landscape: &[Arc<LandscapeTable>],
    occupancy: &Occupancy,
) -> Vec<MetricsTable> {
    landscape
        .iter()
        .map(|table| MetricsTable::new(world, Arc::clone(table), occupancy))
        .collect()
}

fn cluster_metrics(world: &World, cid: usize, cluster: &Cluster) -> LandscapeMetrics {
    let stations: Vec<_> = cluster
        .members()
        .iter()
        .filter_map(|aid| world.station(*aid))
        .collect();

    let neighbors = cluster_neighbors(world, cluster);

    let mut intra_edges = BTreeSet::new();
    let mut nghbr_edges = BTreeSet::new();
    for station in &stations {
        for neighbor in &station.neighbors {
            let Some(edge) = Edge::new(station.aid, neighbor.aid, neighbor.handover) else {
                continue;
            };
            if cluster.contains(neighbor.aid) {
                intra_edges.insert(edge);
            } else {
                nghbr_edges.insert(edge);
            }
        }
    }

    let rids: BTreeSet<Rid> = stations.iter().map(|s| s.rid).collect();
    let urids: BTreeSet<Urid> = rids
        .iter()
        .filter_map(|rid| world.region(*rid))
        .map(|region| region.urid)
        .collect();

    let difficulty = mean(stations.iter().map(|s| s.difficulty));
    let entertainment = mean(stations.iter().map(|s| s.entertainment));
    let station_difents: Vec<Option<f64>> = stations
        .iter()
        .map(|s| mean([s.difficulty, s.entertainment]))
        .collect();

    let mode_playing_time = mode(
        stations
            .iter()
            .flat_map(|s| s.comments.iter())
            .map(|c| c.playing_duration),
    );

    let names: Vec<String> = stations.iter().map(|s| s.name.clone()).collect();
    let concat_names = names.join(NAME_SEPARATOR);

    let intra_edges: Vec<Edge> = intra_edges.into_iter().collect();
    let nghbr_edges: Vec<Edge> = nghbr_edges.into_iter().collect();

    LandscapeMetrics {
        cid,
        cluster: cluster.clone(),
        names,
        n_neighbors: neighbors.len(),
        neighbors,
        intra_handovers: intra_edges.iter().filter(|e| e.handover).count(),
        nghbr_handovers: nghbr_edges.iter().filter(|e| e.handover).count(),
        intra_edges,
        nghbr_edges,
        rids,
        urids,
        difficulty,
        entertainment,
        difent: mean([difficulty, entertainment]),
        min_difficulty: min(stations.iter().map(|s| s.difficulty)),
        min_entertainment: min(stations.iter().map(|s| s.entertainment)),
        min_difent: min(station_difents),
        mode_playing_time,
        concat_names,
    }
}

fn occupancy_metrics(
    world: &World,
    metrics: &LandscapeMetrics,
    occupancy: &Occupancy,
    instance: Instance,
) -> OccupancyMetrics {
    let cluster = &metrics.cluster;
    let intra_occupants = occupancy.count_occupied(cluster.members(), instance);
    let nghbr_occupants = occupancy.count_occupied(&metrics.neighbors, instance);

    let region_occupants = metrics
        .rids
        .iter()
        .filter_map(|rid| world.region(*rid))
        .map(|region| {
            let outside = region.stations.iter().filter(|aid| !cluster.contains(**aid));
            occupancy.count_occupied(outside, instance)
        })
        .max();

    OccupancyMetrics {
        free: intra_occupants == 0,
        intra_occupants,
        nghbr_occupants,
        region_occupants,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Comment;
    use crate::pipeline::{cluster_landscape, link_landscape, link_players};
    use crate::source::{EdgeRecord, LandscapeRecords, PlayerRecord, RegionRecord, StationRecord};
    use chrono::{TimeZone, Utc};

    fn station(
        aid: u32,
        rid: u32,
        difficulty: Option<f64>,
        entertainment: Option<f64>,
    ) -> StationRecord {
        StationRecord {
            aid: Aid(aid),
            rid: Rid(rid),
            name: format!("S{}", aid),
            description: String::new(),
            coordinates: None,
            difficulty,
            entertainment,
            comments: Vec::new(),
        }
    }

    fn edge(a: u32, b: u32, handover: bool) -> EdgeRecord {
        EdgeRecord {
            aid_1: Aid(a),
            aid_2: Aid(b),
            handover,
        }
    }

    fn comment(playing: Option<PlayingTime>) -> Comment {
        Comment {
            text: "nice".to_string(),
            playing_duration: playing,
            year: 2020,
        }
    }

    /// A - B (no handover), B - C (handover), C - D (handover); D in region 2.
    fn records() -> LandscapeRecords {
        let mut stations = vec![
            station(1, 1, Some(1.0), Some(3.0)),
            station(2, 1, Some(3.0), None),
            station(3, 1, None, None),
            station(4, 2, Some(4.0), Some(4.0)),
        ];
        stations[0].comments = vec![
            comment(Some(PlayingTime::Over90Min)),
            comment(Some(PlayingTime::Under15Min)),
        ];
        stations[1].comments = vec![comment(Some(PlayingTime::Under15Min)), comment(None)];

        LandscapeRecords {
            super_regions: Vec::new(),
            regions: vec![
                RegionRecord {
                    rid: Rid(1),
                    urid: Urid(7),
                    name: "Eins".to_string(),
                },
                RegionRecord {
                    rid: Rid(2),
                    urid: Urid(8),
                    name: "Zwei".to_string(),
                },
            ],
            stations,
            edges: vec![
                edge(1, 2, false),
                edge(2, 3, true),
                edge(3, 4, true),
            ],
        }
    }

    fn find<'a>(table: &'a LandscapeTable, members: &[u32]) -> &'a LandscapeMetrics {
        let cluster = Cluster::from_members(members.iter().map(|a| Aid(*a)));
        table
            .rows()
            .iter()
            .find(|m| m.cluster == cluster)
            .expect("cluster present")
    }

    fn player(aid: u32, instance: u8) -> PlayerRecord {
        PlayerRecord {
            name: format!("p{}", aid),
            stitz: false,
            start_time: Utc.timestamp_opt(0, 0).unwrap(),
            aid: Aid(aid),
            instance: instance.into(),
        }
    }

    #[test]
    fn test_edges_and_handovers() {
        let world = link_landscape(records()).unwrap();
        let clusters = cluster_landscape(&world, 3).unwrap();
        let tables = landscape_metrics(&world, &clusters);

        let bc = find(&tables[1], &[2, 3]);
        assert_eq!(bc.intra_edges.len(), 1);
        assert_eq!(bc.intra_handovers, 1);
        assert_eq!(bc.nghbr_edges.len(), 2);
        assert_eq!(bc.nghbr_handovers, 1);
        assert_eq!(bc.n_neighbors, 2);
        assert_eq!(bc.neighbors.iter().copied().collect::<Vec<_>>(), vec![Aid(1), Aid(4)]);
        assert_eq!(bc.concat_names, "S2+++S3");
        assert_eq!(bc.rids.len(), 1);
        assert_eq!(bc.urids.iter().copied().collect::<Vec<_>>(), vec![Urid(7)]);

        let cd = find(&tables[1], &[3, 4]);
        assert_eq!(cd.rids.len(), 2);
        assert_eq!(cd.urids.len(), 2);
    }

    #[test]
    fn test_scores_skip_missing_values() {
        let world = link_landscape(records()).unwrap();
        let clusters = cluster_landscape(&world, 2).unwrap();
        let tables = landscape_metrics(&world, &clusters);

        let ab = find(&tables[1], &[1, 2]);
        assert_eq!(ab.difficulty, Some(2.0));
        assert_eq!(ab.entertainment, Some(3.0));
        assert_eq!(ab.difent, Some(2.5));
        assert_eq!(ab.min_difficulty, Some(1.0));
        assert_eq!(ab.min_entertainment, Some(3.0));
        // Station 1: mean(1, 3) = 2; station 2: mean(3) = 3.
        assert_eq!(ab.min_difent, Some(2.0));
    }

    #[test]
    fn test_all_scores_missing_is_undefined() {
        let world = link_landscape(records()).unwrap();
        let clusters = cluster_landscape(&world, 1).unwrap();
        let tables = landscape_metrics(&world, &clusters);

        let c = find(&tables[0], &[3]);
        assert_eq!(c.difficulty, None);
        assert_eq!(c.entertainment, None);
        assert_eq!(c.difent, None);
        assert_eq!(c.min_difent, None);
        assert_eq!(c.mode_playing_time, None);
    }

    #[test]
    fn test_mode_playing_time() {
        let world = link_landscape(records()).unwrap();
        let clusters = cluster_landscape(&world, 2).unwrap();
        let tables = landscape_metrics(&world, &clusters);

        // Tie in station 1 alone goes to the first comment.
        assert_eq!(find(&tables[0], &[1]).mode_playing_time, Some(PlayingTime::Over90Min));
        assert_eq!(
            find(&tables[1], &[1, 2]).mode_playing_time,
            Some(PlayingTime::Under15Min)
        );
    }

    #[test]
    fn test_occupancy_metrics_per_instance() {
        let world = link_landscape(records()).unwrap();
        let clusters = cluster_landscape(&world, 2).unwrap();
        let landscape = landscape_metrics(&world, &clusters);
        let occupancy = link_players(&world, &[player(1, 1), player(3, 1), player(4, 2)]);
        let tables = player_metrics(&world, &landscape, &occupancy);

        let pairs = &tables[1];
        let ab = find(pairs.landscape(), &[1, 2]).cid;

        let inst1 = pairs.cluster_row(ab, INSTANCES[0]).unwrap().occupancy;
        assert!(!inst1.free);
        assert_eq!(inst1.intra_occupants, 1);
        assert_eq!(inst1.nghbr_occupants, 1); // station 3
        assert_eq!(inst1.region_occupants, Some(1)); // station 3 outside, region 1

        let inst2 = pairs.cluster_row(ab, INSTANCES[1]).unwrap().occupancy;
        assert!(inst2.free);
        assert_eq!(inst2.nghbr_occupants, 0);
        assert_eq!(inst2.region_occupants, Some(0));

        let max = pairs.cluster_row(ab, INSTANCES[1]).unwrap().max_occupancy;
        assert!(max.free);
        assert_eq!(max.intra_occupants, 1);
        assert_eq!(max.nghbr_occupants, 1);
    }

    #[test]
    fn test_with_occupancy_shares_landscape() {
        let world = link_landscape(records()).unwrap();
        let clusters = cluster_landscape(&world, 2).unwrap();
        let landscape = landscape_metrics(&world, &clusters);
        let empty = player_metrics(&world, &landscape, &Occupancy::empty());

        let occupancy = link_players(&world, &[player(2, 2)]);
        let refreshed = empty[0].with_occupancy(&world, &occupancy);

        assert!(Arc::ptr_eq(empty[0].landscape(), refreshed.landscape()));
        assert!(empty[0].rows().all(|row| row.occupancy.free));
        assert_eq!(refreshed.rows().filter(|row| !row.occupancy.free).count(), 1);
    }

    #[test]
    fn test_rows_are_instance_major() {
        let world = link_landscape(records()).unwrap();
        let clusters = cluster_landscape(&world, 1).unwrap();
        let landscape = landscape_metrics(&world, &clusters);
        let tables = player_metrics(&world, &landscape, &Occupancy::empty());

        let table = &tables[0];
        assert_eq!(table.n_rows(), 8);
        let rows: Vec<_> = table.rows().map(|r| (r.cid(), r.instance.number())).collect();
        assert_eq!(rows[0], (0, 1));
        assert_eq!(rows[3], (3, 1));
        assert_eq!(rows[4], (0, 2));
        assert!(table.row(8).is_none());
    }
}
