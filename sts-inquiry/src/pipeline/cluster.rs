//! Cluster engine: enumerates all connected station groupings up to a
//! maximum size.
//!
//! # Algorithm
//!
//! ```text
//! size 1  : {s}            for every station s
//! size 2  : {a, b}         for every edge a - b
//! size k+1: C ∪ {n}        for every size-k cluster C and every
//!                          neighbor n of a member of C with n ∉ C
//! ```
//!
//! The same (k+1)-cluster is usually reachable from several k-clusters, so
//! each level is collected into a set keyed by member set. The work grows
//! with the average station degree raised to the growth depth, which stays
//! manageable only because the maximum size is small.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use rayon::prelude::*;
use tracing::info;

use super::PipelineError;
use crate::model::{Aid, World};

/// A connected set of stations, identified by its members.
///
/// Members are kept sorted so that equality, hashing and ordering depend
/// on the member set only, never on how the cluster was grown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cluster(Vec<Aid>);

impl Cluster {
    /// A cluster of one station.
    pub fn singleton(aid: Aid) -> Self {
        Self(vec![aid])
    }

    /// Build a cluster from any collection of station ids; duplicates collapse.
    pub fn from_members<I: IntoIterator<Item = Aid>>(members: I) -> Self {
        let set: BTreeSet<Aid> = members.into_iter().collect();
        Self(set.into_iter().collect())
    }

    /// Members in ascending id order.
    pub fn members(&self) -> &[Aid] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, aid: Aid) -> bool {
        self.0.binary_search(&aid).is_ok()
    }

    /// This cluster extended by one station.
    pub fn with(&self, aid: Aid) -> Self {
        let mut members = self.0.clone();
        if let Err(pos) = members.binary_search(&aid) {
            members.insert(pos, aid);
        }
        Self(members)
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.0.iter().map(Aid::to_string).collect();
        write!(f, "{{{}}}", ids.join(","))
    }
}

/// All clusters of a world, grouped by size.
#[derive(Debug, Clone, Default)]
pub struct Clusters {
    by_size: Vec<Vec<Cluster>>,
}

impl Clusters {
    /// Clusters of exactly `size` stations, sorted by members.
    ///
    /// Empty for sizes outside `1..=max_size()`.
    pub fn of_size(&self, size: usize) -> &[Cluster] {
        size.checked_sub(1)
            .and_then(|idx| self.by_size.get(idx))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The largest cluster size enumerated.
    pub fn max_size(&self) -> usize {
        self.by_size.len()
    }

    /// Number of clusters over all sizes.
    pub fn total(&self) -> usize {
        self.by_size.iter().map(Vec::len).sum()
    }

    /// Iterate `(size, clusters)` pairs in ascending size.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[Cluster])> {
        self.by_size
            .iter()
            .enumerate()
            .map(|(idx, clusters)| (idx + 1, clusters.as_slice()))
    }
}

/// Stations adjacent to some member of `cluster` but not in it.
pub fn cluster_neighbors(world: &World, cluster: &Cluster) -> BTreeSet<Aid> {
    cluster
        .members()
        .iter()
        .filter_map(|aid| world.station(*aid))
        .flat_map(|station| station.neighbors.iter())
        .map(|neighbor| neighbor.aid)
        .filter(|aid| !cluster.contains(*aid))
        .collect()
}

/// Enumerate all clusters of `world` with 1 to `max_size` stations.
///
/// # Errors
///
/// [`PipelineError::InvalidClusterSize`] if `max_size` is zero.
pub fn cluster_landscape(world: &World, max_size: usize) -> Result<Clusters, PipelineError> {
    if max_size == 0 {
        return Err(PipelineError::InvalidClusterSize(max_size));
    }

    info!(max_size, "Computing station clusters");

    let mut by_size: Vec<Vec<Cluster>> = Vec::with_capacity(max_size);
    by_size.push(world.stations().map(|s| Cluster::singleton(s.aid)).collect());

    if max_size >= 2 {
        let mut pairs: Vec<Cluster> = world
            .edges()
            .iter()
            .map(|edge| {
                let (a, b) = edge.endpoints();
                Cluster(vec![a, b])
            })
            .collect();
        pairs.sort();
        by_size.push(pairs);
    }

    while by_size.len() < max_size {
        let grown = match by_size.last() {
            Some(prev) => grow(world, prev),
            None => Vec::new(),
        };
        by_size.push(grown);
    }

    let clusters = Clusters { by_size };
    info!(
        total = clusters.total(),
        "Finished computing station clusters"
    );
    Ok(clusters)
}

/// Derive all (k+1)-clusters from the k-clusters.
fn grow(world: &World, prev: &[Cluster]) -> Vec<Cluster> {
    let next: HashSet<Cluster> = prev
        .par_iter()
        .flat_map_iter(|cluster| {
            cluster_neighbors(world, cluster)
                .into_iter()
                .map(move |aid| cluster.with(aid))
        })
        .collect();

    let mut next: Vec<Cluster> = next.into_iter().collect();
    next.sort();
    next
}
