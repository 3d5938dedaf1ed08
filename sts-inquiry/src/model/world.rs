//! The immutable landscape snapshot.

use std::collections::BTreeMap;

use super::ids::{Aid, Rid, Urid};
use super::station::{Edge, Station};

/// A group of regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperRegion {
    pub urid: Urid,
    pub name: String,
    /// Member regions in source order.
    pub rids: Vec<Rid>,
}

/// A region owning an ordered list of stations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub rid: Rid,
    /// The super region this region belongs to.
    pub urid: Urid,
    pub name: String,
    /// Stations of this region in source order.
    pub stations: Vec<Aid>,
}

/// The whole landscape as built by one pipeline run.
///
/// A `World` is never mutated after construction; the next full refresh
/// builds a new one.
#[derive(Debug, Clone, Default)]
pub struct World {
    pub(crate) super_regions: BTreeMap<Urid, SuperRegion>,
    pub(crate) regions: BTreeMap<Rid, Region>,
    pub(crate) stations: BTreeMap<Aid, Station>,
    pub(crate) edges: Vec<Edge>,
}

impl World {
    /// Look up a station.
    pub fn station(&self, aid: Aid) -> Option<&Station> {
        self.stations.get(&aid)
    }

    /// Look up a region.
    pub fn region(&self, rid: Rid) -> Option<&Region> {
        self.regions.get(&rid)
    }

    /// Look up a super region.
    pub fn super_region(&self, urid: Urid) -> Option<&SuperRegion> {
        self.super_regions.get(&urid)
    }

    /// All stations ordered by id.
    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    /// All regions ordered by id.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    /// All super regions ordered by id.
    pub fn super_regions(&self) -> impl Iterator<Item = &SuperRegion> {
        self.super_regions.values()
    }

    /// All deduplicated edges.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
