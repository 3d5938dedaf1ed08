//! Metadata for building a search form.

use std::collections::BTreeMap;

use serde::Serialize;

use super::request::SortKey;
use crate::cache::Snapshot;
use crate::model::{Rid, Urid};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionEntry {
    pub rid: Rid,
    pub name: String,
}

/// A super region and its regions, both sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuperRegionEntry {
    pub urid: Urid,
    pub name: String,
    pub regions: Vec<RegionEntry>,
}

/// What a presentation layer needs to offer the available choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    pub cluster_sizes: Vec<usize>,
    pub super_regions: Vec<SuperRegionEntry>,
    pub sort_keys: Vec<SortKey>,
}

impl Catalog {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let world = snapshot.world();

        let mut grouped: BTreeMap<Urid, Vec<RegionEntry>> = BTreeMap::new();
        for region in world.regions() {
            grouped.entry(region.urid).or_default().push(RegionEntry {
                rid: region.rid,
                name: region.name.clone(),
            });
        }

        let mut super_regions: Vec<SuperRegionEntry> = grouped
            .into_iter()
            .map(|(urid, mut regions)| {
                regions.sort_by_cached_key(|r| r.name.to_lowercase());
                SuperRegionEntry {
                    urid,
                    // Regions without a known group get an unnamed one.
                    name: world
                        .super_region(urid)
                        .map(|sr| sr.name.clone())
                        .unwrap_or_default(),
                    regions,
                }
            })
            .collect();
        super_regions.sort_by_cached_key(|sr| sr.name.to_lowercase());

        Self {
            cluster_sizes: (1..=snapshot.max_cluster_size()).collect(),
            super_regions,
            sort_keys: SortKey::ALL.to_vec(),
        }
    }
}
