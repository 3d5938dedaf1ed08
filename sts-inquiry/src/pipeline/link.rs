//! Graph builder: links flat records into a [`World`] and player records
//! into an [`Occupancy`].

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};

use tracing::{info, warn};

use super::PipelineError;
use crate::model::{
    Aid, Edge, Instance, Neighbor, Occupancy, Player, Region, Rid, Station, SuperRegion, World,
    INSTANCES,
};
use crate::source::{LandscapeRecords, PlayerRecord};

/// Build a world from landscape records.
///
/// Regions are created first, then stations (each appended to its region's
/// station list), then edge records are deduplicated on their unordered
/// station pair and turned into neighbor lists in both directions.
///
/// Records that would break the world's invariants are skipped with a
/// warning: stations of unknown regions, repeated station ids, self loops
/// and edges to unknown stations. When the same pair is listed more than
/// once, the resulting edge requires a handover if any listing does.
///
/// # Errors
///
/// [`PipelineError::NoRegionsFound`] if the records contain no region.
pub fn link_landscape(records: LandscapeRecords) -> Result<World, PipelineError> {
    let LandscapeRecords {
        super_regions: super_region_records,
        regions: region_records,
        stations: station_records,
        edges: edge_records,
    } = records;

    if region_records.is_empty() {
        return Err(PipelineError::NoRegionsFound);
    }

    info!(
        regions = region_records.len(),
        stations = station_records.len(),
        edges = edge_records.len(),
        "Linking landscape"
    );

    let mut super_regions: BTreeMap<_, _> = super_region_records
        .into_iter()
        .map(|r| {
            (
                r.urid,
                SuperRegion {
                    urid: r.urid,
                    name: r.name,
                    rids: Vec::new(),
                },
            )
        })
        .collect();

    let grouped = !super_regions.is_empty();
    let mut regions: BTreeMap<Rid, Region> = BTreeMap::new();
    for record in region_records {
        if regions.contains_key(&record.rid) {
            warn!(rid = %record.rid, "Skipping repeated region");
            continue;
        }
        match super_regions.get_mut(&record.urid) {
            Some(super_region) => super_region.rids.push(record.rid),
            None if grouped => {
                warn!(rid = %record.rid, urid = %record.urid, "Region references unknown super region");
            }
            None => {}
        }
        regions.insert(
            record.rid,
            Region {
                rid: record.rid,
                urid: record.urid,
                name: record.name,
                stations: Vec::new(),
            },
        );
    }

    let mut stations = BTreeMap::new();
    for record in station_records {
        let Some(region) = regions.get_mut(&record.rid) else {
            warn!(aid = %record.aid, rid = %record.rid, "Skipping station of unknown region");
            continue;
        };
        match stations.entry(record.aid) {
            Entry::Occupied(_) => {
                warn!(aid = %record.aid, "Skipping repeated station");
            }
            Entry::Vacant(slot) => {
                region.stations.push(record.aid);
                slot.insert(Station {
                    aid: record.aid,
                    rid: record.rid,
                    neighbors: Vec::new(),
                    name: record.name,
                    description: record.description,
                    coordinates: record.coordinates,
                    difficulty: record.difficulty,
                    entertainment: record.entertainment,
                    comments: record.comments,
                });
            }
        }
    }

    // Deduplicate on the canonical pair, keeping first-seen order.
    let mut edges: Vec<Edge> = Vec::new();
    let mut edge_index: HashMap<(Aid, Aid), usize> = HashMap::new();
    for record in edge_records {
        let Some(edge) = Edge::new(record.aid_1, record.aid_2, record.handover) else {
            warn!(aid = %record.aid_1, "Skipping self loop");
            continue;
        };
        let (a, b) = edge.endpoints();
        if !stations.contains_key(&a) || !stations.contains_key(&b) {
            warn!(aid_1 = %a, aid_2 = %b, "Skipping edge to unknown station");
            continue;
        }
        match edge_index.get(&(a, b)) {
            Some(&idx) => edges[idx].handover |= edge.handover,
            None => {
                edge_index.insert((a, b), edges.len());
                edges.push(edge);
            }
        }
    }

    for edge in &edges {
        let (a, b) = edge.endpoints();
        for (from, to) in [(a, b), (b, a)] {
            if let Some(station) = stations.get_mut(&from) {
                station.neighbors.push(Neighbor {
                    aid: to,
                    handover: edge.handover,
                });
            }
        }
    }

    info!(
        regions = regions.len(),
        stations = stations.len(),
        edges = edges.len(),
        "Finished linking landscape"
    );

    Ok(World {
        super_regions,
        regions,
        stations,
        edges,
    })
}

/// Build the occupancy of `world` from a player list.
///
/// Every station gets one slot per instance, filled from the lookup keyed by
/// (station id, instance); unmatched slots stay empty. Players of unknown
/// stations or out of range instances are ignored. If a slot is listed
/// twice, the later record wins.
pub fn link_players(world: &World, players: &[PlayerRecord]) -> Occupancy {
    let mut lookup: HashMap<(Aid, Instance), Player> = HashMap::with_capacity(players.len());
    for record in players {
        let Some(instance) = u8::try_from(record.instance).ok().and_then(Instance::new) else {
            warn!(aid = %record.aid, instance = record.instance, "Ignoring player of unknown instance");
            continue;
        };
        lookup.insert(
            (record.aid, instance),
            Player {
                name: record.name.clone(),
                stitz: record.stitz,
                start_time: record.start_time,
            },
        );
    }

    let mut occupancy = Occupancy::empty();
    for station in world.stations() {
        for instance in INSTANCES {
            if let Some(player) = lookup.remove(&(station.aid, instance)) {
                occupancy.set(station.aid, instance, player);
            }
        }
    }

    if !lookup.is_empty() {
        info!(
            ignored = lookup.len(),
            "Ignoring players of stations missing from the landscape"
        );
    }

    occupancy
}
