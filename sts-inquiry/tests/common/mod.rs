//! Shared fixtures for integration tests.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};

use sts_inquiry::model::{Aid, Rid, Urid};
use sts_inquiry::source::{
    EdgeRecord, LandscapeRecords, PlayerRecord, RegionRecord, StationRecord, SuperRegionRecord,
};

/// Create a station record with the given scores.
pub fn make_station(aid: u32, rid: u32, difficulty: Option<f64>) -> StationRecord {
    StationRecord {
        aid: Aid(aid),
        rid: Rid(rid),
        name: format!("S{}", aid),
        description: String::new(),
        coordinates: None,
        difficulty,
        entertainment: None,
        comments: Vec::new(),
    }
}

pub fn make_edge(a: u32, b: u32, handover: bool) -> EdgeRecord {
    EdgeRecord {
        aid_1: Aid(a),
        aid_2: Aid(b),
        handover,
    }
}

pub fn make_player(aid: u32, instance: u8) -> PlayerRecord {
    PlayerRecord {
        name: format!("player{}", aid),
        stitz: false,
        start_time: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        aid: Aid(aid),
        instance: instance.into(),
    }
}

/// Six stations on a path 1 - 2 - 3 - 4 - 5 - 6.
///
/// - regions: Nord (1, 2, 3) and Sued (4, 5) in super region Ost,
///   Insel (6) in super region West
/// - difficulty rises with the id, station 6 has none
/// - the link 3 - 4 needs a handover
pub fn path_landscape() -> LandscapeRecords {
    LandscapeRecords {
        super_regions: vec![
            SuperRegionRecord {
                urid: Urid(1),
                name: "Ost".to_string(),
            },
            SuperRegionRecord {
                urid: Urid(2),
                name: "West".to_string(),
            },
        ],
        regions: vec![
            RegionRecord {
                rid: Rid(10),
                urid: Urid(1),
                name: "Nord".to_string(),
            },
            RegionRecord {
                rid: Rid(11),
                urid: Urid(1),
                name: "Sued".to_string(),
            },
            RegionRecord {
                rid: Rid(20),
                urid: Urid(2),
                name: "Insel".to_string(),
            },
        ],
        stations: vec![
            make_station(1, 10, Some(1.0)),
            make_station(2, 10, Some(1.5)),
            make_station(3, 10, Some(2.0)),
            make_station(4, 11, Some(2.5)),
            make_station(5, 11, Some(3.0)),
            make_station(6, 20, None),
        ],
        edges: vec![
            make_edge(1, 2, false),
            make_edge(2, 3, false),
            make_edge(3, 4, true),
            make_edge(4, 5, false),
            make_edge(5, 6, false),
        ],
    }
}
