//! Flat records delivered by sources.

use std::io::Read;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SourceError;
use crate::model::{Aid, Comment, Coordinates, Rid, Urid};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuperRegionRecord {
    pub urid: Urid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub rid: Rid,
    pub urid: Urid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    pub aid: Aid,
    pub rid: Rid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub difficulty: Option<f64>,
    #[serde(default)]
    pub entertainment: Option<f64>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// A link between two stations as listed by a region map.
///
/// Links crossing region borders show up in both regions' maps, so the
/// same unordered pair may be delivered several times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub aid_1: Aid,
    pub aid_2: Aid,
    pub handover: bool,
}

/// Everything a landscape fetch yields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandscapeRecords {
    #[serde(default)]
    pub super_regions: Vec<SuperRegionRecord>,
    pub regions: Vec<RegionRecord>,
    pub stations: Vec<StationRecord>,
    pub edges: Vec<EdgeRecord>,
}

impl LandscapeRecords {
    /// Decode a landscape from its JSON representation.
    pub fn from_json<R: Read>(reader: R) -> Result<Self, SourceError> {
        Ok(serde_json::from_reader(reader)?)
    }
}

/// One line of the player list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    pub stitz: bool,
    pub start_time: DateTime<Utc>,
    pub aid: Aid,
    /// Raw 1-based instance number; out of range values are dropped when linking.
    pub instance: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landscape_from_json_with_defaults() {
        let json = r#"{
            "regions": [{"rid": 1, "urid": 10, "name": "Nord"}],
            "stations": [{"aid": 5, "rid": 1, "name": "Hamburg Hbf"}],
            "edges": []
        }"#;

        let records = LandscapeRecords::from_json(json.as_bytes()).unwrap();

        assert!(records.super_regions.is_empty());
        assert_eq!(records.regions[0].urid, Urid(10));
        assert_eq!(records.stations[0].difficulty, None);
        assert!(records.stations[0].comments.is_empty());
    }

    #[test]
    fn test_landscape_from_invalid_json() {
        let err = LandscapeRecords::from_json("{".as_bytes()).unwrap_err();
        assert!(matches!(err, SourceError::Json(_)));
    }
}
