//! Search request types.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{Aid, Instance, Rid, Urid};
use crate::pipeline::MetricsRow;

/// Maximum number of sort levels in one request.
pub const MAX_SORT_KEYS: usize = 4;

/// A column results can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    IntraHandovers,
    NghbrHandovers,
    NNeighbors,
    Difficulty,
    Entertainment,
    Difent,
    MinDifficulty,
    MinEntertainment,
    MinDifent,
    ModePlayingTime,
    IntraOccupants,
    NghbrOccupants,
    RegionOccupants,
}

impl SortKey {
    /// All sort keys in presentation order.
    pub const ALL: [SortKey; 13] = [
        SortKey::IntraHandovers,
        SortKey::NghbrHandovers,
        SortKey::NNeighbors,
        SortKey::Difficulty,
        SortKey::Entertainment,
        SortKey::Difent,
        SortKey::MinDifficulty,
        SortKey::MinEntertainment,
        SortKey::MinDifent,
        SortKey::ModePlayingTime,
        SortKey::IntraOccupants,
        SortKey::NghbrOccupants,
        SortKey::RegionOccupants,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SortKey::IntraHandovers => "intra_handovers",
            SortKey::NghbrHandovers => "nghbr_handovers",
            SortKey::NNeighbors => "n_neighbors",
            SortKey::Difficulty => "difficulty",
            SortKey::Entertainment => "entertainment",
            SortKey::Difent => "difent",
            SortKey::MinDifficulty => "min_difficulty",
            SortKey::MinEntertainment => "min_entertainment",
            SortKey::MinDifent => "min_difent",
            SortKey::ModePlayingTime => "mode_playing_time",
            SortKey::IntraOccupants => "intra_occupants",
            SortKey::NghbrOccupants => "nghbr_occupants",
            SortKey::RegionOccupants => "region_occupants",
        }
    }

    /// The row's value for this key. `None` sorts last.
    ///
    /// The playing time sorts by its position on the ascending scale.
    pub fn value(self, row: &MetricsRow<'_>) -> Option<f64> {
        let l = row.landscape;
        let o = row.occupancy;
        match self {
            SortKey::IntraHandovers => Some(l.intra_handovers as f64),
            SortKey::NghbrHandovers => Some(l.nghbr_handovers as f64),
            SortKey::NNeighbors => Some(l.n_neighbors as f64),
            SortKey::Difficulty => l.difficulty,
            SortKey::Entertainment => l.entertainment,
            SortKey::Difent => l.difent,
            SortKey::MinDifficulty => l.min_difficulty,
            SortKey::MinEntertainment => l.min_entertainment,
            SortKey::MinDifent => l.min_difent,
            SortKey::ModePlayingTime => l.mode_playing_time.map(|p| p.ordinal() as f64),
            SortKey::IntraOccupants => Some(o.intra_occupants as f64),
            SortKey::NghbrOccupants => Some(o.nghbr_occupants as f64),
            SortKey::RegionOccupants => o.region_occupants.map(|n| n as f64),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|key| key.name() == s)
            .ok_or_else(|| format!("unknown sort key '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn suffix(self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

/// One sort level, written `"<key>-asc"` or `"<key>-desc"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Descending,
        }
    }

    pub fn is_ascending(&self) -> bool {
        self.direction == SortDirection::Ascending
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.key, self.direction.suffix())
    }
}

impl FromStr for SortSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, direction) = s
            .rsplit_once('-')
            .ok_or_else(|| format!("invalid sort '{}', expected <key>-asc or <key>-desc", s))?;
        let direction = match direction {
            "asc" => SortDirection::Ascending,
            "desc" => SortDirection::Descending,
            other => return Err(format!("invalid sort direction '{}'", other)),
        };
        Ok(Self {
            key: key.parse()?,
            direction,
        })
    }
}

impl TryFrom<String> for SortSpec {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortSpec> for String {
    fn from(spec: SortSpec) -> Self {
        spec.to_string()
    }
}

/// Region filter: a row matches if it touches any selected super region
/// or any selected region. Empty means all regions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionSelector {
    pub urids: BTreeSet<Urid>,
    pub rids: BTreeSet<Rid>,
}

impl RegionSelector {
    pub fn is_empty(&self) -> bool {
        self.urids.is_empty() && self.rids.is_empty()
    }

    pub fn matches(&self, urids: &BTreeSet<Urid>, rids: &BTreeSet<Rid>) -> bool {
        (!self.urids.is_disjoint(urids)) || (!self.rids.is_disjoint(rids))
    }
}

/// A single query against the current snapshot.
///
/// Every filter is optional; absent filters match everything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    pub cluster_size: usize,
    /// Case-insensitive pattern the joined member names must match.
    pub name_include: Option<String>,
    /// Case-insensitive pattern the joined member names must not match.
    pub name_exclude: Option<String>,
    pub regions: RegionSelector,
    pub instance: Option<Instance>,
    /// Keep only rows whose instance has no occupied member.
    pub free_only: bool,
    pub sort: Vec<SortSpec>,
    /// 1-based page number.
    pub page: usize,
    /// Members of a cluster whose page should be shown.
    pub highlight: Option<Vec<Aid>>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            cluster_size: 1,
            name_include: None,
            name_exclude: None,
            regions: RegionSelector::default(),
            instance: None,
            free_only: false,
            sort: Vec::new(),
            page: 1,
            highlight: None,
        }
    }
}

impl SearchRequest {
    /// First page of clusters of `cluster_size`, unfiltered and unsorted.
    pub fn new(cluster_size: usize) -> Self {
        Self {
            cluster_size,
            ..Self::default()
        }
    }

    pub fn with_name_include(mut self, pattern: impl Into<String>) -> Self {
        self.name_include = Some(pattern.into());
        self
    }

    pub fn with_name_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.name_exclude = Some(pattern.into());
        self
    }

    pub fn with_regions(mut self, regions: RegionSelector) -> Self {
        self.regions = regions;
        self
    }

    pub fn with_instance(mut self, instance: Instance) -> Self {
        self.instance = Some(instance);
        self
    }

    pub fn with_free_only(mut self, free_only: bool) -> Self {
        self.free_only = free_only;
        self
    }

    /// Append a sort level.
    pub fn with_sort(mut self, spec: SortSpec) -> Self {
        self.sort.push(spec);
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn with_highlight<I: IntoIterator<Item = Aid>>(mut self, members: I) -> Self {
        self.highlight = Some(members.into_iter().collect());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_spec_parse_and_print() {
        let spec: SortSpec = "min_difent-desc".parse().unwrap();
        assert_eq!(spec, SortSpec::desc(SortKey::MinDifent));
        assert_eq!(spec.to_string(), "min_difent-desc");

        assert_eq!(
            "n_neighbors-asc".parse::<SortSpec>().unwrap(),
            SortSpec::asc(SortKey::NNeighbors)
        );
        assert!("difficulty".parse::<SortSpec>().is_err());
        assert!("difficulty-up".parse::<SortSpec>().is_err());
        assert!("name-asc".parse::<SortSpec>().is_err());
    }

    #[test]
    fn test_every_key_name_round_trips() {
        for key in SortKey::ALL {
            assert_eq!(key.name().parse::<SortKey>(), Ok(key));
        }
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let request: SearchRequest = serde_json::from_str(
            r#"{"cluster_size": 3, "sort": ["difficulty-asc", "nghbr_occupants-desc"], "instance": 2}"#,
        )
        .unwrap();

        assert_eq!(request.cluster_size, 3);
        assert_eq!(request.page, 1);
        assert_eq!(request.instance, Instance::new(2));
        assert_eq!(
            request.sort,
            vec![
                SortSpec::asc(SortKey::Difficulty),
                SortSpec::desc(SortKey::NghbrOccupants)
            ]
        );
        assert!(request.regions.is_empty());

        assert!(serde_json::from_str::<SearchRequest>(r#"{"instance": 3}"#).is_err());
    }

    #[test]
    fn test_region_selector_is_either_half() {
        let selector = RegionSelector {
            urids: [Urid(1)].into(),
            rids: [Rid(5)].into(),
        };

        assert!(selector.matches(&[Urid(1)].into(), &[Rid(9)].into()));
        assert!(selector.matches(&[Urid(2)].into(), &[Rid(5)].into()));
        assert!(!selector.matches(&[Urid(2)].into(), &[Rid(9)].into()));
        assert!(RegionSelector::default().is_empty());
    }
}
