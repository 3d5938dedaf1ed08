//! Filter, sort, deduplicate, paginate and merge.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use super::catalog::Catalog;
use super::request::{RegionSelector, SearchRequest, SortSpec, MAX_SORT_KEYS};
use super::result::{InstanceEntry, SearchResult, SearchRow};
use super::SearchError;
use crate::cache::{Snapshot, SnapshotCache};
use crate::model::Instance;
use crate::pipeline::{Cluster, MetricsRow};

/// Answers search requests against the snapshot cache.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    cache: Arc<SnapshotCache>,
    rows_per_page: usize,
}

impl QueryEngine {
    /// Create an engine; a `rows_per_page` of zero is raised to one.
    pub fn new(cache: Arc<SnapshotCache>, rows_per_page: usize) -> Self {
        Self {
            cache,
            rows_per_page: rows_per_page.max(1),
        }
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    /// Run `request` against the current snapshot.
    ///
    /// The cache lock is held for the whole computation and the page is
    /// copied out before it is released.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResult, SearchError> {
        if request.sort.len() > MAX_SORT_KEYS {
            return Err(SearchError::TooManySortKeys {
                given: request.sort.len(),
                max: MAX_SORT_KEYS,
            });
        }
        if request.page == 0 {
            return Err(SearchError::InvalidPage(request.page));
        }

        let filters = Filters::compile(request);
        let highlight = request
            .highlight
            .as_ref()
            .map(|members| Cluster::from_members(members.iter().copied()));

        self.cache
            .read(|snapshot| self.search_snapshot(snapshot, request, &filters, highlight.as_ref()))
            .ok_or(SearchError::NotReady)?
    }

    /// Form metadata for the current snapshot.
    pub fn catalog(&self) -> Result<Catalog, SearchError> {
        self.cache
            .read(Catalog::from_snapshot)
            .ok_or(SearchError::NotReady)
    }

    fn search_snapshot(
        &self,
        snapshot: &Snapshot,
        request: &SearchRequest,
        filters: &Filters<'_>,
        highlight: Option<&Cluster>,
    ) -> Result<SearchResult, SearchError> {
        let size = request.cluster_size;
        let table = snapshot
            .table(size)
            .ok_or(SearchError::InvalidClusterSize {
                requested: size,
                max: snapshot.max_cluster_size(),
            })?;

        let mut rows: Vec<MetricsRow<'_>> = table.rows().filter(|row| filters.matches(row)).collect();
        sort_rows(&mut rows, &request.sort, size == 1);

        // One row per cluster, the sort winner.
        let mut seen = HashSet::new();
        let ranked: Vec<&MetricsRow<'_>> = rows.iter().filter(|row| seen.insert(row.cid())).collect();
        let total_rows = ranked.len();

        let mut page = request.page;
        let highlight_row_index = highlight.and_then(|cluster| {
            ranked
                .iter()
                .position(|row| &row.landscape.cluster == cluster)
        });
        if let Some(idx) = highlight_row_index {
            page = idx / self.rows_per_page + 1;
        }

        let start = (page - 1).saturating_mul(self.rows_per_page);
        let page_rows: Vec<(usize, &MetricsRow<'_>)> = ranked
            .iter()
            .copied()
            .enumerate()
            .skip(start)
            .take(self.rows_per_page)
            .collect();

        let result_rows = merge_instances(&rows, &page_rows, &request.sort);

        debug!(
            cluster_size = size,
            page,
            total_rows,
            returned = result_rows.len(),
            "Search finished"
        );

        Ok(SearchResult {
            cluster_size: size,
            page,
            highlight_row_index,
            total_rows,
            rows: result_rows,
        })
    }
}

/// The active filters of a request, compiled once per request.
struct Filters<'r> {
    include: Option<Regex>,
    exclude: Option<Regex>,
    regions: Option<&'r RegionSelector>,
    instance: Option<Instance>,
    free_only: bool,
}

impl<'r> Filters<'r> {
    fn compile(request: &'r SearchRequest) -> Self {
        Self {
            include: request.name_include.as_deref().and_then(name_pattern),
            exclude: request.name_exclude.as_deref().and_then(name_pattern),
            regions: Some(&request.regions).filter(|selector| !selector.is_empty()),
            instance: request.instance,
            free_only: request.free_only,
        }
    }

    /// All active filters combined by AND.
    fn matches(&self, row: &MetricsRow<'_>) -> bool {
        let names = row.landscape.concat_names.as_str();
        self.instance.map_or(true, |inst| row.instance == inst)
            && (!self.free_only || row.occupancy.free)
            && self.include.as_ref().map_or(true, |re| re.is_match(names))
            && self.exclude.as_ref().map_or(true, |re| !re.is_match(names))
            && self
                .regions
                .map_or(true, |sel| sel.matches(&row.landscape.urids, &row.landscape.rids))
    }
}

/// Compile a case-insensitive name pattern. Blank patterns are absent;
/// invalid ones match literally.
fn name_pattern(pattern: &str) -> Option<Regex> {
    if pattern.trim().is_empty() {
        return None;
    }
    let build = |p: &str| RegexBuilder::new(p).case_insensitive(true).build();
    match build(pattern) {
        Ok(re) => Some(re),
        Err(_) => match build(&regex::escape(pattern)) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(pattern, error = %e, "Ignoring unusable name pattern");
                None
            }
        },
    }
}

/// Order two values, undefined ones last whatever the direction.
fn compare_values(a: Option<f64>, b: Option<f64>, ascending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => {
            let ord = x.total_cmp(&y);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort by `keys`, then by joined names if `by_name`.
fn sort_rows(rows: &mut [MetricsRow<'_>], keys: &[SortSpec], by_name: bool) {
    rows.sort_by(|a, b| {
        keys.iter()
            .map(|spec| compare_values(spec.key.value(a), spec.key.value(b), spec.is_ascending()))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                if by_name {
                    a.landscape.concat_names.cmp(&b.landscape.concat_names)
                } else {
                    Ordering::Equal
                }
            })
    });
}

fn same_sort_values(a: &MetricsRow<'_>, b: &MetricsRow<'_>, keys: &[SortSpec]) -> bool {
    keys.iter().all(|spec| spec.key.value(a) == spec.key.value(b))
}

/// Build the page's rows, folding in the other instance rows of each
/// cluster that sorted identically to the kept row.
fn merge_instances(
    sorted: &[MetricsRow<'_>],
    page_rows: &[(usize, &MetricsRow<'_>)],
    keys: &[SortSpec],
) -> Vec<SearchRow> {
    let on_page: HashSet<usize> = page_rows.iter().map(|(_, row)| row.cid()).collect();

    // cid -> rows of that cluster in sorted order, the kept row first
    let mut by_cid: HashMap<usize, Vec<&MetricsRow<'_>>> = HashMap::new();
    for row in sorted.iter().filter(|row| on_page.contains(&row.cid())) {
        by_cid.entry(row.cid()).or_default().push(row);
    }

    page_rows
        .iter()
        .map(|(rank, kept)| {
            let instances = by_cid
                .get(&kept.cid())
                .map(|rows| {
                    rows.iter()
                        .filter(|row| same_sort_values(kept, row, keys))
                        .map(|row| InstanceEntry {
                            instance: row.instance,
                            occupancy: *row.occupancy,
                        })
                        .collect()
                })
                .unwrap_or_default();

            SearchRow {
                rank: *rank,
                metrics: kept.landscape.clone(),
                instances,
                max_occupancy: *kept.max_occupancy,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Aid, Occupancy, Rid, Urid, INSTANCES};
    use crate::pipeline::{cluster_landscape, landscape_metrics, link_landscape, player_metrics};
    use crate::query::SortKey;
    use crate::source::{LandscapeRecords, RegionRecord, StationRecord};
    use proptest::prelude::*;

    fn records(difficulties: &[Option<f64>]) -> LandscapeRecords {
        LandscapeRecords {
            super_regions: Vec::new(),
            regions: vec![RegionRecord {
                rid: Rid(1),
                urid: Urid(1),
                name: "R".to_string(),
            }],
            stations: difficulties
                .iter()
                .enumerate()
                .map(|(idx, difficulty)| StationRecord {
                    aid: Aid(idx as u32 + 1),
                    rid: Rid(1),
                    name: format!("S{}", idx + 1),
                    description: String::new(),
                    coordinates: None,
                    difficulty: *difficulty,
                    entertainment: None,
                    comments: Vec::new(),
                })
                .collect(),
            edges: Vec::new(),
        }
    }

    #[test]
    fn test_undefined_values_sort_last() {
        assert_eq!(compare_values(Some(1.0), None, true), Ordering::Less);
        assert_eq!(compare_values(Some(1.0), None, false), Ordering::Less);
        assert_eq!(compare_values(None, Some(1.0), false), Ordering::Greater);
        assert_eq!(compare_values(Some(1.0), Some(2.0), false), Ordering::Greater);
        assert_eq!(compare_values(None, None, true), Ordering::Equal);
    }

    #[test]
    fn test_name_pattern() {
        assert!(name_pattern("   ").is_none());
        assert!(name_pattern("hbf").unwrap().is_match("Berlin Hbf"));
        assert!(name_pattern("^berlin").unwrap().is_match("Berlin Hbf"));

        // Unbalanced bracket: matched literally.
        let literal = name_pattern("a(b").unwrap();
        assert!(literal.is_match("xA(By"));
        assert!(!literal.is_match("ab"));
    }

    proptest! {
        #[test]
        fn test_sort_is_stable(
            difficulties in prop::collection::vec(
                prop::option::of(prop::sample::select(vec![1.0, 2.0, 3.0])),
                1..24,
            ),
            ascending in any::<bool>(),
        ) {
            let world = link_landscape(records(&difficulties)).unwrap();
            let clusters = cluster_landscape(&world, 1).unwrap();
            let landscape = landscape_metrics(&world, &clusters);
            let tables = player_metrics(&world, &landscape, &Occupancy::empty());
            let table = &tables[0];
            let n = table.n_clusters();

            let spec = if ascending {
                SortSpec::asc(SortKey::Difficulty)
            } else {
                SortSpec::desc(SortKey::Difficulty)
            };
            let mut rows: Vec<_> = table.rows().collect();
            sort_rows(&mut rows, &[spec], false);

            let position = |row: &MetricsRow<'_>| row.instance.index() * n + row.cid();
            for pair in rows.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                prop_assert_ne!(
                    compare_values(spec.key.value(a), spec.key.value(b), ascending),
                    Ordering::Greater
                );
                if spec.key.value(a) == spec.key.value(b) {
                    prop_assert!(position(a) < position(b));
                }
            }
            prop_assert_eq!(rows.len(), n * INSTANCES.len());
        }
    }
}
