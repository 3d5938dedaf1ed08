//! Snapshot cache: the single slot holding the published world and tables.
//!
//! # State Machine
//!
//! ```text
//! Unready --[publish]--> Ready --[publish / update]--> Ready
//! ```
//!
//! A published [`Snapshot`] is immutable. Refreshes build a complete new
//! snapshot and swap it in under the cache lock, so readers observe either
//! the old or the new snapshot and never a mixture.
//!
//! # Locking
//!
//! One `parking_lot::Mutex` guards the slot. Writers hold it for the swap
//! (and, for the fast refresh, for the occupancy recompute that derives the
//! new snapshot from the current one). Readers hold it for the whole
//! filter/sort/paginate pass of a query and copy their result out before
//! returning.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::debug;

use crate::model::{Occupancy, World};
use crate::pipeline::{player_metrics, LandscapeTable, MetricsTable};

/// Readiness of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing has been published yet.
    Unready,
    /// A snapshot is available.
    Ready,
}

/// An immutable (world, tables) pair.
#[derive(Debug, Clone)]
pub struct Snapshot {
    world: Arc<World>,
    occupancy: Arc<Occupancy>,
    tables: Vec<MetricsTable>,
    landscape_updated: DateTime<Utc>,
    occupancy_updated: DateTime<Utc>,
}

impl Snapshot {
    /// Assemble a snapshot from a freshly built landscape and its occupancy.
    pub fn build(world: Arc<World>, landscape: &[Arc<LandscapeTable>], occupancy: Occupancy) -> Self {
        let tables = player_metrics(&world, landscape, &occupancy);
        let now = Utc::now();
        Self {
            world,
            occupancy: Arc::new(occupancy),
            tables,
            landscape_updated: now,
            occupancy_updated: now,
        }
    }

    /// The same landscape with occupancy-dependent fields recomputed.
    pub fn with_occupancy(&self, occupancy: Occupancy) -> Self {
        let tables = self
            .tables
            .iter()
            .map(|table| table.with_occupancy(&self.world, &occupancy))
            .collect();
        Self {
            world: Arc::clone(&self.world),
            occupancy: Arc::new(occupancy),
            tables,
            landscape_updated: self.landscape_updated,
            occupancy_updated: Utc::now(),
        }
    }

    pub fn world(&self) -> &Arc<World> {
        &self.world
    }

    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    /// All tables, index 0 holding cluster size 1.
    pub fn tables(&self) -> &[MetricsTable] {
        &self.tables
    }

    /// The table for clusters of `size` stations.
    pub fn table(&self, size: usize) -> Option<&MetricsTable> {
        size.checked_sub(1).and_then(|idx| self.tables.get(idx))
    }

    pub fn max_cluster_size(&self) -> usize {
        self.tables.len()
    }

    /// When the landscape part was built.
    pub fn landscape_updated(&self) -> DateTime<Utc> {
        self.landscape_updated
    }

    /// When the occupancy part was built.
    pub fn occupancy_updated(&self) -> DateTime<Utc> {
        self.occupancy_updated
    }
}

/// Holds the current snapshot and serializes access to it.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    slot: Mutex<Option<Arc<Snapshot>>>,
    generation: AtomicU64,
}

impl SnapshotCache {
    /// Create an unready cache.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CacheState {
        if self.slot.lock().is_some() {
            CacheState::Ready
        } else {
            CacheState::Unready
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == CacheState::Ready
    }

    /// Number of snapshots published so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Replace the current snapshot wholesale.
    pub fn publish(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        let previous = {
            let mut slot = self.slot.lock();
            let previous = slot.replace(snapshot);
            self.generation.fetch_add(1, Ordering::AcqRel);
            previous
        };
        // The old snapshot is released outside the lock.
        drop(previous);
        debug!(generation = self.generation(), "Published snapshot");
    }

    /// Run `f` against the current snapshot while holding the lock.
    ///
    /// Returns `None` if the cache is unready.
    pub fn read<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&Snapshot) -> R,
    {
        let slot = self.slot.lock();
        slot.as_deref().map(f)
    }

    /// Derive a new snapshot from the current one and publish it, holding
    /// the lock throughout.
    ///
    /// Returns `Ok(false)` without calling `f` if the cache is unready. If
    /// `f` fails, the current snapshot stays in place.
    pub fn update<E, F>(&self, f: F) -> Result<bool, E>
    where
        F: FnOnce(&Snapshot) -> Result<Snapshot, E>,
    {
        let previous = {
            let mut slot = self.slot.lock();
            let Some(current) = slot.as_deref() else {
                return Ok(false);
            };
            let next = f(current)?;
            let previous = slot.replace(Arc::new(next));
            self.generation.fetch_add(1, Ordering::AcqRel);
            previous
        };
        drop(previous);
        debug!(generation = self.generation(), "Updated snapshot");
        Ok(true)
    }

    /// A handle on the current snapshot.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.slot.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Aid, Rid, Urid};
    use crate::pipeline::run_landscape_pipeline;
    use crate::source::{LandscapeRecords, RegionRecord, StationRecord};

    fn snapshot(n_stations: u32) -> Snapshot {
        let records = LandscapeRecords {
            super_regions: Vec::new(),
            regions: vec![RegionRecord {
                rid: Rid(1),
                urid: Urid(1),
                name: "R".to_string(),
            }],
            stations: (1..=n_stations)
                .map(|aid| StationRecord {
                    aid: Aid(aid),
                    rid: Rid(1),
                    name: format!("S{}", aid),
                    description: String::new(),
                    coordinates: None,
                    difficulty: None,
                    entertainment: None,
                    comments: Vec::new(),
                })
                .collect(),
            edges: Vec::new(),
        };
        let landscape = run_landscape_pipeline(records, 2).unwrap();
        Snapshot::build(landscape.world, &landscape.tables, Occupancy::empty())
    }

    #[test]
    fn test_cache_starts_unready() {
        let cache = SnapshotCache::new();

        assert_eq!(cache.state(), CacheState::Unready);
        assert!(cache.read(|s| s.max_cluster_size()).is_none());
        assert!(cache.current().is_none());
        assert_eq!(cache.generation(), 0);
    }

    #[test]
    fn test_publish_makes_ready_and_replaces() {
        let cache = SnapshotCache::new();

        cache.publish(snapshot(2));
        assert!(cache.is_ready());
        assert_eq!(cache.read(|s| s.world().station_count()), Some(2));

        cache.publish(snapshot(3));
        assert_eq!(cache.read(|s| s.world().station_count()), Some(3));
        assert_eq!(cache.generation(), 2);
    }

    #[test]
    fn test_update_skips_unready_cache() {
        let cache = SnapshotCache::new();
        let mut called = false;

        let updated = cache
            .update(|s| -> Result<Snapshot, ()> {
                called = true;
                Ok(s.clone())
            })
            .unwrap();

        assert!(!updated);
        assert!(!called);
    }

    #[test]
    fn test_failed_update_keeps_snapshot() {
        let cache = SnapshotCache::new();
        cache.publish(snapshot(2));
        let before = cache.current().unwrap();

        let result = cache.update(|_| Err::<Snapshot, _>("boom"));

        assert_eq!(result, Err("boom"));
        assert!(Arc::ptr_eq(&before, &cache.current().unwrap()));
        assert_eq!(cache.generation(), 1);
    }

    #[test]
    fn test_with_occupancy_keeps_landscape() {
        let base = snapshot(2);
        let next = base.with_occupancy(Occupancy::empty());

        assert!(Arc::ptr_eq(base.world(), next.world()));
        assert_eq!(base.landscape_updated(), next.landscape_updated());
        assert!(Arc::ptr_eq(
            base.table(1).unwrap().landscape(),
            next.table(1).unwrap().landscape()
        ));
        assert!(base.table(0).is_none());
        assert!(base.table(3).is_none());
    }
}
