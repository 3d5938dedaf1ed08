//! The blocking work of one refresh tick.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::RefreshError;
use crate::cache::{Snapshot, SnapshotCache};
use crate::model::Occupancy;
use crate::pipeline::{link_players, run_landscape_pipeline};
use crate::source::{LandscapeSource, PlayerRecord, PlayerSource, SourceError};

/// Which cycle a tick belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
    /// Landscape, clusters and all metrics.
    Full,
    /// Occupancy-dependent metrics only.
    Fast,
}

impl fmt::Display for RefreshKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshKind::Full => write!(f, "full"),
            RefreshKind::Fast => write!(f, "fast"),
        }
    }
}

/// What a successful tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Published,
    /// Fast tick against an unready cache.
    Skipped,
}

/// Runs refreshes against a cache.
///
/// All methods block: they fetch from the sources and run the CPU-bound
/// pipeline on the calling thread.
pub struct Refresher<L, P> {
    landscape_source: L,
    player_source: P,
    cache: Arc<SnapshotCache>,
    max_cluster_size: usize,
}

impl<L, P> Refresher<L, P>
where
    L: LandscapeSource,
    P: PlayerSource,
{
    pub fn new(
        landscape_source: L,
        player_source: P,
        cache: Arc<SnapshotCache>,
        max_cluster_size: usize,
    ) -> Self {
        Self {
            landscape_source,
            player_source,
            cache,
            max_cluster_size,
        }
    }

    pub fn cache(&self) -> &Arc<SnapshotCache> {
        &self.cache
    }

    /// Run a refresh of the given kind.
    pub fn refresh(&self, kind: RefreshKind) -> Result<RefreshOutcome, RefreshError> {
        match kind {
            RefreshKind::Full => self.full_refresh(),
            RefreshKind::Fast => self.fast_refresh(),
        }
    }

    /// Rebuild everything from a freshly fetched landscape and publish it.
    ///
    /// If the landscape fetch or the pipeline fails, nothing is published.
    /// If only the player list fails, the new landscape is published with
    /// empty occupancy and the failure is still reported.
    pub fn full_refresh(&self) -> Result<RefreshOutcome, RefreshError> {
        let records = self
            .landscape_source
            .fetch_landscape()
            .map_err(RefreshError::Landscape)?;
        info!(
            regions = records.regions.len(),
            stations = records.stations.len(),
            edges = records.edges.len(),
            "Fetched landscape"
        );

        let landscape = run_landscape_pipeline(records, self.max_cluster_size)?;

        match self.fetch_players() {
            Ok(players) => {
                let occupancy = link_players(&landscape.world, &players);
                self.cache
                    .publish(Snapshot::build(landscape.world, &landscape.tables, occupancy));
                Ok(RefreshOutcome::Published)
            }
            Err(e) => {
                warn!(error = %e, "Player list unavailable, publishing landscape without occupancy");
                self.cache.publish(Snapshot::build(
                    landscape.world,
                    &landscape.tables,
                    Occupancy::empty(),
                ));
                Err(RefreshError::PlayersUnavailableAfterPublish(e))
            }
        }
    }

    /// Recompute occupancy for the cached world and publish it.
    ///
    /// Skipped while the cache is unready. The player list is fetched before
    /// the cache lock is taken; only the recompute runs under it.
    pub fn fast_refresh(&self) -> Result<RefreshOutcome, RefreshError> {
        if !self.cache.is_ready() {
            debug!("Cache not ready, skipping occupancy refresh");
            return Ok(RefreshOutcome::Skipped);
        }

        let players = self.fetch_players().map_err(RefreshError::Players)?;

        let updated = self.cache.update(|current| -> Result<Snapshot, RefreshError> {
            let occupancy = link_players(current.world(), &players);
            Ok(current.with_occupancy(occupancy))
        })?;

        if updated {
            Ok(RefreshOutcome::Published)
        } else {
            Ok(RefreshOutcome::Skipped)
        }
    }

    /// Fetch players, re-authenticating after an authentication failure so
    /// that the next attempt can succeed.
    fn fetch_players(&self) -> Result<Vec<PlayerRecord>, SourceError> {
        match self.player_source.fetch_players() {
            Ok(players) => {
                info!(players = players.len(), "Fetched player list");
                Ok(players)
            }
            Err(e) if e.is_authentication() => {
                warn!(error = %e, "Player source requires login, re-authenticating");
                if let Err(auth_error) = self.player_source.reauthenticate() {
                    warn!(error = %auth_error, "Re-authentication failed");
                }
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}

impl<L, P> fmt::Debug for Refresher<L, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refresher")
            .field("max_cluster_size", &self.max_cluster_size)
            .finish_non_exhaustive()
    }
}
