//! Landscape and player sources.
//!
//! The pipeline consumes already structured records. How those records are
//! obtained (scraping, JSON dumps, fixtures) is the business of a source
//! implementation:
//!
//! - [`LandscapeSource`] yields super regions, regions, stations and edges
//! - [`PlayerSource`] yields the current player list
//!
//! Two implementations ship with the crate: [`HttpPlayerSource`], which
//! downloads and parses the colon separated player list, and
//! [`StaticSource`], an in-memory source with failure injection used by
//! tests and demos.

mod error;
mod http;
mod players;
mod records;
mod static_source;

pub use error::SourceError;
pub use http::{HttpClient, HttpPlayerSource, ReqwestClient, DEFAULT_TIMEOUT_SECS};
pub use players::parse_player_list;
pub use records::{
    EdgeRecord, LandscapeRecords, PlayerRecord, RegionRecord, StationRecord, SuperRegionRecord,
};
pub use static_source::StaticSource;

/// Provides the landscape: regions, stations and the links between them.
pub trait LandscapeSource: Send + Sync {
    /// Fetch the complete current landscape.
    fn fetch_landscape(&self) -> Result<LandscapeRecords, SourceError>;
}

/// Provides the list of players currently occupying stations.
pub trait PlayerSource: Send + Sync {
    /// Fetch the current player list.
    fn fetch_players(&self) -> Result<Vec<PlayerRecord>, SourceError>;

    /// Re-establish the session after [`SourceError::Authentication`].
    ///
    /// Sources without sessions have nothing to do.
    fn reauthenticate(&self) -> Result<(), SourceError> {
        Ok(())
    }
}

impl<T: LandscapeSource + ?Sized> LandscapeSource for std::sync::Arc<T> {
    fn fetch_landscape(&self) -> Result<LandscapeRecords, SourceError> {
        (**self).fetch_landscape()
    }
}

impl<T: PlayerSource + ?Sized> PlayerSource for std::sync::Arc<T> {
    fn fetch_players(&self) -> Result<Vec<PlayerRecord>, SourceError> {
        (**self).fetch_players()
    }

    fn reauthenticate(&self) -> Result<(), SourceError> {
        (**self).reauthenticate()
    }
}
