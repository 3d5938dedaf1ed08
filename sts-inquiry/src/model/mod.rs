//! Domain model for the station landscape.
//!
//! The landscape is a graph of stations ("Stellwerke") grouped into regions,
//! which are in turn grouped into super regions. Instead of the object graph
//! with back-references that the landscape naturally forms, every entity is
//! owned by the [`World`] and referenced by its externally assigned id:
//!
//! ```text
//! World
//!  ├── super_regions: urid ──► SuperRegion { rids }
//!  ├── regions:       rid  ──► Region      { urid, stations: [aid] }
//!  ├── stations:      aid  ──► Station     { rid, neighbors: [Neighbor { aid }] }
//!  └── edges:         [Edge { a, b, handover }]   (a < b)
//! ```
//!
//! Equality of regions and stations is therefore plain value equality of
//! their ids, and clusters are sets of [`Aid`]s.

mod ids;
mod player;
mod station;
mod world;

pub use ids::{Aid, Instance, Rid, Urid, INSTANCES, N_INSTANCES};
pub use player::{Occupancy, Player};
pub use station::{Comment, Coordinates, Edge, Neighbor, PlayingTime, Station};
pub use world::{Region, SuperRegion, World};
