//! Stations, their links and their forum comments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ids::{Aid, Rid};

/// Geographic position of a station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A link from one station to an adjacent one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Neighbor {
    /// The adjacent station.
    pub aid: Aid,
    /// Whether crossing this link requires a formal handover.
    pub handover: bool,
}

/// An undirected link between two distinct stations.
///
/// The endpoints are stored in canonical order (`a < b`), so the edges
/// `(A, B)` and `(B, A)` compare and hash equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    a: Aid,
    b: Aid,
    pub handover: bool,
}

impl Edge {
    /// Create an edge between two stations.
    ///
    /// Returns `None` for a self loop.
    pub fn new(x: Aid, y: Aid, handover: bool) -> Option<Self> {
        match x.cmp(&y) {
            std::cmp::Ordering::Less => Some(Self { a: x, b: y, handover }),
            std::cmp::Ordering::Greater => Some(Self { a: y, b: x, handover }),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// The canonical unordered endpoint pair.
    pub fn endpoints(&self) -> (Aid, Aid) {
        (self.a, self.b)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let link = if self.handover { "<>" } else { ".." };
        write!(f, "{} {} {}", self.a, link, self.b)
    }
}

/// Playing duration bucket reported in station comments.
///
/// The declaration order is the ascending scale used for sorting.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum PlayingTime {
    #[serde(rename = "<15 min")]
    Under15Min,
    #[serde(rename = "<30 min")]
    Under30Min,
    #[serde(rename = "30-90 min")]
    Between30And90Min,
    #[serde(rename = ">90 min")]
    Over90Min,
}

impl PlayingTime {
    /// All buckets in ascending order.
    pub const ASCENDING: [PlayingTime; 4] = [
        PlayingTime::Under15Min,
        PlayingTime::Under30Min,
        PlayingTime::Between30And90Min,
        PlayingTime::Over90Min,
    ];

    /// Short display label.
    pub fn label(self) -> &'static str {
        match self {
            PlayingTime::Under15Min => "<15 min",
            PlayingTime::Under30Min => "<30 min",
            PlayingTime::Between30And90Min => "30-90 min",
            PlayingTime::Over90Min => ">90 min",
        }
    }

    /// Position in the ascending scale, starting at 0.
    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for PlayingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PlayingTime {
    type Err = String;

    /// Accepts the short labels as well as the forum's long form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<15 min" | "Spieldauer: unter 15 Minuten" => Ok(PlayingTime::Under15Min),
            "<30 min" | "Spieldauer: unter 30 Minuten" => Ok(PlayingTime::Under30Min),
            "30-90 min" | "Spieldauer: zwischen 30 und 90 Minuten" => {
                Ok(PlayingTime::Between30And90Min)
            }
            ">90 min" | "Spieldauer: über 90 Minuten" => Ok(PlayingTime::Over90Min),
            other => Err(format!("unknown playing time '{}'", other)),
        }
    }
}

/// A forum comment on a station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    #[serde(default)]
    pub playing_duration: Option<PlayingTime>,
    pub year: i32,
}

/// A station of the landscape.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub aid: Aid,
    /// The owning region.
    pub rid: Rid,
    /// Adjacent stations in edge order.
    pub neighbors: Vec<Neighbor>,
    pub name: String,
    /// Rich-text description as delivered by the source.
    pub description: String,
    pub coordinates: Option<Coordinates>,
    /// Community rating in `[1, 4]`.
    pub difficulty: Option<f64>,
    /// Community rating in `[1, 4]`.
    pub entertainment: Option<f64>,
    pub comments: Vec<Comment>,
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
