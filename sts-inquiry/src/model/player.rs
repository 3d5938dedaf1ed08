//! Players and per-instance station occupancy.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{Aid, Instance, N_INSTANCES};

/// A player currently occupying a station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    /// Whether the player is "sitting" (registered as a long-term occupant).
    pub stitz: bool,
    /// When the player's session started.
    pub start_time: DateTime<Utc>,
}

impl Player {
    /// How long the player has been playing at `now`, never negative.
    pub fn playing_duration(&self, now: DateTime<Utc>) -> chrono::Duration {
        (now - self.start_time).max(chrono::Duration::zero())
    }

    /// Human readable playing duration.
    ///
    /// Seconds below a minute, minutes below an hour, hours otherwise; each
    /// unit is rounded from the previous one. The short form is `42s`, `5m`,
    /// `2h`.
    pub fn format_playing_duration(&self, now: DateTime<Utc>, short: bool) -> String {
        let secs = (self.playing_duration(now).num_milliseconds() as f64 / 1000.0).round() as i64;
        if secs < 60 {
            return format_unit(secs, "s", "second", short);
        }
        let mins = (secs as f64 / 60.0).round() as i64;
        if mins < 60 {
            return format_unit(mins, "m", "minute", short);
        }
        let hours = (mins as f64 / 60.0).round() as i64;
        format_unit(hours, "h", "hour", short)
    }
}

fn format_unit(value: i64, short_unit: &str, long_unit: &str, short: bool) -> String {
    if short {
        format!("{}{}", value, short_unit)
    } else if value == 1 {
        format!("{} {}", value, long_unit)
    } else {
        format!("{} {}s", value, long_unit)
    }
}

/// Which player occupies which station in which instance.
///
/// Built from the player list independently of the landscape so it can be
/// replaced on the fast refresh cycle without touching the graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Occupancy {
    slots: HashMap<Aid, [Option<Player>; N_INSTANCES]>,
}

impl Occupancy {
    /// Occupancy with every slot empty.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set the occupant of a station in an instance, replacing any previous one.
    pub fn set(&mut self, aid: Aid, instance: Instance, player: Player) {
        let slots = self.slots.entry(aid).or_default();
        slots[instance.index()] = Some(player);
    }

    /// The occupant of a station in an instance.
    pub fn occupant_at(&self, aid: Aid, instance: Instance) -> Option<&Player> {
        self.slots
            .get(&aid)
            .and_then(|slots| slots[instance.index()].as_ref())
    }

    /// Both instance slots of a station, in instance order.
    pub fn occupants(&self, aid: Aid) -> [Option<&Player>; N_INSTANCES] {
        match self.slots.get(&aid) {
            Some([first, second]) => [first.as_ref(), second.as_ref()],
            None => [None, None],
        }
    }

    /// Whether a station is occupied in an instance.
    pub fn is_occupied(&self, aid: Aid, instance: Instance) -> bool {
        self.occupant_at(aid, instance).is_some()
    }

    /// Number of stations among `aids` occupied in `instance`.
    pub fn count_occupied<'a, I>(&self, aids: I, instance: Instance) -> usize
    where
        I: IntoIterator<Item = &'a Aid>,
    {
        aids.into_iter()
            .filter(|aid| self.is_occupied(**aid, instance))
            .count()
    }

    /// Total number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots
            .values()
            .map(|slots| slots.iter().filter(|s| s.is_some()).count())
            .sum()
    }

    /// Whether no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
