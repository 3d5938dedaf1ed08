//! In-memory source with failure injection.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::{LandscapeRecords, LandscapeSource, PlayerRecord, PlayerSource, SourceError};

/// Serves landscape and player records held in memory.
///
/// Records can be swapped at any time and either side can be switched to
/// fail, which makes the source suitable for exercising refresh behavior.
#[derive(Debug, Default)]
pub struct StaticSource {
    state: Mutex<StaticState>,
    landscape_fetches: AtomicUsize,
    player_fetches: AtomicUsize,
    reauthentications: AtomicUsize,
}

#[derive(Debug, Default)]
struct StaticState {
    landscape: LandscapeRecords,
    players: Vec<PlayerRecord>,
    landscape_failure: Option<String>,
    player_failure: Option<Failure>,
}

#[derive(Debug, Clone)]
enum Failure {
    Unreachable(String),
    LoggedOut,
}

impl StaticSource {
    /// Create a source serving the given records.
    pub fn new(landscape: LandscapeRecords, players: Vec<PlayerRecord>) -> Self {
        Self {
            state: Mutex::new(StaticState {
                landscape,
                players,
                ..StaticState::default()
            }),
            ..Self::default()
        }
    }

    /// Replace the landscape served from now on.
    pub fn set_landscape(&self, landscape: LandscapeRecords) {
        self.state.lock().landscape = landscape;
    }

    /// Replace the player list served from now on.
    pub fn set_players(&self, players: Vec<PlayerRecord>) {
        self.state.lock().players = players;
    }

    /// Make landscape fetches fail (`Some`) or succeed (`None`).
    pub fn fail_landscape(&self, reason: Option<&str>) {
        self.state.lock().landscape_failure = reason.map(str::to_string);
    }

    /// Make player fetches fail (`Some`) or succeed (`None`).
    pub fn fail_players(&self, reason: Option<&str>) {
        self.state.lock().player_failure = reason.map(|r| Failure::Unreachable(r.to_string()));
    }

    /// Make player fetches fail with an authentication error until
    /// [`PlayerSource::reauthenticate`] is called.
    pub fn log_out(&self) {
        self.state.lock().player_failure = Some(Failure::LoggedOut);
    }

    pub fn landscape_fetches(&self) -> usize {
        self.landscape_fetches.load(Ordering::Relaxed)
    }

    pub fn player_fetches(&self) -> usize {
        self.player_fetches.load(Ordering::Relaxed)
    }

    pub fn reauthentications(&self) -> usize {
        self.reauthentications.load(Ordering::Relaxed)
    }
}

impl LandscapeSource for StaticSource {
    fn fetch_landscape(&self) -> Result<LandscapeRecords, SourceError> {
        self.landscape_fetches.fetch_add(1, Ordering::Relaxed);
        let state = self.state.lock();
        match &state.landscape_failure {
            Some(reason) => Err(SourceError::Fetch {
                what: "landscape".to_string(),
                reason: reason.clone(),
            }),
            None => Ok(state.landscape.clone()),
        }
    }
}

impl PlayerSource for StaticSource {
    fn fetch_players(&self) -> Result<Vec<PlayerRecord>, SourceError> {
        self.player_fetches.fetch_add(1, Ordering::Relaxed);
        let state = self.state.lock();
        match &state.player_failure {
            Some(Failure::Unreachable(reason)) => Err(SourceError::Fetch {
                what: "player list".to_string(),
                reason: reason.clone(),
            }),
            Some(Failure::LoggedOut) => {
                Err(SourceError::Authentication("session expired".to_string()))
            }
            None => Ok(state.players.clone()),
        }
    }

    fn reauthenticate(&self) -> Result<(), SourceError> {
        self.reauthentications.fetch_add(1, Ordering::Relaxed);
        let mut state = self.state.lock();
        if matches!(state.player_failure, Some(Failure::LoggedOut)) {
            state.player_failure = None;
        }
        Ok(())
    }
}
