//! Background refresh loop.
//!
//! # Lifecycle
//!
//! ```text
//! start() ──► tick ──► sleep(fast interval) ──► tick ──► ... ──► cancel()
//!              │
//!              └─ every Nth tick is a full refresh, N = full / fast
//! ```
//!
//! One tokio task owns the loop and the countdown to the next full refresh.
//! Each tick runs on the blocking pool and is awaited before the sleep
//! starts, so a slow tick delays the next one instead of overlapping it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::error::error_chain;
use super::refresher::{RefreshKind, RefreshOutcome, Refresher};
use super::RefreshError;
use crate::config::ConfigError;
use crate::source::{LandscapeSource, PlayerSource};

/// Fast and full refresh periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    fast_interval: Duration,
    ticks_per_full: u64,
}

impl RefreshSchedule {
    /// Create a schedule; `full` must be a non-zero multiple of `fast`.
    pub fn new(fast: Duration, full: Duration) -> Result<Self, ConfigError> {
        let fast_ms = fast.as_millis();
        let full_ms = full.as_millis();
        if fast_ms == 0 || full_ms == 0 || full_ms % fast_ms != 0 {
            return Err(ConfigError::IntervalMismatch {
                fast_ms,
                full_ms,
            });
        }
        let ticks_per_full = u64::try_from(full_ms / fast_ms).map_err(|_| {
            ConfigError::IntervalMismatch { fast_ms, full_ms }
        })?;

        Ok(Self {
            fast_interval: fast,
            ticks_per_full,
        })
    }

    pub fn fast_interval(&self) -> Duration {
        self.fast_interval
    }

    /// Number of ticks per full refresh, the full refresh included.
    pub fn ticks_per_full(&self) -> u64 {
        self.ticks_per_full
    }
}

/// Starts the refresh loop.
pub struct RefreshScheduler;

impl RefreshScheduler {
    /// Spawn the refresh loop on `runtime`.
    ///
    /// The first tick is a full refresh and runs immediately.
    pub fn start<L, P>(
        refresher: Arc<Refresher<L, P>>,
        schedule: RefreshSchedule,
        runtime: &Handle,
    ) -> SchedulerHandle
    where
        L: LandscapeSource + 'static,
        P: PlayerSource + 'static,
    {
        let cancellation = CancellationToken::new();
        let ticks = Arc::new(AtomicU64::new(0));

        let task = runtime.spawn(run_loop(
            refresher,
            schedule,
            cancellation.clone(),
            Arc::clone(&ticks),
        ));

        info!(
            fast_interval_ms = schedule.fast_interval.as_millis() as u64,
            ticks_per_full = schedule.ticks_per_full,
            "Refresh scheduler started"
        );

        SchedulerHandle {
            cancellation,
            task,
            ticks,
        }
    }
}

/// Handle to a running refresh loop.
#[derive(Debug)]
pub struct SchedulerHandle {
    cancellation: CancellationToken,
    task: JoinHandle<()>,
    ticks: Arc<AtomicU64>,
}

impl SchedulerHandle {
    /// Stop the loop after the tick in flight, if any.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Number of completed ticks, failed ones included.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Cancel and wait for the loop to exit.
    pub async fn shutdown(self) {
        self.cancellation.cancel();
        if let Err(e) = self.task.await {
            error!(error = %e, "Refresh scheduler task failed");
        }
    }
}

async fn run_loop<L, P>(
    refresher: Arc<Refresher<L, P>>,
    schedule: RefreshSchedule,
    cancellation: CancellationToken,
    ticks: Arc<AtomicU64>,
) where
    L: LandscapeSource + 'static,
    P: PlayerSource + 'static,
{
    let mut ticks_until_full: u64 = 0;

    while !cancellation.is_cancelled() {
        let kind = if ticks_until_full == 0 {
            ticks_until_full = schedule.ticks_per_full;
            RefreshKind::Full
        } else {
            RefreshKind::Fast
        };
        ticks_until_full -= 1;

        run_tick(&refresher, kind).await;
        ticks.fetch_add(1, Ordering::AcqRel);

        tokio::select! {
            biased;

            _ = cancellation.cancelled() => break,
            _ = tokio::time::sleep(schedule.fast_interval) => {}
        }
    }

    info!("Refresh scheduler stopped");
}

/// Run one tick on the blocking pool and log how it went.
async fn run_tick<L, P>(refresher: &Arc<Refresher<L, P>>, kind: RefreshKind)
where
    L: LandscapeSource + 'static,
    P: PlayerSource + 'static,
{
    info!(%kind, "Refresh started");
    let started = Instant::now();

    let worker = Arc::clone(refresher);
    let result = tokio::task::spawn_blocking(move || worker.refresh(kind))
        .await
        .unwrap_or_else(|e| Err(RefreshError::TaskPanicked(e.to_string())));

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(RefreshOutcome::Published) => {
            info!(%kind, elapsed_ms, "Refresh succeeded");
        }
        Ok(RefreshOutcome::Skipped) => {
            info!(%kind, "Refresh skipped, nothing published yet");
        }
        Err(e) => {
            error!(
                %kind,
                elapsed_ms,
                published = e.published(),
                error = %error_chain(&e),
                "Refresh failed, will retry on the next tick"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_requires_multiple() {
        let schedule =
            RefreshSchedule::new(Duration::from_secs(60), Duration::from_secs(21600)).unwrap();
        assert_eq!(schedule.ticks_per_full(), 360);

        let same = RefreshSchedule::new(Duration::from_secs(60), Duration::from_secs(60)).unwrap();
        assert_eq!(same.ticks_per_full(), 1);

        assert!(matches!(
            RefreshSchedule::new(Duration::from_secs(60), Duration::from_secs(90)),
            Err(ConfigError::IntervalMismatch { .. })
        ));
        assert!(RefreshSchedule::new(Duration::ZERO, Duration::from_secs(60)).is_err());
        assert!(RefreshSchedule::new(Duration::from_secs(60), Duration::ZERO).is_err());
    }
}
