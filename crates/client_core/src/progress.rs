//! Simulated progress indicator for in-flight requests.
//!
//! Byte-level progress is not observable from the client, so while a request
//! runs the percentage creeps up by random steps and stalls at 90. `stop`
//! snaps it to 100 and hides the bar shortly after.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::{sync::watch, task::JoinHandle};
use tracing::debug;

use crate::clock::Clock;

pub const PROGRESS_CEILING: f64 = 90.0;
pub const MAX_STEP: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    Initializing,
    Reading,
    Processing,
    Finalizing,
    Complete,
}

impl ProgressStatus {
    pub fn for_percent(percent: f64) -> Self {
        if percent < 30.0 {
            ProgressStatus::Reading
        } else if percent < 60.0 {
            ProgressStatus::Processing
        } else {
            ProgressStatus::Finalizing
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProgressStatus::Initializing => "Initializing...",
            ProgressStatus::Reading => "Reading data...",
            ProgressStatus::Processing => "Processing encryption...",
            ProgressStatus::Finalizing => "Finalizing...",
            ProgressStatus::Complete => "Complete!",
        }
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressState {
    pub visible: bool,
    pub title: String,
    pub percent: f64,
    pub status: ProgressStatus,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            visible: false,
            title: String::new(),
            percent: 0.0,
            status: ProgressStatus::Initializing,
        }
    }
}

impl ProgressState {
    pub fn rounded_percent(&self) -> u8 {
        self.percent.round().clamp(0.0, 100.0) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgressHandle(u64);

struct ActiveRun {
    handle: ProgressHandle,
    ticker: JoinHandle<()>,
}

pub struct ProgressSimulator {
    clock: Arc<dyn Clock>,
    tick: Duration,
    hide_after: Duration,
    rng: StdRng,
    /// Bumped on every start and stop; stale tickers and hide timers compare
    /// against it before writing.
    epoch: Arc<AtomicU64>,
    active: Option<ActiveRun>,
    state: watch::Sender<ProgressState>,
}

impl ProgressSimulator {
    pub fn new(
        clock: Arc<dyn Clock>,
        tick: Duration,
        hide_after: Duration,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let (state, _) = watch::channel(ProgressState::default());
        Self {
            clock,
            tick,
            hide_after,
            rng,
            epoch: Arc::new(AtomicU64::new(0)),
            active: None,
            state,
        }
    }

    /// Starts a new run, stopping any run still active. Must be called from
    /// within a tokio runtime.
    pub fn start(&mut self, title: &str) -> ProgressHandle {
        if let Some(previous) = self.active.as_ref().map(|run| run.handle) {
            debug!("progress run replaced while still active");
            self.stop(previous);
        }

        let run = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = ProgressHandle(run);
        self.state.send_replace(ProgressState {
            visible: true,
            title: title.to_string(),
            percent: 0.0,
            status: ProgressStatus::Initializing,
        });

        let clock = Arc::clone(&self.clock);
        let epoch = Arc::clone(&self.epoch);
        let state = self.state.clone();
        let tick = self.tick;
        let mut rng = StdRng::seed_from_u64(self.rng.random());
        let ticker = tokio::spawn(async move {
            loop {
                clock.sleep(tick).await;
                let step = rng.random_range(0.0..MAX_STEP);
                let still_current = state.send_if_modified(|progress| {
                    if epoch.load(Ordering::SeqCst) != run {
                        return false;
                    }
                    progress.percent = (progress.percent + step).min(PROGRESS_CEILING);
                    progress.status = ProgressStatus::for_percent(progress.percent);
                    true
                });
                if !still_current {
                    break;
                }
            }
        });

        debug!(run, title, "progress started");
        self.active = Some(ActiveRun { handle, ticker });
        handle
    }

    /// Stops the run identified by `handle`. Unknown or stale handles are ignored.
    pub fn stop(&mut self, handle: ProgressHandle) -> bool {
        let Some(active) = self.active.take_if(|run| run.handle == handle) else {
            return false;
        };
        active.ticker.abort();
        let stopped_at = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        self.state.send_modify(|progress| {
            progress.percent = 100.0;
            progress.status = ProgressStatus::Complete;
        });

        let epoch = Arc::clone(&self.epoch);
        let state = self.state.clone();
        let hide = self.clock.sleep(self.hide_after);
        tokio::spawn(async move {
            hide.await;
            state.send_if_modified(|progress| {
                if epoch.load(Ordering::SeqCst) != stopped_at || !progress.visible {
                    return false;
                }
                progress.visible = false;
                true
            });
        });

        debug!(run = handle.0, "progress stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn snapshot(&self) -> ProgressState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.state.subscribe()
    }
}

impl Drop for ProgressSimulator {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.ticker.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/progress_tests.rs"]
mod tests;
