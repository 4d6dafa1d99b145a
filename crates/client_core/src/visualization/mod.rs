//! Animated walk through the conceptual stages of the selected algorithm.
//!
//! A run is armed with [`VisualizationEngine::begin`] when an operation starts
//! and played with [`VisualizationEngine::play`] once the service result is
//! known. Each stage reveals its content one character at a time and then
//! holds for its dwell time, so the animation is perceptible however fast the
//! service answered.

mod content;
mod pipeline;

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, SeedableRng};
use shared::domain::Algorithm;
use thiserror::Error;
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
    time::Instant,
};
use tracing::{debug, info};

pub use content::{
    details_for, hex_preview, illustrative_iv, preview, produced_hex, stage_content, to_hex,
    AlgorithmDetails, HEX_PREVIEW_CHARS, INPUT_PREVIEW_CHARS, OUTPUT_PREVIEW_CHARS,
    RSA_ILLUSTRATIVE_MODULUS,
};
pub use pipeline::{
    plan_for, PipelinePhase, PipelineState, Stage, StagePlan, StageState, StageStatus,
    StageTransitionError, ASYMMETRIC_PLAN, SYMMETRIC_PLAN,
};

use crate::clock::{CancelToken, Cancelled, Clock, ClockedDelay};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualizationSummary {
    pub algorithm: Algorithm,
    pub elapsed: Duration,
}

impl VisualizationSummary {
    pub fn elapsed_label(&self) -> String {
        format!("{:.2}s", self.elapsed.as_secs_f64())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct VisualizationSnapshot {
    pub run: u64,
    pub visible: bool,
    pub pipeline: Option<PipelineState>,
    pub details: Option<AlgorithmDetails>,
    pub started_at: Option<DateTime<Utc>>,
    /// Live readout, refreshed while the run is in progress.
    pub elapsed: Duration,
    pub summary: Option<VisualizationSummary>,
}

impl VisualizationSnapshot {
    pub fn phase(&self) -> Option<PipelinePhase> {
        self.pipeline.as_ref().map(PipelineState::phase)
    }

    fn in_progress(&self) -> bool {
        matches!(
            self.phase(),
            Some(PipelinePhase::Armed | PipelinePhase::Running)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisualizationEvent {
    Started { run: u64, algorithm: Algorithm },
    StageActivated { run: u64, stage: Stage },
    StageCompleted { run: u64, stage: Stage },
    Finished { run: u64, summary: VisualizationSummary },
    Aborted { run: u64 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("no visualization run is armed")]
    NotArmed,
    #[error("visualization aborted")]
    Aborted(#[from] Cancelled),
    #[error(transparent)]
    Transition(#[from] StageTransitionError),
}

#[derive(Debug, Clone, Copy)]
pub struct VisualizationTimings {
    pub char_pace: Duration,
    pub elapsed_tick: Duration,
}

impl Default for VisualizationTimings {
    fn default() -> Self {
        Self {
            char_pace: Duration::from_millis(20),
            elapsed_tick: Duration::from_millis(100),
        }
    }
}

struct ArmedRun {
    cancel: CancelToken,
    started: Instant,
    ticker: JoinHandle<()>,
}

pub struct VisualizationEngine {
    clock: Arc<dyn Clock>,
    timings: VisualizationTimings,
    rng: StdRng,
    runs: u64,
    armed: Option<ArmedRun>,
    state: watch::Sender<VisualizationSnapshot>,
    events: broadcast::Sender<VisualizationEvent>,
}

impl VisualizationEngine {
    pub fn new(clock: Arc<dyn Clock>, timings: VisualizationTimings, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let (state, _) = watch::channel(VisualizationSnapshot::default());
        let (events, _) = broadcast::channel(256);
        Self {
            clock,
            timings,
            rng,
            runs: 0,
            armed: None,
            state,
            events,
        }
    }

    /// Resets the engine for a new operation and shows the container with
    /// every stage pending. Aborts a run still in progress.
    pub fn begin(&mut self, algorithm: Algorithm) -> u64 {
        self.abort();
        self.runs += 1;
        let run = self.runs;
        let started = self.clock.now();

        self.state.send_replace(VisualizationSnapshot {
            run,
            visible: true,
            pipeline: Some(PipelineState::new(algorithm)),
            details: Some(details_for(algorithm)),
            started_at: Some(Utc::now()),
            elapsed: Duration::ZERO,
            summary: None,
        });

        let ticker = self.spawn_elapsed_ticker(run, started);
        self.armed = Some(ArmedRun {
            cancel: CancelToken::new(),
            started,
            ticker,
        });
        let _ = self.events.send(VisualizationEvent::Started { run, algorithm });
        debug!(run, %algorithm, "visualization armed");
        run
    }

    /// Token that aborts the armed run from outside, mid-sequence.
    pub fn abort_handle(&self) -> Option<CancelToken> {
        self.armed.as_ref().map(|armed| armed.cancel.clone())
    }

    /// Plays every stage of the armed run against the service result and
    /// returns the summary. Nothing is summarized when the run is aborted.
    pub async fn play(
        &mut self,
        input: &str,
        produced: &str,
    ) -> Result<VisualizationSummary, PlaybackError> {
        let Some(armed) = self.armed.as_ref() else {
            return Err(PlaybackError::NotArmed);
        };
        let (run, algorithm) = {
            let snapshot = self.state.borrow();
            match snapshot.pipeline.as_ref() {
                Some(pipeline) if snapshot.in_progress() => (snapshot.run, pipeline.algorithm()),
                _ => return Err(PlaybackError::NotArmed),
            }
        };
        let delay = ClockedDelay::new(Arc::clone(&self.clock), armed.cancel.clone());
        let started = armed.started;
        let family = algorithm.family();

        let steps: Vec<(StagePlan, String)> = plan_for(family)
            .iter()
            .map(|plan| {
                let content = stage_content(plan.stage, family, input, produced, &mut self.rng);
                (*plan, content)
            })
            .collect();

        let outcome = self.play_steps(run, &delay, &steps).await;
        if let Err(err) = outcome {
            self.abort();
            return Err(err);
        }

        let summary = VisualizationSummary {
            algorithm,
            elapsed: self.clock.now().saturating_duration_since(started),
        };
        self.apply(|pipeline| pipeline.finish())?;
        self.state.send_modify(|snapshot| {
            snapshot.elapsed = summary.elapsed;
            snapshot.summary = Some(summary.clone());
        });
        if let Some(armed) = self.armed.take() {
            armed.ticker.abort();
        }
        let _ = self.events.send(VisualizationEvent::Finished {
            run,
            summary: summary.clone(),
        });
        info!(
            run,
            %algorithm,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "visualization finished"
        );
        Ok(summary)
    }

    async fn play_steps(
        &self,
        run: u64,
        delay: &ClockedDelay,
        steps: &[(StagePlan, String)],
    ) -> Result<(), PlaybackError> {
        for (plan, content) in steps {
            let stage = plan.stage;
            self.ensure_not_cancelled(delay)?;
            self.apply(|pipeline| pipeline.activate(stage))?;
            let _ = self
                .events
                .send(VisualizationEvent::StageActivated { run, stage });

            for ch in content.chars() {
                self.ensure_not_cancelled(delay)?;
                self.apply(|pipeline| pipeline.reveal(stage, ch))?;
                delay.wait(self.timings.char_pace).await?;
            }
            delay.wait(plan.dwell).await?;
            if !plan.pulse.is_zero() {
                delay.wait(plan.pulse).await?;
            }

            self.ensure_not_cancelled(delay)?;
            self.apply(|pipeline| pipeline.complete(stage))?;
            let _ = self
                .events
                .send(VisualizationEvent::StageCompleted { run, stage });
        }
        Ok(())
    }

    fn ensure_not_cancelled(&self, delay: &ClockedDelay) -> Result<(), PlaybackError> {
        if delay.is_cancelled() {
            return Err(PlaybackError::Aborted(Cancelled));
        }
        Ok(())
    }

    fn apply(
        &self,
        change: impl FnOnce(&mut PipelineState) -> Result<(), StageTransitionError>,
    ) -> Result<(), StageTransitionError> {
        let mut outcome = Ok(());
        self.state.send_if_modified(|snapshot| match snapshot.pipeline.as_mut() {
            Some(pipeline) => {
                outcome = change(pipeline);
                outcome.is_ok()
            }
            None => {
                outcome = Err(StageTransitionError::Aborted);
                false
            }
        });
        outcome
    }

    /// Stops the armed run where it stands. The stages stay on screen and no
    /// summary is produced. A no-op when nothing is in progress.
    pub fn abort(&mut self) {
        let Some(armed) = self.armed.take() else {
            return;
        };
        armed.cancel.cancel();
        armed.ticker.abort();

        let mut aborted_run = None;
        self.state.send_if_modified(|snapshot| {
            if !snapshot.in_progress() {
                return false;
            }
            if let Some(pipeline) = snapshot.pipeline.as_mut() {
                pipeline.abort();
            }
            snapshot.elapsed = self.clock.now().saturating_duration_since(armed.started);
            aborted_run = Some(snapshot.run);
            true
        });
        if let Some(run) = aborted_run {
            let _ = self.events.send(VisualizationEvent::Aborted { run });
            debug!(run, "visualization aborted");
        }
    }

    /// Aborts anything in progress and hides the container.
    pub fn hide(&mut self) {
        self.abort();
        self.state.send_if_modified(|snapshot| {
            let changed = snapshot.visible || snapshot.pipeline.is_some();
            snapshot.visible = false;
            snapshot.pipeline = None;
            snapshot.details = None;
            snapshot.summary = None;
            changed
        });
    }

    pub fn snapshot(&self) -> VisualizationSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<VisualizationSnapshot> {
        self.state.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<VisualizationEvent> {
        self.events.subscribe()
    }

    fn spawn_elapsed_ticker(&self, run: u64, started: Instant) -> JoinHandle<()> {
        let clock = Arc::clone(&self.clock);
        let state = self.state.clone();
        let tick = self.timings.elapsed_tick;
        tokio::spawn(async move {
            loop {
                clock.sleep(tick).await;
                let now = clock.now();
                let mut live = false;
                state.send_if_modified(|snapshot| {
                    if snapshot.run != run || !snapshot.in_progress() {
                        return false;
                    }
                    live = true;
                    snapshot.elapsed = now.saturating_duration_since(started);
                    true
                });
                if !live {
                    break;
                }
            }
        })
    }
}

impl Drop for VisualizationEngine {
    fn drop(&mut self) {
        if let Some(armed) = self.armed.take() {
            armed.cancel.cancel();
            armed.ticker.abort();
        }
    }
}

#[cfg(test)]
#[path = "../tests/visualization_tests.rs"]
mod tests;
