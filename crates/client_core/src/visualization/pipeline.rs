//! Stage plans and the transition rules between stages.
//!
//! `PipelineState` has no notion of time. The sequencer in the parent module
//! drives it and owns the pacing.

use std::time::Duration;

use shared::domain::{Algorithm, AlgorithmFamily};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Input,
    Padding,
    Key,
    Encrypt,
    Output,
}

impl Stage {
    pub fn id(self) -> &'static str {
        match self {
            Stage::Input => "input",
            Stage::Padding => "padding",
            Stage::Key => "key",
            Stage::Encrypt => "encrypt",
            Stage::Output => "output",
        }
    }

    pub fn label(self, family: AlgorithmFamily) -> &'static str {
        match (self, family) {
            (Stage::Input, _) => "Input Data",
            (Stage::Padding, _) => "Padding",
            (Stage::Key, AlgorithmFamily::Symmetric) => "Key & IV Setup",
            (Stage::Key, AlgorithmFamily::Asymmetric) => "Public Key",
            (Stage::Encrypt, AlgorithmFamily::Symmetric) => "Block Transform",
            (Stage::Encrypt, AlgorithmFamily::Asymmetric) => "Modular Exponentiation",
            (Stage::Output, _) => "Output",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagePlan {
    pub stage: Stage,
    /// Minimum time the stage stays active after its content is revealed.
    pub dwell: Duration,
    /// Extra hold after the dwell, used for the RSA formula pulse.
    pub pulse: Duration,
}

const fn plan(stage: Stage, dwell_ms: u64, pulse_ms: u64) -> StagePlan {
    StagePlan {
        stage,
        dwell: Duration::from_millis(dwell_ms),
        pulse: Duration::from_millis(pulse_ms),
    }
}

pub const SYMMETRIC_PLAN: [StagePlan; 5] = [
    plan(Stage::Input, 500, 0),
    plan(Stage::Padding, 800, 0),
    plan(Stage::Key, 600, 0),
    plan(Stage::Encrypt, 1200, 0),
    plan(Stage::Output, 800, 0),
];

pub const ASYMMETRIC_PLAN: [StagePlan; 4] = [
    plan(Stage::Input, 500, 0),
    plan(Stage::Key, 800, 0),
    plan(Stage::Encrypt, 1000, 500),
    plan(Stage::Output, 600, 0),
];

pub fn plan_for(family: AlgorithmFamily) -> &'static [StagePlan] {
    match family {
        AlgorithmFamily::Symmetric => &SYMMETRIC_PLAN,
        AlgorithmFamily::Asymmetric => &ASYMMETRIC_PLAN,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Pending,
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageState {
    pub stage: Stage,
    pub status: StageStatus,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    /// Reset for a new operation; nothing active yet.
    Armed,
    Running,
    Finished,
    Aborted,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StageTransitionError {
    #[error("stage '{}' is not part of the {family:?} pipeline", .stage.id())]
    NotInPipeline {
        stage: Stage,
        family: AlgorithmFamily,
    },
    #[error("stage '{}' requested while '{}' is next", .requested.id(), .expected.id())]
    OutOfOrder { expected: Stage, requested: Stage },
    #[error("stage '{}' is still active", .0.id())]
    StillActive(Stage),
    #[error("stage '{}' is not active", .0.id())]
    NotActive(Stage),
    #[error("pipeline has stages that never completed")]
    Incomplete,
    #[error("pipeline already finished")]
    Finished,
    #[error("pipeline was aborted")]
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineState {
    algorithm: Algorithm,
    stages: Vec<StageState>,
    phase: PipelinePhase,
}

impl PipelineState {
    pub fn new(algorithm: Algorithm) -> Self {
        let stages = plan_for(algorithm.family())
            .iter()
            .map(|plan| StageState {
                stage: plan.stage,
                status: StageStatus::Pending,
                content: String::new(),
            })
            .collect();
        Self {
            algorithm,
            stages,
            phase: PipelinePhase::Armed,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn family(&self) -> AlgorithmFamily {
        self.algorithm.family()
    }

    pub fn phase(&self) -> PipelinePhase {
        self.phase
    }

    pub fn stages(&self) -> &[StageState] {
        &self.stages
    }

    pub fn plan(&self) -> &'static [StagePlan] {
        plan_for(self.family())
    }

    pub fn status(&self, stage: Stage) -> Option<StageStatus> {
        self.stages
            .iter()
            .find(|state| state.stage == stage)
            .map(|state| state.status)
    }

    pub fn active_stage(&self) -> Option<Stage> {
        self.stages
            .iter()
            .find(|state| state.status == StageStatus::Active)
            .map(|state| state.stage)
    }

    /// The stage that may become active next.
    pub fn next_stage(&self) -> Option<Stage> {
        self.stages
            .iter()
            .find(|state| state.status == StageStatus::Pending)
            .map(|state| state.stage)
    }

    pub fn is_complete(&self) -> bool {
        self.stages
            .iter()
            .all(|state| state.status == StageStatus::Completed)
    }

    pub fn activate(&mut self, stage: Stage) -> Result<(), StageTransitionError> {
        self.ensure_live()?;
        let index = self.index_of(stage)?;
        if let Some(active) = self.active_stage() {
            return Err(StageTransitionError::StillActive(active));
        }
        match self.next_stage() {
            Some(expected) if expected == stage => {}
            Some(expected) => {
                return Err(StageTransitionError::OutOfOrder {
                    expected,
                    requested: stage,
                })
            }
            None => return Err(StageTransitionError::Finished),
        }

        let state = &mut self.stages[index];
        state.status = StageStatus::Active;
        state.content.clear();
        self.phase = PipelinePhase::Running;
        Ok(())
    }

    /// Appends one revealed character to the active stage's content.
    pub fn reveal(&mut self, stage: Stage, ch: char) -> Result<(), StageTransitionError> {
        let state = self.active_mut(stage)?;
        state.content.push(ch);
        Ok(())
    }

    pub fn complete(&mut self, stage: Stage) -> Result<(), StageTransitionError> {
        let state = self.active_mut(stage)?;
        state.status = StageStatus::Completed;
        Ok(())
    }

    pub fn finish(&mut self) -> Result<(), StageTransitionError> {
        self.ensure_live()?;
        if !self.is_complete() {
            return Err(StageTransitionError::Incomplete);
        }
        self.phase = PipelinePhase::Finished;
        Ok(())
    }

    /// Stops the pipeline where it stands. A finished pipeline stays finished.
    pub fn abort(&mut self) {
        if self.phase != PipelinePhase::Finished {
            self.phase = PipelinePhase::Aborted;
        }
    }

    fn ensure_live(&self) -> Result<(), StageTransitionError> {
        match self.phase {
            PipelinePhase::Armed | PipelinePhase::Running => Ok(()),
            PipelinePhase::Finished => Err(StageTransitionError::Finished),
            PipelinePhase::Aborted => Err(StageTransitionError::Aborted),
        }
    }

    fn index_of(&self, stage: Stage) -> Result<usize, StageTransitionError> {
        self.stages
            .iter()
            .position(|state| state.stage == stage)
            .ok_or(StageTransitionError::NotInPipeline {
                stage,
                family: self.family(),
            })
    }

    fn active_mut(&mut self, stage: Stage) -> Result<&mut StageState, StageTransitionError> {
        self.ensure_live()?;
        let index = self.index_of(stage)?;
        let state = &mut self.stages[index];
        if state.status != StageStatus::Active {
            return Err(StageTransitionError::NotActive(stage));
        }
        Ok(state)
    }
}
