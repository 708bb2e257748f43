//! Pipeline run state
//!
//! [`RunState`] is a plain value. It only changes by applying a
//! [`PipelineEvent`] through [`reduce`], which returns the next state and
//! never mutates its input.
//!
//! Completion and failure events carry the epoch captured when the run was
//! submitted. A reset bumps the epoch, so any event from a run that was
//! reset while its provider call was in flight no longer matches and is
//! ignored.

use serde::{Deserialize, Serialize};

use crate::analysis::{ResearchResult, RoadmapResult, SwotResult};

/// Pipeline phases, in the order a run visits them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PipelinePhase {
    /// Waiting for a company name
    #[default]
    Input,
    /// Grounded market research in progress or done
    Research,
    /// SWOT synthesis in progress or done
    Swot,
    /// Roadmap generation in progress or done
    Roadmap,
}

impl PipelinePhase {
    /// Get the next phase in the pipeline
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Input => Some(Self::Research),
            Self::Research => Some(Self::Swot),
            Self::Swot => Some(Self::Roadmap),
            Self::Roadmap => None,
        }
    }

    /// Check if this is the last phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Roadmap)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::Research => "Research",
            Self::Swot => "SWOT Analysis",
            Self::Roadmap => "Roadmap",
        }
    }
}

/// Everything known about the current analysis run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub company_name: String,
    pub phase: PipelinePhase,
    pub research: Option<ResearchResult>,
    pub swot: Option<SwotResult>,
    pub roadmap: Option<RoadmapResult>,

    /// Research call in flight
    pub is_searching: bool,
    /// SWOT call in flight
    pub is_analyzing: bool,
    /// Roadmap call in flight
    pub is_generating: bool,

    /// Generation token, bumped on every reset
    pub epoch: u64,
}

impl RunState {
    /// A fresh state at `epoch`
    pub fn initial(epoch: u64) -> Self {
        Self {
            epoch,
            ..Self::default()
        }
    }

    /// Any provider call currently outstanding
    pub fn is_in_flight(&self) -> bool {
        self.is_searching || self.is_analyzing || self.is_generating
    }

    /// All three stages finished
    pub fn is_complete(&self) -> bool {
        self.phase.is_terminal() && !self.is_in_flight() && self.roadmap.is_some()
    }

    /// Nothing submitted, nothing stored
    pub fn is_idle(&self) -> bool {
        *self == Self::initial(self.epoch)
    }

    /// Progress message for the call in flight, if any
    pub fn status_message(&self) -> Option<&'static str> {
        if self.is_searching {
            Some("Agent is scanning global markets...")
        } else if self.is_analyzing {
            Some("Synthesizing SWOT matrix...")
        } else if self.is_generating {
            Some("Optimizing product strategy roadmap...")
        } else {
            None
        }
    }
}

/// Something that happened to the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// User submitted a company name
    Submitted { company_name: String },
    ResearchCompleted { epoch: u64, research: ResearchResult },
    SwotCompleted { epoch: u64, swot: SwotResult },
    RoadmapCompleted { epoch: u64, roadmap: RoadmapResult },
    /// A stage failed; the whole run is discarded
    Failed { epoch: u64 },
    /// User started over
    Reset,
}

/// Apply `event` to `state`, returning the next state.
///
/// Events that do not fit the current phase, or that carry a stale epoch,
/// leave the state unchanged.
pub fn reduce(state: &RunState, event: &PipelineEvent) -> RunState {
    match event {
        PipelineEvent::Submitted { company_name } => {
            let name = company_name.trim();
            if state.phase != PipelinePhase::Input || name.is_empty() {
                return state.clone();
            }
            RunState {
                company_name: name.to_string(),
                phase: PipelinePhase::Research,
                is_searching: true,
                ..RunState::initial(state.epoch)
            }
        }

        PipelineEvent::ResearchCompleted { epoch, research } => {
            if *epoch != state.epoch || state.phase != PipelinePhase::Research || !state.is_searching {
                return state.clone();
            }
            RunState {
                phase: PipelinePhase::Swot,
                research: Some(research.clone()),
                is_searching: false,
                is_analyzing: true,
                ..state.clone()
            }
        }

        PipelineEvent::SwotCompleted { epoch, swot } => {
            if *epoch != state.epoch || state.phase != PipelinePhase::Swot || !state.is_analyzing {
                return state.clone();
            }
            RunState {
                phase: PipelinePhase::Roadmap,
                swot: Some(swot.clone()),
                is_analyzing: false,
                is_generating: true,
                ..state.clone()
            }
        }

        PipelineEvent::RoadmapCompleted { epoch, roadmap } => {
            if *epoch != state.epoch || state.phase != PipelinePhase::Roadmap || !state.is_generating {
                return state.clone();
            }
            RunState {
                roadmap: Some(roadmap.clone()),
                is_generating: false,
                ..state.clone()
            }
        }

        PipelineEvent::Failed { epoch } => {
            if *epoch != state.epoch {
                return state.clone();
            }
            RunState::initial(state.epoch)
        }

        PipelineEvent::Reset => RunState::initial(state.epoch.wrapping_add(1)),
    }
}
