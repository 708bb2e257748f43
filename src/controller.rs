//! # Pipeline Controller
//!
//! Drives one analysis run: research, then SWOT, then roadmap. Each stage's
//! request is built from the previous stage's result, so the three provider
//! calls are strictly sequential.
//!
//! The controller owns the [`RunState`]. Readers take snapshots or follow
//! transitions; only the controller applies events, and it does so through
//! the pure [`reduce`] function.
//!
//! A failure at any stage discards the whole run. A reset while a call is
//! in flight does not cancel that call; its result is dropped when it
//! arrives because it carries the old epoch.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use crate::analysis::{ResearchResult, RoadmapResult, SwotResult};
use crate::error::PipelineError;
use crate::prompts::AnalysisPrompts;
use crate::provider::AnalysisProvider;
use crate::state::{reduce, PipelineEvent, PipelinePhase, RunState};

/// Transition snapshots buffered for slow subscribers
const TRANSITION_BUFFER: usize = 32;

/// How a run that did not fail ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// All three stages succeeded; the final state
    Completed(RunState),
    /// The run was reset while a call was in flight and its results dropped
    Discarded,
}

/// Orchestrates the three provider calls and owns the run state.
pub struct PipelineController {
    provider: Arc<dyn AnalysisProvider>,
    state: watch::Sender<RunState>,
    transitions: broadcast::Sender<RunState>,
}

impl PipelineController {
    pub fn new(provider: Arc<dyn AnalysisProvider>) -> Self {
        let (state, _) = watch::channel(RunState::default());
        let (transitions, _) = broadcast::channel(TRANSITION_BUFFER);

        Self {
            provider,
            state,
            transitions,
        }
    }

    /// Current state
    pub fn snapshot(&self) -> RunState {
        self.state.borrow().clone()
    }

    /// Latest-value view of the state, for progress displays
    pub fn watch(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// Every applied transition, in order
    pub fn subscribe(&self) -> broadcast::Receiver<RunState> {
        self.transitions.subscribe()
    }

    /// Apply an event. Returns the new state if the event changed anything.
    fn dispatch(&self, event: &PipelineEvent) -> Option<RunState> {
        let mut applied = None;

        self.state.send_if_modified(|current| {
            let next = reduce(current, event);
            if next == *current {
                return false;
            }
            *current = next.clone();
            // Published under the store lock so subscribers see transitions in order.
            let _ = self.transitions.send(next.clone());
            applied = Some(next);
            true
        });

        applied
    }

    /// Run the full pipeline for `company_name`.
    ///
    /// Fails without touching the state when the name is blank or another
    /// run has not been reset. Any provider or parse failure resets the
    /// state to its initial value and is returned to the caller.
    pub async fn run_analysis(&self, company_name: &str) -> Result<RunOutcome, PipelineError> {
        let name = company_name.trim();
        if name.is_empty() {
            warn!("Rejected analysis request with empty company name");
            return Err(PipelineError::Validation(
                "company name must not be empty".to_string(),
            ));
        }

        let submitted = self
            .dispatch(&PipelineEvent::Submitted {
                company_name: name.to_string(),
            })
            .ok_or(PipelineError::Busy)?;
        let epoch = submitted.epoch;

        info!(company = %name, epoch, provider = self.provider.name(), "Starting analysis");

        match self.execute(name, epoch).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                if self.dispatch(&PipelineEvent::Failed { epoch }).is_some() {
                    error!(company = %name, error = %err, "Error in analysis pipeline");
                    Err(err)
                } else {
                    debug!(epoch, error = %err, "Dropping failure from a run that was reset");
                    Ok(RunOutcome::Discarded)
                }
            }
        }
    }

    async fn execute(&self, name: &str, epoch: u64) -> Result<RunOutcome, PipelineError> {
        // Phase 1: Research
        let response = self.provider.generate(AnalysisPrompts::research(name)).await?;
        let research = ResearchResult::from_grounded(response.text, &response.grounding_references);
        info!(sources = research.sources.len(), "Research completed");

        let research_text = research.text.clone();
        if !self.advance(PipelineEvent::ResearchCompleted { epoch, research }) {
            return Ok(RunOutcome::Discarded);
        }

        // Phase 2: SWOT
        let response = self.provider.generate(AnalysisPrompts::swot(&research_text)).await?;
        let swot = SwotResult::parse(&response.text)?;
        info!(
            strengths = swot.strengths.len(),
            weaknesses = swot.weaknesses.len(),
            opportunities = swot.opportunities.len(),
            threats = swot.threats.len(),
            "SWOT analysis completed"
        );

        let roadmap_request = AnalysisPrompts::roadmap(&swot, name);
        if !self.advance(PipelineEvent::SwotCompleted { epoch, swot }) {
            return Ok(RunOutcome::Discarded);
        }

        // Phase 3: Roadmap
        let response = self.provider.generate(roadmap_request).await?;
        let roadmap = RoadmapResult::parse(&response.text)?;
        info!(initiatives = roadmap.len(), "Roadmap completed");

        if !self.advance(PipelineEvent::RoadmapCompleted { epoch, roadmap }) {
            return Ok(RunOutcome::Discarded);
        }

        Ok(RunOutcome::Completed(self.snapshot()))
    }

    /// Apply a stage completion; false means the run was superseded.
    fn advance(&self, event: PipelineEvent) -> bool {
        if self.dispatch(&event).is_some() {
            return true;
        }
        debug!("Run was reset while a call was in flight, dropping result");
        false
    }

    /// Return to the input phase with a fresh state.
    ///
    /// Safe at any time. A call already in flight keeps running, but its
    /// result is dropped when it arrives.
    pub fn reset(&self) -> RunState {
        let was = self.snapshot();
        let state = self
            .dispatch(&PipelineEvent::Reset)
            .unwrap_or_else(|| self.snapshot());

        if was.phase != PipelinePhase::Input || was.is_in_flight() {
            info!(from = ?was.phase, epoch = state.epoch, "Pipeline reset");
        }
        state
    }
}

// =============================================================================
// UNIT TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ParseStage, ProviderError};
    use crate::provider::{ProviderRequest, ProviderResponse};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays canned replies in order and records every prompt
    struct ScriptedProvider {
        replies: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(mut replies: Vec<Result<ProviderResponse, ProviderError>>) -> Arc<Self> {
            replies.reverse();
            Arc::new(Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AnalysisProvider for ScriptedProvider {
        async fn generate(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            self.prompts.lock().unwrap().push(request.prompt);
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(ProviderError::InvalidResponse("script exhausted".into())))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    const SWOT: &str = r#"{"strengths":["a"],"weaknesses":[],"opportunities":["b"],"threats":[]}"#;
    const ROADMAP: &str = r#"[{"title":"X","description":"Y","quarter":"Q2","priority":"High","category":"Growth"}]"#;

    #[tokio::test]
    async fn test_empty_name_makes_no_calls() {
        let provider = ScriptedProvider::new(vec![]);
        let controller = PipelineController::new(provider.clone());

        for name in ["", "   ", "\t\n"] {
            let err = controller.run_analysis(name).await.unwrap_err();
            assert!(matches!(err, PipelineError::Validation(_)));
        }

        assert_eq!(provider.calls(), 0);
        assert_eq!(controller.snapshot(), RunState::default());
    }

    #[tokio::test]
    async fn test_full_run_completes() {
        let provider = ScriptedProvider::new(vec![
            Ok(ProviderResponse::text("research text")),
            Ok(ProviderResponse::text(SWOT)),
            Ok(ProviderResponse::text(ROADMAP)),
        ]);
        let controller = PipelineController::new(provider.clone());

        let outcome = controller.run_analysis("Acme").await.unwrap();
        let RunOutcome::Completed(state) = outcome else {
            panic!("expected completed run");
        };

        assert!(state.is_complete());
        assert_eq!(state.company_name, "Acme");
        assert_eq!(state.research.unwrap().text, "research text");
        assert_eq!(state.swot.unwrap().opportunities, vec!["b"]);
        assert_eq!(state.roadmap.unwrap().len(), 1);

        let prompts = provider.prompts.lock().unwrap().clone();
        assert!(prompts[1].ends_with("research text"));
        assert!(prompts[2].contains(r#""strengths":["a"]"#));
    }

    #[tokio::test]
    async fn test_swot_parse_failure_resets() {
        let provider = ScriptedProvider::new(vec![
            Ok(ProviderResponse::text("research text")),
            Ok(ProviderResponse::text(r#"{"strengths":[]}"#)),
        ]);
        let controller = PipelineController::new(provider.clone());

        let err = controller.run_analysis("Acme").await.unwrap_err();
        assert!(matches!(err, PipelineError::Parse(ref e) if e.stage == ParseStage::Swot));
        assert_eq!(controller.snapshot(), RunState::default());
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_second_run_needs_reset() {
        let provider = ScriptedProvider::new(vec![
            Ok(ProviderResponse::text("r")),
            Ok(ProviderResponse::text(SWOT)),
            Ok(ProviderResponse::text("[]")),
        ]);
        let controller = PipelineController::new(provider.clone());

        controller.run_analysis("Acme").await.unwrap();
        assert_eq!(controller.run_analysis("Acme").await, Err(PipelineError::Busy));
        assert_eq!(provider.calls(), 3);

        let fresh = controller.reset();
        assert!(fresh.is_idle());
        assert_eq!(fresh.epoch, 1);
    }
}
