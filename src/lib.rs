//! # StrategyFlow
//!
//! Agentic strategy analysis for a single company, in three dependent
//! stages:
//!
//! 1. **Research** - grounded web research on the company's market position
//! 2. **SWOT** - a strengths/weaknesses/opportunities/threats matrix built
//!    from the research
//! 3. **Roadmap** - a four-quarter product roadmap built from the SWOT
//!
//! [`controller::PipelineController`] runs the stages against any
//! [`provider::AnalysisProvider`]; [`gemini::GeminiProvider`] is the
//! production implementation. [`render`] turns the resulting
//! [`state::RunState`] into terminal output or a Markdown report.
//!
//! ```ignore
//! use std::sync::Arc;
//! use strategy_flow::{Config, GeminiProvider, PipelineController};
//!
//! let config = Config::from_env()?;
//! let provider = GeminiProvider::from_config(&config)?;
//! let controller = PipelineController::new(Arc::new(provider));
//! let outcome = controller.run_analysis("Stripe").await?;
//! ```

pub mod analysis;
pub mod config;
pub mod controller;
pub mod error;
pub mod gemini;
pub mod prompts;
pub mod provider;
pub mod render;
pub mod state;

pub use analysis::{Priority, Quarter, ResearchResult, RoadmapItem, RoadmapResult, Source, SwotResult};
pub use config::Config;
pub use controller::{PipelineController, RunOutcome};
pub use error::{ConfigError, ParseError, PipelineError, ProviderError};
pub use gemini::GeminiProvider;
pub use provider::{AnalysisProvider, GroundingReference, ProviderRequest, ProviderResponse};
pub use state::{PipelinePhase, RunState};
