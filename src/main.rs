//! # StrategyFlow CLI
//!
//! Research a company, derive a SWOT matrix from the research, and turn the
//! SWOT into a four-quarter product roadmap.
//!
//! ## Quick Start
//! ```bash
//! export GEMINI_API_KEY=...
//! cargo run -- "Stripe"
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use strategy_flow::render::{render_markdown, TerminalRenderer};
use strategy_flow::{Config, GeminiProvider, PipelineController, RunOutcome, RunState};

// =============================================================================
// CLI ARGUMENTS
// =============================================================================
#[derive(Parser, Debug)]
#[command(
    name = "strategy-flow",
    version,
    about = "Transform insight into strategy: company research, SWOT analysis and product roadmap",
    long_about = r#"
StrategyFlow - agentic SWOT analysis and roadmap generation.

Given a company name it will:
  1. Research the company with Google Search grounding
  2. Synthesize a SWOT matrix from the research
  3. Propose a 12-month product roadmap from the SWOT

PREREQUISITES:
  Set GEMINI_API_KEY (or API_KEY) in the environment or a .env file.

EXAMPLES:
  strategy-flow "Stripe"
  strategy-flow --json "OpenAI" > openai.json
  strategy-flow --output tesla.md "Tesla"
"#
)]
struct Args {
    /// The company to analyze
    #[arg(value_name = "COMPANY")]
    company: String,

    /// The Gemini model to use (overrides GEMINI_MODEL env var)
    #[arg(short = 'm', long = "model", env = "GEMINI_MODEL")]
    model: Option<String>,

    /// Print the final run state as JSON instead of the formatted report
    #[arg(long = "json", default_value = "false")]
    json: bool,

    /// Also write the report as Markdown to this file
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Disable colored output
    #[arg(long = "no-color", default_value = "false")]
    no_color: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long = "verbose", default_value = "false")]
    verbose: bool,
}

// =============================================================================
// MAIN FUNCTION
// =============================================================================
#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    init_logging(args.verbose)?;

    if args.no_color {
        colored::control::set_override(false);
    }

    let mut config = Config::from_env()?;
    if let Some(model) = args.model.clone() {
        info!(model = %model, "Using model from command line");
        config.model = model;
    }
    config.validate()?;

    info!(model = %config.model, base_url = %config.api_base_url, "Configuration loaded");

    let provider = GeminiProvider::from_config(&config).context("Failed to create Gemini client")?;
    let controller = Arc::new(PipelineController::new(Arc::new(provider)));

    let spinner = start_spinner(&controller, !args.no_color);

    let result = tokio::select! {
        result = controller.run_analysis(&args.company) => result,
        _ = tokio::signal::ctrl_c() => {
            controller.reset();
            spinner.abandon_with_message("Analysis cancelled");
            warn!("Analysis cancelled by user");
            return Ok(ExitCode::from(130));
        }
    };

    spinner.finish_and_clear();

    match result {
        Ok(RunOutcome::Completed(state)) => {
            print_report(&args, &state)?;
            info!("Analysis completed successfully");
            Ok(ExitCode::SUCCESS)
        }
        Ok(RunOutcome::Discarded) => {
            warn!("Analysis was reset before it finished");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => {
            error!(error = %e, "Analysis failed");
            eprintln!("\n❌ {}", e.user_notice());
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Spinner that follows the controller's in-flight phase.
fn start_spinner(controller: &PipelineController, color: bool) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        spinner.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
    }
    spinner.enable_steady_tick(Duration::from_millis(120));

    let renderer = TerminalRenderer::new(color);
    let mut updates = controller.watch();
    let handle = spinner.clone();

    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            if let Some(message) = state.status_message() {
                handle.set_message(format!("{}\n{}", renderer.progress_line(&state), message));
            }
        }
    });

    spinner
}

fn print_report(args: &Args, state: &RunState) -> Result<()> {
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(state).context("Failed to serialize run state")?
        );
    } else {
        println!("{}", TerminalRenderer::new(!args.no_color).render(state));
    }

    if let Some(path) = &args.output {
        std::fs::write(path, render_markdown(state))
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "Report written");
    }

    Ok(())
}

// =============================================================================
// LOGGING INITIALIZATION
// =============================================================================
/// Logs go to stderr so `--json` output stays machine-readable.
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}
