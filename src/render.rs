//! Presentation of a [`RunState`].
//!
//! Everything here is derived from a state snapshot: a colored terminal view
//! and a Markdown report. Stored results are never modified; truncation and
//! sanitizing only affect the rendered text.

use std::borrow::Cow;
use std::fmt::Write as _;

use colored::{ColoredString, Colorize};

use crate::analysis::{Quarter, RoadmapResult, Source, SwotResult};
use crate::state::{PipelinePhase, RunState};

/// Source title width in the research view
pub const RESEARCH_TITLE_LIMIT: usize = 30;

/// Source title width in the Markdown report
pub const REPORT_TITLE_LIMIT: usize = 35;

const ROADMAP_BLURB: &str = "Strategic initiatives derived from the competitive analysis and \
                             market research conducted by the agent.";

/// Shorten `title` to `limit` characters, marking the cut with `...`.
pub fn truncate_title(title: &str, limit: usize) -> Cow<'_, str> {
    match title.char_indices().nth(limit) {
        Some((cut, _)) => Cow::Owned(format!("{}...", &title[..cut])),
        None => Cow::Borrowed(title),
    }
}

/// Strip terminal escape sequences and control characters from model text.
///
/// Newlines and tabs survive; everything else below U+0020 (and DEL, and the
/// C1 range) is dropped, along with whole ESC sequences.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\u{1b}' => match chars.next() {
                // CSI: parameters then a final byte in @..~
                Some('[') => {
                    for c in chars.by_ref() {
                        if ('@'..='~').contains(&c) {
                            break;
                        }
                    }
                }
                // OSC: terminated by BEL or ESC \
                Some(']') => {
                    while let Some(c) = chars.next() {
                        if c == '\u{7}' {
                            break;
                        }
                        if c == '\u{1b}' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            },
            '\n' | '\t' => out.push(c),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }

    out
}

// =============================================================================
// PROGRESS
// =============================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Active,
    Completed,
}

/// The three progress steps shown while a run is underway.
pub fn progress_steps(state: &RunState) -> [(&'static str, StepStatus); 3] {
    fn status(active: bool, completed: bool) -> StepStatus {
        if completed {
            StepStatus::Completed
        } else if active {
            StepStatus::Active
        } else {
            StepStatus::Pending
        }
    }

    [
        ("Research", status(state.is_searching, state.research.is_some())),
        ("SWOT Analysis", status(state.is_analyzing, state.swot.is_some())),
        ("Roadmap", status(state.is_generating, state.roadmap.is_some())),
    ]
}

// =============================================================================
// TERMINAL VIEW
// =============================================================================
/// Renders a run for the terminal.
#[derive(Debug, Clone, Copy)]
pub struct TerminalRenderer {
    color: bool,
}

impl TerminalRenderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, text: &str, style: impl FnOnce(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn section(&self, out: &mut String, title: &str) {
        let separator = "═".repeat(60);
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", self.paint(&separator, |s| s.white()));
        let _ = writeln!(out, " {}", self.paint(title, |s| s.white().bold()));
        let _ = writeln!(out, "{}", self.paint(&separator, |s| s.white()));
        let _ = writeln!(out);
    }

    /// One line summarizing the three steps
    pub fn progress_line(&self, state: &RunState) -> String {
        progress_steps(state)
            .iter()
            .map(|(title, status)| match status {
                StepStatus::Completed => self.paint(&format!("✓ {title}"), |s| s.green()),
                StepStatus::Active => self.paint(&format!("● {title}"), |s| s.cyan().bold()),
                StepStatus::Pending => self.paint(&format!("○ {title}"), |s| s.dimmed()),
            })
            .collect::<Vec<_>>()
            .join("  ──  ")
    }

    pub fn render(&self, state: &RunState) -> String {
        let mut out = String::new();

        if state.phase == PipelinePhase::Input {
            return out;
        }

        let _ = writeln!(out, "{}", self.progress_line(state));

        if let Some(research) = &state.research {
            self.section(&mut out, &format!("Market Research: {}", sanitize(&state.company_name)));
            let _ = writeln!(out, "{}", sanitize(&research.text));
            self.sources(&mut out, &research.sources);
        }

        if let Some(swot) = &state.swot {
            self.section(&mut out, "SWOT Analysis Matrix");
            self.swot(&mut out, swot);
        }

        if let Some(roadmap) = &state.roadmap {
            self.section(&mut out, "12-Month Product Roadmap");
            let _ = writeln!(out, "{}", self.paint(ROADMAP_BLURB, |s| s.dimmed()));
            self.roadmap(&mut out, roadmap);
        }

        if let Some(message) = state.status_message() {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", self.paint(message, |s| s.cyan()));
        }

        out
    }

    fn sources(&self, out: &mut String, sources: &[Source]) {
        if sources.is_empty() {
            return;
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", self.paint("VERIFIED SOURCES", |s| s.bold().dimmed()));
        for source in sources {
            let title = truncate_title(&source.title, RESEARCH_TITLE_LIMIT);
            let _ = writeln!(
                out,
                "  ↗ {}  {}",
                self.paint(&sanitize(&title), |s| s.blue()),
                self.paint(&sanitize(&source.uri), |s| s.dimmed())
            );
        }
    }

    fn swot(&self, out: &mut String, swot: &SwotResult) {
        for (heading, items) in swot.quadrants() {
            let styled = self.paint(heading, |s| match heading {
                "Strengths" => s.green().bold(),
                "Weaknesses" => s.red().bold(),
                "Opportunities" => s.blue().bold(),
                _ => s.yellow().bold(),
            });
            let _ = writeln!(out, "{styled}");
            for item in items {
                let _ = writeln!(out, "  • {}", sanitize(item));
            }
            let _ = writeln!(out);
        }
    }

    fn roadmap(&self, out: &mut String, roadmap: &RoadmapResult) {
        for quarter in Quarter::ALL {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", self.paint(quarter.as_str(), |s| s.magenta().bold()));

            let mut any = false;
            for item in roadmap.in_quarter(quarter) {
                any = true;
                let _ = writeln!(
                    out,
                    "  ▸ {} [{} · {}]",
                    self.paint(&sanitize(&item.title), |s| s.bold()),
                    item.priority,
                    sanitize(&item.category)
                );
                let _ = writeln!(out, "    {}", sanitize(&item.description));
            }
            if !any {
                let _ = writeln!(out, "  {}", self.paint("(no initiatives)", |s| s.dimmed()));
            }
        }
    }
}

// =============================================================================
// MARKDOWN REPORT
// =============================================================================
fn escape_link_text(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

/// The finished analysis as a Markdown document.
pub fn render_markdown(state: &RunState) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Strategy Report: {}", sanitize(&state.company_name));

    if let Some(research) = &state.research {
        let _ = writeln!(out, "\n## Market Research\n");
        let _ = writeln!(out, "{}", sanitize(&research.text).trim_end());

        if !research.sources.is_empty() {
            let _ = writeln!(out, "\n### Verified Sources\n");
            for source in &research.sources {
                let title = truncate_title(&source.title, REPORT_TITLE_LIMIT);
                let _ = writeln!(
                    out,
                    "- [{}]({})",
                    escape_link_text(&sanitize(&title)),
                    sanitize(&source.uri)
                );
            }
        }
    }

    if let Some(swot) = &state.swot {
        let _ = writeln!(out, "\n## SWOT Analysis Matrix");
        for (heading, items) in swot.quadrants() {
            let _ = writeln!(out, "\n### {heading}\n");
            if items.is_empty() {
                let _ = writeln!(out, "_None identified._");
            }
            for item in items {
                let _ = writeln!(out, "- {}", sanitize(item));
            }
        }
    }

    if let Some(roadmap) = &state.roadmap {
        let _ = writeln!(out, "\n## 12-Month Product Roadmap\n");
        let _ = writeln!(out, "{ROADMAP_BLURB}");
        for quarter in Quarter::ALL {
            let _ = writeln!(out, "\n### {quarter}\n");
            let mut any = false;
            for item in roadmap.in_quarter(quarter) {
                any = true;
                let _ = writeln!(
                    out,
                    "- **{}** ({} priority, {}): {}",
                    sanitize(&item.title),
                    item.priority,
                    sanitize(&item.category),
                    sanitize(&item.description)
                );
            }
            if !any {
                let _ = writeln!(out, "_No initiatives._");
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Priority, ResearchResult, RoadmapItem};

    fn item(title: &str, quarter: Quarter) -> RoadmapItem {
        RoadmapItem {
            title: title.into(),
            description: format!("{title} description"),
            quarter,
            priority: Priority::Medium,
            category: "Growth".into(),
        }
    }

    fn finished_state() -> RunState {
        RunState {
            company_name: "Acme".into(),
            phase: PipelinePhase::Roadmap,
            research: Some(ResearchResult {
                text: "Acme is \u{1b}[31mred\u{1b}[0m hot.".into(),
                sources: vec![Source {
                    title: "A very long article title about Acme Corporation".into(),
                    uri: "https://news.example/acme".into(),
                }],
            }),
            swot: Some(SwotResult {
                strengths: vec!["brand".into()],
                weaknesses: vec![],
                opportunities: vec!["export".into()],
                threats: vec!["rivals".into()],
            }),
            roadmap: Some(RoadmapResult {
                items: vec![item("Second", Quarter::Q3), item("First", Quarter::Q1), item("Third", Quarter::Q3)],
            }),
            ..RunState::default()
        }
    }

    #[test]
    fn test_truncate_title() {
        let long = "abcdefghijklmnopqrstuvwxyz0123456789";
        assert_eq!(truncate_title(long, 30), "abcdefghijklmnopqrstuvwxyz0123...");
        assert_eq!(truncate_title(long, 35), "abcdefghijklmnopqrstuvwxyz012345678...");
        assert_eq!(truncate_title("short", 30), "short");
        assert_eq!(truncate_title(&"x".repeat(30), 30), "x".repeat(30));
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        let title = "é".repeat(31);
        assert_eq!(truncate_title(&title, 30), format!("{}...", "é".repeat(30)));
    }

    #[test]
    fn test_rendering_leaves_stored_title_alone() {
        let state = finished_state();
        let before = state.clone();

        let view = TerminalRenderer::new(false).render(&state);
        assert!(view.contains("A very long article title abou..."));
        assert_eq!(state, before);
    }

    #[test]
    fn test_sanitize_strips_escapes() {
        assert_eq!(sanitize("a\u{1b}[1;31mb\u{1b}[0mc"), "abc");
        assert_eq!(sanitize("x\u{1b}]0;title\u{7}y"), "xy");
        assert_eq!(sanitize("x\u{1b}]8;;http://e\u{1b}\\y"), "xy");
        assert_eq!(sanitize("line\r\nnext\tcol\u{0}"), "line\nnext\tcol");
    }

    #[test]
    fn test_progress_steps() {
        let state = RunState {
            phase: PipelinePhase::Swot,
            research: Some(ResearchResult::default()),
            is_analyzing: true,
            ..RunState::default()
        };
        let steps = progress_steps(&state);
        assert_eq!(steps[0].1, StepStatus::Completed);
        assert_eq!(steps[1].1, StepStatus::Active);
        assert_eq!(steps[2].1, StepStatus::Pending);
    }

    #[test]
    fn test_terminal_view_orders_sections() {
        let view = TerminalRenderer::new(false).render(&finished_state());

        assert!(view.contains("Market Research: Acme"));
        assert!(view.contains("Acme is red hot."));
        let strengths = view.find("Strengths").unwrap();
        let weaknesses = view.find("Weaknesses").unwrap();
        let opportunities = view.find("Opportunities").unwrap();
        let threats = view.find("Threats").unwrap();
        assert!(strengths < weaknesses && weaknesses < opportunities && opportunities < threats);

        let first = view.find("First").unwrap();
        let second = view.find("Second").unwrap();
        let third = view.find("Third").unwrap();
        assert!(first < second && second < third);
        assert!(view.contains("(no initiatives)"));
    }

    #[test]
    fn test_input_phase_renders_nothing() {
        assert!(TerminalRenderer::new(false).render(&RunState::default()).is_empty());
    }

    #[test]
    fn test_markdown_report() {
        let report = render_markdown(&finished_state());

        assert!(report.starts_with("# Strategy Report: Acme\n"));
        assert!(report.contains("- [A very long article title about Acm...](https://news.example/acme)"));
        assert!(report.contains("### Weaknesses\n\n_None identified._"));
        assert!(report.contains("### Q2\n\n_No initiatives._"));
        assert!(report.contains("- **First** (Medium priority, Growth): First description"));
        assert!(!report.contains('\u{1b}'));
    }
}
