//! # Analysis Results
//!
//! The three products of a pipeline run: market research with its cited
//! sources, a SWOT matrix, and a quarterly product roadmap.
//!
//! The SWOT and roadmap stages come back from the provider as JSON text.
//! They are validated here against typed structures so that a reply with a
//! missing key or an out-of-range enum value becomes a [`ParseError`]
//! instead of flowing on half-formed.

use serde::{Deserialize, Serialize};

use crate::error::{ParseError, ParseStage};
use crate::provider::GroundingReference;

// =============================================================================
// RESEARCH
// =============================================================================
/// A cited web source backing the research text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

/// Output of the research stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchResult {
    /// Free-form research summary
    pub text: String,
    /// Citations in the order the provider returned them
    pub sources: Vec<Source>,
}

impl ResearchResult {
    /// Build a research result from provider output.
    ///
    /// References without a URI cannot be linked to and are dropped.
    pub fn from_grounded(text: impl Into<String>, references: &[GroundingReference]) -> Self {
        let sources = references
            .iter()
            .filter(|r| !r.uri.is_empty())
            .map(|r| Source {
                title: r.title.clone(),
                uri: r.uri.clone(),
            })
            .collect();

        Self {
            text: text.into(),
            sources,
        }
    }
}

// =============================================================================
// SWOT
// =============================================================================
/// The four-quadrant SWOT matrix. Every quadrant must be present in the
/// provider reply, though any of them may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwotResult {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub opportunities: Vec<String>,
    pub threats: Vec<String>,
}

impl SwotResult {
    /// Parse the SWOT stage reply. An empty reply is treated as `{}`.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let body = if text.trim().is_empty() { "{}" } else { text };
        serde_json::from_str(body).map_err(|e| ParseError::new(ParseStage::Swot, e.to_string()))
    }

    /// Quadrants in display order, paired with their headings.
    pub fn quadrants(&self) -> [(&'static str, &[String]); 4] {
        [
            ("Strengths", self.strengths.as_slice()),
            ("Weaknesses", self.weaknesses.as_slice()),
            ("Opportunities", self.opportunities.as_slice()),
            ("Threats", self.threats.as_slice()),
        ]
    }
}

// =============================================================================
// ROADMAP
// =============================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quarter::Q1 => "Q1",
            Quarter::Q2 => "Q2",
            Quarter::Q3 => "Q3",
            Quarter::Q4 => "Q4",
        }
    }
}

impl std::fmt::Display for Quarter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single roadmap initiative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapItem {
    pub title: String,
    pub description: String,
    pub quarter: Quarter,
    pub priority: Priority,
    pub category: String,
}

/// Roadmap initiatives in generation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoadmapResult {
    pub items: Vec<RoadmapItem>,
}

impl RoadmapResult {
    /// Parse the roadmap stage reply. An empty reply is treated as `[]`.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let body = if text.trim().is_empty() { "[]" } else { text };
        serde_json::from_str(body)
            .map_err(|e| ParseError::new(ParseStage::Roadmap, e.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Items scheduled for `quarter`, keeping generation order.
    pub fn in_quarter(&self, quarter: Quarter) -> impl Iterator<Item = &RoadmapItem> {
        self.items.iter().filter(move |item| item.quarter == quarter)
    }
}
