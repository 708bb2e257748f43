//! Prompt templates and output schemas for the three pipeline stages.
//!
//! Every builder is a pure function of the previous stage's result and the
//! company name.

use serde_json::{json, Value};

use crate::analysis::SwotResult;
use crate::provider::ProviderRequest;

/// Prompt templates for the analysis pipeline
pub struct AnalysisPrompts;

impl AnalysisPrompts {
    /// Stage 1: grounded market research on the company.
    pub fn research(company_name: &str) -> ProviderRequest {
        ProviderRequest::new(format!(
            "Conduct detailed research on the company \"{company_name}\". Focus on their current \
             market position, recent product launches, financial health, and customer sentiment. \
             Provide a comprehensive summary."
        ))
        .with_web_search()
    }

    /// Stage 2: SWOT matrix from the research text.
    pub fn swot(research_text: &str) -> ProviderRequest {
        ProviderRequest::new(format!(
            "Based on the following research, generate a structured SWOT analysis:\n\n{research_text}"
        ))
        .with_schema(Self::swot_schema())
    }

    /// Stage 3: four-quarter roadmap from the SWOT matrix.
    pub fn roadmap(swot: &SwotResult, company_name: &str) -> ProviderRequest {
        // Serializing four string vectors cannot fail.
        let swot_json = serde_json::to_string(swot).unwrap_or_default();

        ProviderRequest::new(format!(
            "Based on the SWOT analysis for {company_name}, propose a 4-quarter product roadmap \
             that leverages strengths/opportunities and mitigates weaknesses/threats.\n\nSWOT: {swot_json}"
        ))
        .with_schema(Self::roadmap_schema())
    }

    pub fn swot_schema() -> Value {
        let string_array = json!({ "type": "ARRAY", "items": { "type": "STRING" } });
        json!({
            "type": "OBJECT",
            "properties": {
                "strengths": string_array,
                "weaknesses": string_array,
                "opportunities": string_array,
                "threats": string_array
            },
            "required": ["strengths", "weaknesses", "opportunities", "threats"]
        })
    }

    pub fn roadmap_schema() -> Value {
        json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "title": { "type": "STRING" },
                    "description": { "type": "STRING" },
                    "quarter": { "type": "STRING", "enum": ["Q1", "Q2", "Q3", "Q4"] },
                    "priority": { "type": "STRING", "enum": ["High", "Medium", "Low"] },
                    "category": { "type": "STRING" }
                },
                "required": ["title", "description", "quarter", "priority", "category"]
            }
        })
    }
}
