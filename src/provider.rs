//! Analysis provider abstraction
//!
//! The pipeline talks to a generative model through [`AnalysisProvider`]:
//! one prompt in, generated text and optional citations out. The concrete
//! HTTP client lives in [`crate::gemini`]; tests substitute scripted
//! providers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProviderError;

/// Tools the provider may use while answering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderTools {
    /// Allow the model to ground its answer with a web search
    pub web_search: bool,
}

/// A single generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub prompt: String,
    /// JSON schema the reply must conform to. `None` means free text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
    pub tools: ProviderTools,
}

impl ProviderRequest {
    /// Create a free-text request with no tools
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            output_schema: None,
            tools: ProviderTools::default(),
        }
    }

    /// Constrain the reply to JSON matching `schema`
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }

    /// Enable web-search grounding
    pub fn with_web_search(mut self) -> Self {
        self.tools.web_search = true;
        self
    }
}

/// A citation attached to a grounded reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingReference {
    pub title: String,
    pub uri: String,
}

/// The provider's reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub text: String,
    #[serde(default)]
    pub grounding_references: Vec<GroundingReference>,
}

impl ProviderResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            grounding_references: Vec::new(),
        }
    }

    pub fn with_references(mut self, references: Vec<GroundingReference>) -> Self {
        self.grounding_references = references;
        self
    }
}

/// A request/response generation service.
///
/// Implementations must be shareable across tasks; the controller holds one
/// behind an `Arc` and awaits each call before issuing the next.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Generate a reply for `request`.
    async fn generate(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = ProviderRequest::new("hello")
            .with_web_search()
            .with_schema(serde_json::json!({"type": "object"}));

        assert_eq!(request.prompt, "hello");
        assert!(request.tools.web_search);
        assert!(request.output_schema.is_some());
    }

    #[test]
    fn test_plain_request_has_no_tools() {
        let request = ProviderRequest::new("hello");
        assert!(!request.tools.web_search);
        assert!(request.output_schema.is_none());

        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("output_schema"));
    }
}
