//! Gemini provider - Google Generative Language API
//!
//! Implements [`AnalysisProvider`] on top of the `generateContent` REST
//! endpoint, with optional Google Search grounding and JSON-schema
//! constrained output.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

use crate::config::{Config, DEFAULT_API_BASE_URL, DEFAULT_THINKING_BUDGET, DEFAULT_TIMEOUT_SECS};
use crate::error::ProviderError;
use crate::provider::{AnalysisProvider, GroundingReference, ProviderRequest, ProviderResponse};

/// Title used for a grounding chunk that carries none.
const UNTITLED_SOURCE: &str = "Source";

/// Gemini `generateContent` client
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    thinking_budget: u32,
}

impl GeminiProvider {
    /// Create a provider with default endpoint and timeout
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(DEFAULT_TIMEOUT_SECS)?,
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
            thinking_budget: DEFAULT_THINKING_BUDGET,
        })
    }

    /// Create a provider from validated configuration
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(ProviderError::Unauthorized)?;

        Ok(Self {
            client: build_client(config.timeout_secs)?,
            api_key,
            model: config.model.clone(),
            base_url: config.api_base_url.clone(),
            thinking_budget: config.thinking_budget,
        })
    }

    /// Point at a different endpoint (proxies, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Replace the HTTP timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Result<Self, ProviderError> {
        self.client = build_client(timeout_secs)?;
        Ok(self)
    }

    pub fn with_thinking_budget(mut self, budget: u32) -> Self {
        self.thinking_budget = budget;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Translate a provider request into Gemini's wire format
    fn to_gemini_request(&self, request: &ProviderRequest) -> GeminiRequest {
        let tools = if request.tools.web_search {
            vec![GeminiTool {
                google_search: serde_json::json!({}),
            }]
        } else {
            Vec::new()
        };

        let (response_mime_type, response_schema) = match &request.output_schema {
            Some(schema) => (Some("application/json".to_string()), Some(schema.clone())),
            None => (None, None),
        };

        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: Some(request.prompt.clone()),
                    thought: None,
                }],
            }],
            tools,
            generation_config: GeminiGenerationConfig {
                response_mime_type,
                response_schema,
                thinking_config: GeminiThinkingConfig {
                    thinking_budget: self.thinking_budget,
                },
            },
        }
    }
}

fn build_client(timeout_secs: u64) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ProviderError::Network(format!("failed to build HTTP client: {e}")))
}

/// Convert a Gemini response into text plus citations.
fn from_gemini_response(response: GeminiResponse) -> Result<ProviderResponse, ProviderError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::InvalidResponse("No candidates in response".to_string()))?;

    let text = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter(|part| !part.thought.unwrap_or(false))
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    let grounding_references = candidate
        .grounding_metadata
        .map(|metadata| {
            metadata
                .grounding_chunks
                .into_iter()
                .filter_map(|chunk| chunk.web)
                .map(|web| GroundingReference {
                    title: web
                        .title
                        .filter(|t| !t.is_empty())
                        .unwrap_or_else(|| UNTITLED_SOURCE.to_string()),
                    uri: web.uri.unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(ProviderResponse {
        text,
        grounding_references,
    })
}

#[async_trait]
impl AnalysisProvider for GeminiProvider {
    async fn generate(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let url = self.endpoint();
        let body = self.to_gemini_request(&request);

        debug!(
            model = %self.model,
            web_search = request.tools.web_search,
            structured = request.output_schema.is_some(),
            "Sending request to Gemini"
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, "Gemini API error: {}", text);
            return Err(ProviderError::from_status(status.as_u16(), text));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        from_gemini_response(gemini_response)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    /// Set on thought-summary parts, which are not part of the answer
    #[serde(skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    google_search: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    thinking_config: GeminiThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    grounding_metadata: Option<GeminiGroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GeminiGroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GeminiGroundingChunk {
    web: Option<GeminiWebChunk>,
}

#[derive(Debug, Deserialize)]
struct GeminiWebChunk {
    uri: Option<String>,
    title: Option<String>,
}
