//! # Error Module
//!
//! Typed errors for the analysis pipeline.
//!
//! The pipeline distinguishes three kinds of failure internally
//! (validation, provider, parse) but presents a single generic notice to the
//! user. Keeping the kinds typed lets logs and tests tell them apart.

use thiserror::Error;

/// The one message shown to the user whatever went wrong.
pub const USER_NOTICE: &str =
    "Failed to complete analysis. Please check your API key and try again.";

// =============================================================================
// PROVIDER ERRORS
// =============================================================================
/// Failures of a single request to the analysis provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unauthorized - check API key")]
    Unauthorized,

    #[error("Rate limited - quota exhausted or too many requests")]
    RateLimited,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("HTTP error ({0}): {1}")]
    HttpError(u16, String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Map a non-success HTTP status and its body to a typed error.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => ProviderError::Unauthorized,
            429 => ProviderError::RateLimited,
            400 => ProviderError::BadRequest(body),
            500..=599 => ProviderError::ServerError(status, body),
            _ => ProviderError::HttpError(status, body),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if e.is_connect() {
            ProviderError::Connection(e.to_string())
        } else if e.is_decode() {
            ProviderError::InvalidResponse(e.to_string())
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

// =============================================================================
// PARSE ERRORS
// =============================================================================
/// Which structured stage produced an unparseable reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    Swot,
    Roadmap,
}

impl std::fmt::Display for ParseStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseStage::Swot => write!(f, "SWOT"),
            ParseStage::Roadmap => write!(f, "roadmap"),
        }
    }
}

/// The provider replied, but the reply does not match the expected schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed {stage} response: {message}")]
pub struct ParseError {
    pub stage: ParseStage,
    pub message: String,
}

impl ParseError {
    pub fn new(stage: ParseStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

// =============================================================================
// PIPELINE ERRORS
// =============================================================================
/// Top-level error returned by [`crate::controller::PipelineController::run_analysis`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("An analysis is already in progress or has not been reset")]
    Busy,
}

impl PipelineError {
    /// The notice shown to the user. Identical for every kind.
    pub fn user_notice(&self) -> &'static str {
        USER_NOTICE
    }
}

// =============================================================================
// CONFIGURATION ERRORS
// =============================================================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY (or API_KEY) is not set")]
    MissingApiKey,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ProviderError::from_status(401, String::new()), ProviderError::Unauthorized);
        assert_eq!(ProviderError::from_status(403, String::new()), ProviderError::Unauthorized);
        assert_eq!(ProviderError::from_status(429, String::new()), ProviderError::RateLimited);
        assert!(matches!(
            ProviderError::from_status(400, "bad".into()),
            ProviderError::BadRequest(body) if body == "bad"
        ));
        assert!(matches!(
            ProviderError::from_status(503, String::new()),
            ProviderError::ServerError(503, _)
        ));
        assert!(matches!(
            ProviderError::from_status(404, String::new()),
            ProviderError::HttpError(404, _)
        ));
    }

    #[test]
    fn test_every_kind_shares_one_notice() {
        let errors = [
            PipelineError::Validation("empty".into()),
            PipelineError::Provider(ProviderError::Timeout),
            PipelineError::Parse(ParseError::new(ParseStage::Swot, "missing key")),
            PipelineError::Busy,
        ];
        for err in errors {
            assert_eq!(err.user_notice(), USER_NOTICE);
        }
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new(ParseStage::Roadmap, "expected array");
        assert_eq!(err.to_string(), "Malformed roadmap response: expected array");
    }
}
