//! # Configuration Module
//!
//! Loads provider settings from the environment (and a `.env` file during
//! local development). Command-line flags may override individual values
//! afterwards; [`Config::validate`] runs last.

use anyhow::{Context, Result};
use std::env;

use crate::error::ConfigError;

pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_THINKING_BUDGET: u32 = 32768;
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

// =============================================================================
// CONFIGURATION STRUCT
// =============================================================================
#[derive(Clone)]
pub struct Config {
    /// Gemini API key (GEMINI_API_KEY, falling back to API_KEY)
    pub api_key: Option<String>,

    /// Model used for all three stages
    pub model: String,

    /// Generative Language API base URL
    pub api_base_url: String,

    /// Thinking token budget passed with every request
    pub thinking_budget: u32,

    /// Per-request timeout. Grounded research with a large thinking budget
    /// routinely takes minutes.
    pub timeout_secs: u64,
}

// Keep the key out of debug logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("thinking_budget", &self.thinking_budget)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            thinking_budget: DEFAULT_THINKING_BUDGET,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// =============================================================================
// CONFIGURATION LOADING
// =============================================================================
impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is fine.
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        config.api_key = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("API_KEY"))
            .filter(|key| !key.trim().is_empty());

        if let Some(val) = lookup("GEMINI_MODEL") {
            config.model = val;
        }

        if let Some(val) = lookup("GEMINI_API_BASE_URL") {
            config.api_base_url = val.trim_end_matches('/').to_string();
        }

        if let Some(val) = lookup("THINKING_BUDGET") {
            config.thinking_budget = val
                .parse()
                .context("THINKING_BUDGET must be a non-negative integer (e.g., 32768)")?;
        }

        if let Some(val) = lookup("REQUEST_TIMEOUT_SECS") {
            config.timeout_secs = val
                .parse()
                .context("REQUEST_TIMEOUT_SECS must be a positive integer")?;
        }

        Ok(config)
    }

    /// Validate the configuration before any request is made.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_none() {
            return Err(ConfigError::MissingApiKey);
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("GEMINI_MODEL cannot be empty".into()));
        }

        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid(format!(
                "GEMINI_API_BASE_URL must be an http(s) URL, got: {}",
                self.api_base_url
            )));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "REQUEST_TIMEOUT_SECS must be at least 1".into(),
            ));
        }

        Ok(())
    }
}
