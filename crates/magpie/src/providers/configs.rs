use anyhow::{Context, Result};
use std::env;

/// Default completion host; any OpenAI-compatible endpoint works.
pub const OPENROUTER_HOST: &str = "https://openrouter.ai/api";

/// Default model when MAGPIE_MODEL is unset.
pub const DEFAULT_MODEL: &str = "z-ai/glm-4.5-air";

#[derive(Debug, Clone)]
pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

impl OpenAiProviderConfig {
    pub fn new(host: String, api_key: String, model: String) -> Self {
        Self {
            host,
            api_key,
            model,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Read the connection settings from the environment. Only the API key
    /// is required; host and model fall back to the OpenRouter defaults.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("MAGPIE_API_KEY").context("MAGPIE_API_KEY must be set")?;
        let host = env::var("MAGPIE_HOST").unwrap_or_else(|_| OPENROUTER_HOST.to_string());
        let model = env::var("MAGPIE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self::new(host, api_key, model))
    }
}
