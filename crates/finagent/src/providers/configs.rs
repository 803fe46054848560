use anyhow::{anyhow, Result};
use std::env;

pub const OPENAI_HOST_ENV: &str = "FINAGENT_OPENAI_HOST";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const MODEL_ENV: &str = "FINAGENT_MODEL";

pub const DEFAULT_OPENAI_HOST: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Configuration for an OpenAI-compatible chat completions endpoint.
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
            // the eval pipeline wants near-deterministic tool routing
            temperature: Some(0.1),
            max_tokens: None,
        }
    }

    /// Build a config from environment variables. The API key is
    /// required; host and model have defaults.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var(OPENAI_API_KEY_ENV)
            .map_err(|_| anyhow!("{} environment variable is not set", OPENAI_API_KEY_ENV))?;
        let host = env::var(OPENAI_HOST_ENV).unwrap_or_else(|_| DEFAULT_OPENAI_HOST.to_string());
        let model = env::var(MODEL_ENV).unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self::new(host, api_key, model))
    }
}
