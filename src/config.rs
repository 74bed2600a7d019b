//! Pipeline configuration

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Default location of the system prompt, relative to the working directory
pub const DEFAULT_PROMPT_PATH: &str = "./sys_prompt.txt";

/// Where the system prompt comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSource {
    /// Plain-text file, re-read on every invocation
    File(PathBuf),
    /// Fixed prompt text
    Inline(String),
}

impl Default for PromptSource {
    fn default() -> Self {
        PromptSource::File(PathBuf::from(DEFAULT_PROMPT_PATH))
    }
}

impl PromptSource {
    /// Load the prompt, trimmed of surrounding whitespace
    pub async fn load(&self) -> Result<String> {
        match self {
            PromptSource::File(path) => tokio::fs::read_to_string(path)
                .await
                .map(|p| p.trim().to_string())
                .map_err(|source| Error::PromptLoad {
                    path: path.clone(),
                    source,
                }),
            PromptSource::Inline(text) => Ok(text.trim().to_string()),
        }
    }
}

/// Model and sampling settings plus the prompt for the summarization pipeline
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// Chat model identifier (default: gpt-4o-mini)
    pub model: String,
    /// Sampling temperature (default: 0.8)
    pub temperature: f32,
    /// Generation length cap in tokens (default: 4096)
    pub max_tokens: u32,
    /// System prompt source (default: ./sys_prompt.txt)
    pub prompt: PromptSource,
    /// Timeout for the chat request (default: 120s)
    pub request_timeout: Duration,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.8,
            max_tokens: 4096,
            prompt: PromptSource::default(),
            request_timeout: Duration::from_secs(120),
        }
    }
}
