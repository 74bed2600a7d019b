//! Extraction-and-summarization pipeline
//!
//! `process` runs the two extraction stages, refuses to call the model on
//! blank text, and otherwise sends `[system prompt, extracted text]` to the
//! chat client exactly once.

use crate::chat::{ChatClient, ChatRequest, Message};
use crate::config::SummarizerConfig;
use crate::error::{Error, Result};
use crate::extract::{ExtractionResult, Extractor};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Successful pipeline output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryOutput {
    pub extracted_text: String,
    pub llm_response: String,
    pub used_fallback: bool,
}

/// Conversation sent to the model: the system prompt, then the document text
pub fn build_history(system_prompt: &str, text: &str) -> Vec<Message> {
    vec![Message::system(system_prompt), Message::user(text)]
}

/// Stateless pipeline; share it behind an `Arc` across requests
#[derive(Clone)]
pub struct Summarizer {
    extractor: Arc<Extractor>,
    chat: Arc<dyn ChatClient>,
    config: Arc<SummarizerConfig>,
}

impl Summarizer {
    pub fn new(extractor: Extractor, chat: Arc<dyn ChatClient>, config: SummarizerConfig) -> Self {
        Self {
            extractor: Arc::new(extractor),
            chat,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &SummarizerConfig {
        &self.config
    }

    /// Extract text without calling the model
    pub async fn extract(&self, data: Vec<u8>) -> ExtractionResult {
        self.extract_with_id(data, Uuid::new_v4()).await
    }

    async fn extract_with_id(&self, data: Vec<u8>, invocation: Uuid) -> ExtractionResult {
        let extractor = self.extractor.clone();

        // PDFium and tesseract are blocking
        tokio::task::spawn_blocking(move || extractor.extract(&data, invocation))
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(%invocation, error = %e, "Extraction task failed");
                ExtractionResult::default()
            })
    }

    /// Extract text and summarize it with the chat model
    pub async fn process(&self, data: Vec<u8>) -> Result<SummaryOutput> {
        let invocation = Uuid::new_v4();
        tracing::info!(%invocation, bytes = data.len(), "Processing PDF");

        let extraction = self.extract_with_id(data, invocation).await;
        if extraction.is_blank() {
            tracing::warn!(%invocation, "No text could be extracted");
            return Err(Error::ExtractionFailed);
        }

        tracing::info!(
            %invocation,
            chars = extraction.text.len(),
            used_fallback = extraction.used_fallback,
            "Text extracted"
        );

        let system_prompt = self.config.prompt.load().await?;
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: build_history(&system_prompt, &extraction.text),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let llm_response = self.chat.complete(&request).await.map_err(|e| {
            tracing::warn!(%invocation, error = %e, "Chat completion failed");
            e
        })?;

        Ok(SummaryOutput {
            extracted_text: extraction.text,
            llm_response,
            used_fallback: extraction.used_fallback,
        })
    }
}
