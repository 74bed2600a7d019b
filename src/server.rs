//! MCP server exposing the pipeline as tools over stdio

use crate::error::Error;
use crate::pipeline::Summarizer;
use crate::source::{resolve_base64, resolve_path, resolve_url, ResolvedPdf};
use anyhow::Result;
use rmcp::{
    handler::server::tool::ToolRouter, handler::server::wrapper::Parameters, model::*,
    schemars::JsonSchema, tool, tool_handler, tool_router, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// PDF source specification
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum PdfSource {
    /// File path (absolute or relative)
    Path {
        /// Path to the PDF file
        path: String,
    },
    /// Base64 encoded PDF data
    Base64 {
        /// Base64 encoded PDF content
        base64: String,
    },
    /// URL to download PDF from
    Url {
        /// URL of the PDF file
        url: String,
    },
}

impl<'de> serde::Deserialize<'de> for PdfSource {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let obj = value.as_object().ok_or_else(|| {
            serde::de::Error::custom(
                "Invalid source: expected an object with one of \"path\", \"base64\", or \"url\"",
            )
        })?;

        for key in ["path", "base64", "url"] {
            let Some(v) = obj.get(key) else {
                continue;
            };
            let s = v
                .as_str()
                .ok_or_else(|| serde::de::Error::custom(format!("\"{}\" must be a string", key)))?
                .to_string();
            return Ok(match key {
                "path" => PdfSource::Path { path: s },
                "base64" => PdfSource::Base64 { base64: s },
                _ => PdfSource::Url { url: s },
            });
        }

        let keys: Vec<&String> = obj.keys().collect();
        Err(serde::de::Error::custom(format!(
            "Invalid source: expected one of \"path\", \"base64\", or \"url\", but got keys: {:?}",
            keys
        )))
    }
}

/// Security and resource configuration for the MCP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directories path sources must live in (empty: no restriction)
    pub resource_dirs: Vec<String>,
    /// Allow URLs that resolve to private/reserved IPs (default: false)
    pub allow_private_urls: bool,
    /// Maximum download size in bytes for URL sources (default: 100MB)
    pub max_download_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            resource_dirs: Vec::new(),
            allow_private_urls: false,
            max_download_bytes: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// PDF summarization MCP server
#[derive(Clone)]
pub struct SummaryServer {
    summarizer: Summarizer,
    tool_router: ToolRouter<Self>,
    config: Arc<ServerConfig>,
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SummarizePdfParams {
    /// PDF to summarize
    pub source: PdfSource,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummarizePdfResult {
    pub source: String,
    /// Text sent to the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    /// The model's reply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_response: Option<String>,
    /// Whether OCR was needed
    pub used_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExtractTextParams {
    /// PDF to extract text from
    pub source: PdfSource,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractTextResult {
    pub source: String,
    pub extracted_text: String,
    /// Whether OCR was needed
    pub used_fallback: bool,
    pub page_count: usize,
    /// Pages whose text could not be read
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_pages: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Tools
// ============================================================================

#[tool_router]
impl SummaryServer {
    pub fn new(summarizer: Summarizer) -> Self {
        Self::with_config(summarizer, ServerConfig::default())
    }

    /// Create a server with full configuration
    pub fn with_config(summarizer: Summarizer, config: ServerConfig) -> Self {
        Self {
            summarizer,
            tool_router: Self::tool_router(),
            config: Arc::new(config),
        }
    }

    /// Extract text from a PDF and summarize it
    #[tool(
        description = "Extract text from a PDF (falling back to OCR for scanned pages) and summarize it with the configured language model.

Source format: one of {\"path\": \"/absolute/path.pdf\"}, {\"url\": \"https://...\"}, or {\"base64\": \"...\"}"
    )]
    async fn summarize_pdf(&self, Parameters(params): Parameters<SummarizePdfParams>) -> String {
        let result = self
            .process_summarize(&params.source)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "summarize_pdf failed");
                SummarizePdfResult {
                    source: Self::source_name(&params.source),
                    extracted_text: None,
                    llm_response: None,
                    used_fallback: false,
                    error: Some(e.client_message()),
                }
            });

        serde_json::to_string_pretty(&result).unwrap_or_default()
    }

    /// Extract text only
    #[tool(
        description = "Extract text from a PDF without calling the language model. Uses the embedded text layer, or OCR when the PDF has none.

Source format: one of {\"path\": \"/absolute/path.pdf\"}, {\"url\": \"https://...\"}, or {\"base64\": \"...\"}"
    )]
    async fn extract_text(&self, Parameters(params): Parameters<ExtractTextParams>) -> String {
        let result = self
            .process_extract_text(&params.source)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "extract_text failed");
                ExtractTextResult {
                    source: Self::source_name(&params.source),
                    extracted_text: String::new(),
                    used_fallback: false,
                    page_count: 0,
                    failed_pages: Vec::new(),
                    error: Some(e.client_message()),
                }
            });

        serde_json::to_string_pretty(&result).unwrap_or_default()
    }
}

impl SummaryServer {
    fn source_name(source: &PdfSource) -> String {
        match source {
            PdfSource::Path { path } => path.clone(),
            PdfSource::Base64 { .. } => "<base64>".to_string(),
            PdfSource::Url { url } => url.clone(),
        }
    }

    async fn resolve_source(&self, source: &PdfSource) -> crate::error::Result<ResolvedPdf> {
        match source {
            PdfSource::Path { path } => {
                let path = self.validate_path_access(path)?;
                resolve_path(path)
            }
            PdfSource::Base64 { base64 } => resolve_base64(base64),
            PdfSource::Url { url } => {
                resolve_url(
                    url,
                    self.config.allow_private_urls,
                    self.config.max_download_bytes,
                )
                .await
            }
        }
    }

    /// Validate that a path is within allowed resource directories.
    /// If no resource_dirs are configured, all paths are allowed.
    fn validate_path_access(&self, path: &str) -> crate::error::Result<std::path::PathBuf> {
        if self.config.resource_dirs.is_empty() {
            return Ok(std::path::PathBuf::from(path));
        }

        let denied = || Error::PathAccessDenied {
            path: path.to_string(),
        };
        let canonical = std::fs::canonicalize(path).map_err(|_| denied())?;

        let allowed = self.config.resource_dirs.iter().any(|dir| {
            std::fs::canonicalize(dir)
                .map(|d| canonical.starts_with(d))
                .unwrap_or(false)
        });

        if allowed {
            Ok(canonical)
        } else {
            Err(denied())
        }
    }

    async fn process_summarize(
        &self,
        source: &PdfSource,
    ) -> crate::error::Result<SummarizePdfResult> {
        let resolved = self.resolve_source(source).await?;
        let output = self.summarizer.process(resolved.data).await?;

        Ok(SummarizePdfResult {
            source: resolved.source_name,
            extracted_text: Some(output.extracted_text),
            llm_response: Some(output.llm_response),
            used_fallback: output.used_fallback,
            error: None,
        })
    }

    async fn process_extract_text(
        &self,
        source: &PdfSource,
    ) -> crate::error::Result<ExtractTextResult> {
        let resolved = self.resolve_source(source).await?;
        let extraction = self.summarizer.extract(resolved.data).await;

        if extraction.is_blank() {
            return Err(Error::ExtractionFailed);
        }

        Ok(ExtractTextResult {
            source: resolved.source_name,
            extracted_text: extraction.text,
            used_fallback: extraction.used_fallback,
            page_count: extraction.page_count,
            failed_pages: extraction.failed_pages,
            error: None,
        })
    }
}

#[tool_handler]
impl ServerHandler for SummaryServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Extracts text from PDFs (text layer first, OCR for scanned documents) \
                 and summarizes it with a language model."
                    .into(),
            ),
        }
    }
}

/// Run the MCP server on stdio until the client disconnects
pub async fn run_server(summarizer: Summarizer, config: ServerConfig) -> Result<()> {
    let server = SummaryServer::with_config(summarizer, config);

    tracing::info!("PDF summarizer MCP server ready, waiting for connections...");

    let service = server.serve(rmcp::transport::io::stdio()).await?;
    service.waiting().await?;

    Ok(())
}
