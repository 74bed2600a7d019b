//! PDF Summarizer Library
//!
//! Extracts text from a PDF (embedded text layer first, OCR when the
//! document has none) and asks a chat-completion model to summarize it.
//!
//! - [`pipeline::Summarizer`]: the extraction-and-summarization pipeline
//! - [`server::SummaryServer`]: MCP tools `summarize_pdf` and `extract_text`

pub mod chat;
pub mod config;
pub mod error;
pub mod extract;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod server;
pub mod source;

pub use chat::{ChatClient, ChatRequest, Message, MessageContent, OpenAiClient, Role};
pub use config::{PromptSource, SummarizerConfig};
pub use error::{Error, Result};
pub use extract::{ExtractionResult, Extractor};
pub use ocr::{OcrEngine, TesseractCli};
pub use pdf::{PdfBackend, PdfiumBackend};
pub use pipeline::{build_history, Summarizer, SummaryOutput};
pub use server::{run_server, PdfSource, ServerConfig, SummaryServer};
