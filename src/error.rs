//! Error types for the PDF summarizer

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the PDF summarizer
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the PDF summarizer
#[derive(Error, Debug)]
pub enum Error {
    /// Neither the text layer nor OCR produced any non-blank text
    #[error("Failed to extract text from the PDF")]
    ExtractionFailed,

    /// The chat-completion endpoint returned an error or an unusable reply
    #[error("Chat completion failed{}: {reason}", status_suffix(.status))]
    Chat { status: Option<u16>, reason: String },

    /// No API credential in the environment
    #[error("Missing API key: set the {var} environment variable")]
    MissingApiKey { var: &'static str },

    /// The system prompt file could not be read
    #[error("Failed to load system prompt from {}: {source}", .path.display())]
    PromptLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// PDF file not found
    #[error("PDF not found: {path}")]
    PdfNotFound { path: String },

    /// Invalid PDF file
    #[error("Invalid PDF file: {reason}")]
    InvalidPdf { reason: String },

    /// PDF is password protected
    #[error("PDF is password protected")]
    PasswordRequired,

    /// PDFium error
    #[error("PDFium error: {reason}")]
    Pdfium { reason: String },

    /// OCR engine error
    #[error("OCR error: {reason}")]
    Ocr { reason: String },

    /// Source resolution error
    #[error("Failed to resolve source: {reason}")]
    SourceResolution { reason: String },

    /// Base64 decode error
    #[error("Invalid base64 data: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Path access denied (outside allowed resource directories)
    #[error("Path access denied: {path}")]
    PathAccessDenied { path: String },

    /// SSRF blocked (URL resolves to private/reserved IP)
    #[error("SSRF blocked: {url}")]
    SsrfBlocked { url: String },

    /// Download too large
    #[error("Download too large: {size} bytes (max: {max_size} bytes)")]
    DownloadTooLarge { size: u64, max_size: u64 },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

impl Error {
    /// Return a sanitized error message safe to send to clients.
    /// Internal details (paths, library errors, file sizes) are omitted.
    /// Full details should be logged via tracing before calling this.
    pub fn client_message(&self) -> String {
        match self {
            Error::ExtractionFailed => "Failed to extract text from the PDF.".to_string(),
            Error::Chat { status, reason } => match status {
                Some(s) => format!("Chat completion failed (HTTP {}): {}", s, reason),
                None => format!("Chat completion failed: {}", reason),
            },
            Error::MissingApiKey { .. } => "Chat client is not configured".to_string(),
            Error::PromptLoad { .. } => "System prompt unavailable".to_string(),
            Error::PdfNotFound { .. } => "PDF not found".to_string(),
            Error::InvalidPdf { .. } => "Invalid PDF file".to_string(),
            Error::PasswordRequired => "PDF is password protected".to_string(),
            Error::Pdfium { .. } => "PDF processing error".to_string(),
            Error::Ocr { .. } => "OCR error".to_string(),
            Error::SourceResolution { .. } => "Failed to resolve PDF source".to_string(),
            Error::Base64Decode(_) => "Invalid base64 data".to_string(),
            Error::HttpRequest(_) => "HTTP request failed".to_string(),
            Error::Io(_) => "I/O error".to_string(),
            Error::Serialization(_) => "Serialization error".to_string(),
            Error::PathAccessDenied { .. } => "Access denied".to_string(),
            Error::SsrfBlocked { .. } => "URL not allowed".to_string(),
            Error::DownloadTooLarge { max_size, .. } => {
                format!("Download exceeds maximum size of {} bytes", max_size)
            }
        }
    }

    /// Whether this error came from the chat-completion call
    pub fn is_upstream_chat(&self) -> bool {
        matches!(self, Error::Chat { .. })
    }
}
