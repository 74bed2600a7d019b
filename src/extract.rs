//! Two-stage text extraction: embedded text layer first, OCR as fallback
//!
//! Neither stage ever fails. Reader, renderer and OCR errors are logged and
//! turn into empty text for the affected page (or the whole stage when the
//! document cannot be opened), so the caller only has to decide whether the
//! final text is blank.

use crate::ocr::OcrEngine;
use crate::pdf::PdfBackend;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Text produced by a single extraction stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOutput {
    /// Page texts concatenated in page order, without separators
    pub text: String,
    /// Number of pages the stage saw
    pub page_count: usize,
    /// Pages (1-indexed) whose text could not be produced
    pub failed_pages: Vec<u32>,
}

impl StageOutput {
    pub fn is_blank(&self) -> bool {
        is_blank(&self.text)
    }
}

/// Final extraction outcome for one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub text: String,
    /// True when the text came from OCR rather than the text layer
    pub used_fallback: bool,
    pub page_count: usize,
    pub failed_pages: Vec<u32>,
}

impl ExtractionResult {
    pub fn is_blank(&self) -> bool {
        is_blank(&self.text)
    }
}

/// True for empty or whitespace-only text
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Runs the text-layer and OCR stages against pluggable collaborators
#[derive(Clone)]
pub struct Extractor {
    backend: Arc<dyn PdfBackend>,
    ocr: Arc<dyn OcrEngine>,
    scratch_root: Option<PathBuf>,
}

impl Extractor {
    pub fn new(backend: Arc<dyn PdfBackend>, ocr: Arc<dyn OcrEngine>) -> Self {
        Self {
            backend,
            ocr,
            scratch_root: None,
        }
    }

    /// Create per-invocation scratch directories under `root` instead of the
    /// system temp directory
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    /// Read the embedded text layer of every page
    pub fn extract_primary(&self, data: &[u8]) -> StageOutput {
        let pages = match self.backend.page_texts(data) {
            Ok(pages) => pages,
            Err(e) => {
                tracing::warn!(error = %e, "Text layer extraction failed");
                return StageOutput::default();
            }
        };

        let mut output = StageOutput {
            page_count: pages.len(),
            ..StageOutput::default()
        };

        for (page, text) in pages {
            match text {
                Ok(text) => output.text.push_str(&text),
                Err(e) => {
                    tracing::warn!(page, error = %e, "Failed to read page text layer");
                    output.failed_pages.push(page);
                }
            }
        }

        output
    }

    /// Rasterize every page into a scratch directory named after
    /// `invocation` and run OCR on each image
    pub fn extract_via_ocr(&self, data: &[u8], invocation: Uuid) -> StageOutput {
        let prefix = format!("pdf-summarizer-{}-", invocation);
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);
        let scratch = match &self.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        let scratch = match scratch {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to create OCR scratch directory");
                return StageOutput::default();
            }
        };

        let pages = match self.backend.render_pages(data, scratch.path()) {
            Ok(pages) => pages,
            Err(e) => {
                tracing::warn!(error = %e, "Page rendering for OCR failed");
                return StageOutput::default();
            }
        };

        let mut output = StageOutput {
            page_count: pages.len(),
            ..StageOutput::default()
        };

        for (page, image) in pages {
            let recognized = image.and_then(|path| {
                let text = self.ocr.recognize(&path);
                // Page images are only needed until OCR has seen them
                if let Err(e) = std::fs::remove_file(&path) {
                    tracing::debug!(page, error = %e, "Failed to remove page image");
                }
                text
            });

            match recognized {
                Ok(text) => output.text.push_str(&text),
                Err(e) => {
                    tracing::warn!(page, error = %e, "OCR failed for page");
                    output.failed_pages.push(page);
                }
            }
        }

        tracing::debug!(
            pages = output.page_count,
            chars = output.text.len(),
            "OCR stage complete"
        );

        output
    }

    /// Text layer first; OCR only when the text layer is blank
    pub fn extract(&self, data: &[u8], invocation: Uuid) -> ExtractionResult {
        let primary = self.extract_primary(data);
        if !primary.is_blank() {
            return ExtractionResult {
                text: primary.text,
                used_fallback: false,
                page_count: primary.page_count,
                failed_pages: primary.failed_pages,
            };
        }

        tracing::info!(%invocation, "No text layer found, falling back to OCR");
        let ocr = self.extract_via_ocr(data, invocation);
        ExtractionResult {
            text: ocr.text,
            used_fallback: true,
            page_count: ocr.page_count.max(primary.page_count),
            failed_pages: ocr.failed_pages,
        }
    }
}
