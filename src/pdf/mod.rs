//! PDF processing layer
//!
//! The pipeline talks to PDFs only through [`PdfBackend`], which yields the
//! embedded text layer page by page or rasterizes pages for OCR. The
//! production implementation is backed by PDFium.

mod reader;

pub use reader::{PdfiumBackend, RENDER_SCALE};

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Outcome of reading one page, keyed by 1-indexed page number
pub type PageOutcome<T> = (u32, Result<T>);

/// Reader for PDF text layers and page rasters.
///
/// Document-level failures (unreadable file, bad password) are returned as
/// the outer `Err`; a single bad page is reported in its own slot so callers
/// can keep the other pages.
pub trait PdfBackend: Send + Sync {
    /// Text layer of every page, in document order
    fn page_texts(&self, data: &[u8]) -> Result<Vec<PageOutcome<String>>>;

    /// Render every page to a PNG file inside `dir`, in document order
    fn render_pages(&self, data: &[u8], dir: &Path) -> Result<Vec<PageOutcome<PathBuf>>>;
}

/// Readers accept the header anywhere in this many leading bytes
pub const HEADER_SEARCH_LEN: usize = 1024;

/// Check for the `%PDF` magic bytes within the first [`HEADER_SEARCH_LEN`]
/// bytes, so a BOM or short preamble is tolerated
pub fn has_pdf_header(data: &[u8]) -> bool {
    let window = &data[..data.len().min(HEADER_SEARCH_LEN)];
    window.windows(4).any(|w| w == b"%PDF")
}

/// File name used for a rendered page inside a scratch directory
pub fn page_image_name(page: u32) -> String {
    format!("page-{:04}.png", page)
}
