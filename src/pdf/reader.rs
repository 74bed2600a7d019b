//! PDFium-backed text layer reader and page rasterizer

use super::{has_pdf_header, page_image_name, PageOutcome, PdfBackend};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};

/// Scale applied when rasterizing pages for OCR. 1.0 renders at the page's
/// native size (one pixel per PDF point), with no extra transform.
pub const RENDER_SCALE: f32 = 1.0;

/// Serializes every bind, load, read and drop of PDFium.
///
/// Dropping a `Pdfium` destroys the process-global library state, so two
/// instances must never be alive at the same time.
static PDFIUM_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Get PDFium instance. Callers must hold [`PDFIUM_LOCK`] until it drops.
fn create_pdfium() -> Result<Pdfium> {
    let bind_default = || {
        Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                    "/opt/pdfium/lib",
                ))
            })
            .or_else(|_| Pdfium::bind_to_system_library())
    };

    // An explicit library path wins over the search locations
    let bindings = match std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        Ok(path) => Pdfium::bind_to_library(&path).or_else(|_| bind_default()),
        Err(_) => bind_default(),
    }
    .map_err(|e| Error::Pdfium {
        reason: format!("Failed to initialize PDFium: {}", e),
    })?;

    Ok(Pdfium::new(bindings))
}

/// Map PDFium errors to our error type
fn map_pdfium_error(err: PdfiumError) -> Error {
    match err {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            Error::PasswordRequired
        }
        _ => Error::Pdfium {
            reason: format!("{}", err),
        },
    }
}

/// [`PdfBackend`] implemented on top of PDFium.
///
/// Stateless: the library is bound per call because `Pdfium` is not `Send`.
#[derive(Debug, Clone, Default)]
pub struct PdfiumBackend {
    password: Option<String>,
}

impl PdfiumBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether the PDFium library can be bound
    pub fn is_available() -> bool {
        let _guard = PDFIUM_LOCK.lock();
        create_pdfium().is_ok()
    }

    /// Use a password for encrypted documents
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    fn load<'a>(&self, pdfium: &'a Pdfium, data: &'a [u8]) -> Result<PdfDocument<'a>> {
        pdfium
            .load_pdf_from_byte_slice(data, self.password.as_deref())
            .map_err(map_pdfium_error)
    }

    fn page_text(page: &PdfPage) -> Result<String> {
        let text = page.text().map_err(|e| Error::Pdfium {
            reason: format!("Failed to read text layer: {}", e),
        })?;
        Ok(text.all())
    }

    fn render_page(page: &PdfPage, path: &Path) -> Result<()> {
        let config = PdfRenderConfig::new()
            .scale_page_by_factor(RENDER_SCALE)
            .render_form_data(true)
            .render_annotations(true);

        let bitmap = page.render_with_config(&config).map_err(|e| Error::Pdfium {
            reason: format!("Failed to render page: {}", e),
        })?;

        let mut png_bytes = Vec::new();
        bitmap
            .as_image()
            .write_to(
                &mut std::io::Cursor::new(&mut png_bytes),
                image::ImageFormat::Png,
            )
            .map_err(|e| Error::Pdfium {
                reason: format!("Failed to encode page as PNG: {}", e),
            })?;

        std::fs::write(path, png_bytes)?;
        Ok(())
    }
}

impl PdfBackend for PdfiumBackend {
    fn page_texts(&self, data: &[u8]) -> Result<Vec<PageOutcome<String>>> {
        // Validate before binding the library so garbage input fails fast
        if !has_pdf_header(data) {
            return Err(Error::InvalidPdf {
                reason: "Not a valid PDF file".to_string(),
            });
        }

        let _guard = PDFIUM_LOCK.lock();
        let pdfium = create_pdfium()?;
        let document = self.load(&pdfium, data)?;
        let pages = document.pages();
        let mut texts = Vec::with_capacity(pages.len() as usize);

        for index in 0..pages.len() {
            let page_num = index as u32 + 1;
            let text = pages
                .get(index)
                .map_err(|e| Error::Pdfium {
                    reason: format!("Failed to get page {}: {}", page_num, e),
                })
                .and_then(|page| Self::page_text(&page));
            texts.push((page_num, text));
        }

        Ok(texts)
    }

    fn render_pages(&self, data: &[u8], dir: &Path) -> Result<Vec<PageOutcome<PathBuf>>> {
        // Validate before binding the library so garbage input fails fast
        if !has_pdf_header(data) {
            return Err(Error::InvalidPdf {
                reason: "Not a valid PDF file".to_string(),
            });
        }

        let _guard = PDFIUM_LOCK.lock();
        let pdfium = create_pdfium()?;
        let document = self.load(&pdfium, data)?;
        let pages = document.pages();
        let mut rendered = Vec::with_capacity(pages.len() as usize);

        for index in 0..pages.len() {
            let page_num = index as u32 + 1;
            let path = dir.join(page_image_name(page_num));
            let outcome = pages
                .get(index)
                .map_err(|e| Error::Pdfium {
                    reason: format!("Failed to get page {}: {}", page_num, e),
                })
                .and_then(|page| Self::render_page(&page, &path))
                .map(|()| path);
            rendered.push((page_num, outcome));
        }

        Ok(rendered)
    }
}
