//! Integration tests for the PDF summarizer pipeline

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use pdf_summarizer::pdf::{page_image_name, PageOutcome};
use pdf_summarizer::{
    Error, Extractor, Message, OcrEngine, PdfBackend, PdfiumBackend, PromptSource, Result,
    Summarizer, SummarizerConfig,
};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Kinds of document the fake reader can pretend to open
#[derive(Clone, Copy)]
enum Document {
    /// Pages carry a text layer
    Text(&'static [&'static str]),
    /// Pages are images with the given rendered text
    Scanned(&'static [&'static str]),
    /// No text layer and nothing to recognize
    Blank(usize),
}

struct FakeReader {
    document: Document,
}

impl PdfBackend for FakeReader {
    fn page_texts(&self, _data: &[u8]) -> Result<Vec<PageOutcome<String>>> {
        let pages: Vec<String> = match self.document {
            Document::Text(pages) => pages.iter().map(|p| p.to_string()).collect(),
            Document::Scanned(pages) => vec![String::new(); pages.len()],
            Document::Blank(count) => vec![String::new(); count],
        };
        Ok(pages
            .into_iter()
            .enumerate()
            .map(|(i, t)| (i as u32 + 1, Ok(t)))
            .collect())
    }

    fn render_pages(&self, _data: &[u8], dir: &Path) -> Result<Vec<PageOutcome<PathBuf>>> {
        let pixels: Vec<&str> = match self.document {
            Document::Text(pages) | Document::Scanned(pages) => pages.to_vec(),
            Document::Blank(count) => vec![""; count],
        };

        let mut rendered = Vec::new();
        for (i, content) in pixels.into_iter().enumerate() {
            let page = i as u32 + 1;
            let path = dir.join(page_image_name(page));
            std::fs::write(&path, content)?;
            rendered.push((page, Ok(path)));
        }
        Ok(rendered)
    }
}

/// "Recognizes" whatever the fake renderer wrote into the image file
#[derive(Default)]
struct CountingOcr {
    calls: AtomicUsize,
}

impl OcrEngine for CountingOcr {
    fn recognize(&self, image: &Path) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(std::fs::read_to_string(image)?)
    }
}

/// Records every conversation and answers deterministically
#[derive(Default)]
struct StubChat {
    conversations: Mutex<Vec<Vec<Message>>>,
    fail: bool,
}

impl StubChat {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.conversations.lock().unwrap().len()
    }
}

impl pdf_summarizer::ChatClient for StubChat {
    fn complete<'a>(
        &'a self,
        request: &'a pdf_summarizer::ChatRequest,
    ) -> BoxFuture<'a, Result<String>> {
        self.conversations
            .lock()
            .unwrap()
            .push(request.messages.clone());
        let fail = self.fail;
        let chars = request.messages[1].text().map_or(0, str::len);
        async move {
            if fail {
                Err(Error::Chat {
                    status: Some(401),
                    reason: "Incorrect API key provided".to_string(),
                })
            } else {
                Ok(format!("summary of {} chars", chars))
            }
        }
        .boxed()
    }
}

struct Harness {
    summarizer: Summarizer,
    ocr: Arc<CountingOcr>,
    chat: Arc<StubChat>,
}

fn harness_with(document: Document, chat: StubChat, prompt: PromptSource) -> Harness {
    let ocr = Arc::new(CountingOcr::default());
    let chat = Arc::new(chat);
    let extractor = Extractor::new(Arc::new(FakeReader { document }), ocr.clone());
    let config = SummarizerConfig {
        prompt,
        temperature: 0.0,
        ..SummarizerConfig::default()
    };
    Harness {
        summarizer: Summarizer::new(extractor, chat.clone(), config),
        ocr,
        chat,
    }
}

fn harness(document: Document) -> Harness {
    harness_with(
        document,
        StubChat::default(),
        PromptSource::Inline("Summarize the document.".to_string()),
    )
}

const PDF: &[u8] = b"%PDF-1.4\n%%EOF";

#[tokio::test]
async fn test_text_layer_never_invokes_ocr() {
    let h = harness(Document::Text(&["Quarterly report. ", "Revenue grew."]));

    let output = h.summarizer.process(PDF.to_vec()).await.unwrap();
    assert_eq!(output.extracted_text, "Quarterly report. Revenue grew.");
    assert!(!output.used_fallback);
    assert_eq!(h.ocr.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.chat.calls(), 1);
}

#[tokio::test]
async fn test_scanned_document_falls_back_to_ocr() {
    let h = harness(Document::Scanned(&["INVOICE 42\n", "Total: 10 EUR\n"]));

    let output = h.summarizer.process(PDF.to_vec()).await.unwrap();
    assert_eq!(output.extracted_text, "INVOICE 42\nTotal: 10 EUR\n");
    assert!(output.used_fallback);
    assert_eq!(h.ocr.calls.load(Ordering::SeqCst), 2);
    assert_eq!(h.chat.calls(), 1);
}

#[tokio::test]
async fn test_blank_document_fails_without_chat_call() {
    let h = harness(Document::Blank(3));

    let result = h.summarizer.process(PDF.to_vec()).await;
    assert!(matches!(result, Err(Error::ExtractionFailed)));
    assert_eq!(h.ocr.calls.load(Ordering::SeqCst), 3);
    assert_eq!(h.chat.calls(), 0);
}

#[tokio::test]
async fn test_conversation_history_is_exact() {
    let h = harness(Document::Text(&["Hello world."]));

    h.summarizer.process(PDF.to_vec()).await.unwrap();

    let conversations = h.chat.conversations.lock().unwrap();
    assert_eq!(
        conversations[0],
        vec![
            Message::system("Summarize the document."),
            Message::user("Hello world."),
        ]
    );
}

#[tokio::test]
async fn test_history_is_fresh_per_invocation() {
    let h = harness(Document::Text(&["Hello world."]));

    h.summarizer.process(PDF.to_vec()).await.unwrap();
    h.summarizer.process(PDF.to_vec()).await.unwrap();

    let conversations = h.chat.conversations.lock().unwrap();
    assert_eq!(conversations.len(), 2);
    assert_eq!(conversations[0].len(), 2);
    assert_eq!(conversations[1].len(), 2);
}

#[tokio::test]
async fn test_chat_failure_propagates() {
    let h = harness_with(
        Document::Text(&["Hello world."]),
        StubChat::failing(),
        PromptSource::Inline("Summarize the document.".to_string()),
    );

    let err = h.summarizer.process(PDF.to_vec()).await.unwrap_err();
    assert!(matches!(err, Error::Chat { status: Some(401), .. }));
    assert!(err.is_upstream_chat());
}

#[tokio::test]
async fn test_repeated_runs_extract_identical_text() {
    let h = harness(Document::Scanned(&["Page one. ", "Page two."]));

    let first = h.summarizer.process(PDF.to_vec()).await.unwrap();
    let second = h.summarizer.process(PDF.to_vec()).await.unwrap();
    assert_eq!(first.extracted_text, second.extracted_text);
    assert_eq!(first.llm_response, second.llm_response);
}

#[tokio::test]
async fn test_prompt_file_is_trimmed() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "   Summarize the document.\n\n").unwrap();

    let h = harness_with(
        Document::Text(&["Hello world."]),
        StubChat::default(),
        PromptSource::File(file.path().to_path_buf()),
    );
    h.summarizer.process(PDF.to_vec()).await.unwrap();

    let conversations = h.chat.conversations.lock().unwrap();
    assert_eq!(conversations[0][0], Message::system("Summarize the document."));
}

#[tokio::test]
async fn test_extract_only_reports_pages() {
    let h = harness(Document::Text(&["a", "b", "c"]));

    let result = h.summarizer.extract(PDF.to_vec()).await;
    assert_eq!(result.text, "abc");
    assert_eq!(result.page_count, 3);
    assert!(result.failed_pages.is_empty());
    assert_eq!(h.chat.calls(), 0);
}

#[tokio::test]
async fn test_concurrent_invocations_do_not_interfere() {
    let h = harness(Document::Scanned(&["alpha ", "beta"]));

    let runs = (0..8).map(|_| {
        let summarizer = h.summarizer.clone();
        tokio::spawn(async move { summarizer.process(PDF.to_vec()).await })
    });

    for run in runs.collect::<Vec<_>>() {
        let output = run.await.unwrap().unwrap();
        assert_eq!(output.extracted_text, "alpha beta");
    }
    assert_eq!(h.ocr.calls.load(Ordering::SeqCst), 16);
}

// ============================================================================
// PDFium-backed tests on fixture PDFs
// ============================================================================

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(fixture_path(name)).expect("Failed to read fixture")
}

/// PDFium is a shared library that may be missing from the test machine
fn pdfium_available() -> bool {
    let available = PdfiumBackend::is_available();
    if !available {
        eprintln!("PDFium library not found, skipping");
    }
    available
}

/// OCR that finds nothing on any page
#[derive(Default)]
struct EmptyOcr {
    calls: AtomicUsize,
}

impl OcrEngine for EmptyOcr {
    fn recognize(&self, image: &Path) -> Result<String> {
        assert!(image.exists(), "page image should exist during OCR");
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(String::new())
    }
}

#[test]
fn test_pdfium_reads_text_layer() {
    if !pdfium_available() {
        return;
    }

    let pages = PdfiumBackend::new().page_texts(&fixture("hello.pdf")).unwrap();
    assert_eq!(pages.len(), 1);

    let (page, text) = &pages[0];
    assert_eq!(*page, 1);
    assert!(text.as_ref().unwrap().contains("Hello world."));
}

#[test]
fn test_pdfium_blank_text_layer() {
    if !pdfium_available() {
        return;
    }

    let pages = PdfiumBackend::new().page_texts(&fixture("blank.pdf")).unwrap();
    assert_eq!(pages.len(), 2);
    for (_, text) in pages {
        assert!(text.unwrap().trim().is_empty());
    }
}

#[test]
fn test_pdfium_renders_one_png_per_page_at_point_size() {
    if !pdfium_available() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let rendered = PdfiumBackend::new()
        .render_pages(&fixture("blank.pdf"), dir.path())
        .unwrap();

    let pages: Vec<u32> = rendered.iter().map(|(page, _)| *page).collect();
    assert_eq!(pages, vec![1, 2]);

    for (page, path) in rendered {
        let path = path.unwrap();
        assert_eq!(path, dir.path().join(page_image_name(page)));
        // MediaBox is 300x200 points, rendered one pixel per point
        assert_eq!(image::image_dimensions(&path).unwrap(), (300, 200));
    }
}

#[tokio::test]
async fn test_pdfium_text_layer_skips_ocr() {
    if !pdfium_available() {
        return;
    }

    let ocr = Arc::new(EmptyOcr::default());
    let chat = Arc::new(StubChat::default());
    let extractor = Extractor::new(Arc::new(PdfiumBackend::new()), ocr.clone());
    let config = SummarizerConfig {
        prompt: PromptSource::Inline("Summarize the document.".to_string()),
        ..SummarizerConfig::default()
    };
    let summarizer = Summarizer::new(extractor, chat.clone(), config);

    let output = summarizer.process(fixture("hello.pdf")).await.unwrap();
    assert!(output.extracted_text.contains("Hello world."));
    assert!(!output.used_fallback);
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    assert_eq!(chat.calls(), 1);
}

#[tokio::test]
async fn test_pdfium_blank_document_fails_after_ocr() {
    if !pdfium_available() {
        return;
    }

    let ocr = Arc::new(EmptyOcr::default());
    let chat = Arc::new(StubChat::default());
    let extractor = Extractor::new(Arc::new(PdfiumBackend::new()), ocr.clone());
    let summarizer = Summarizer::new(extractor, chat.clone(), SummarizerConfig::default());

    let result = summarizer.process(fixture("blank.pdf")).await;
    assert!(matches!(result, Err(Error::ExtractionFailed)));
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 2);
    assert_eq!(chat.calls(), 0);
}

#[test]
fn test_pdfium_concurrent_reads() {
    if !pdfium_available() {
        return;
    }

    let data = Arc::new(fixture("hello.pdf"));
    let backend = Arc::new(PdfiumBackend::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let data = data.clone();
            let backend = backend.clone();
            std::thread::spawn(move || {
                let dir = tempfile::tempdir().unwrap();
                // Interleave text reads with renders
                if i % 2 == 0 {
                    let pages = backend.page_texts(&data).unwrap();
                    assert!(pages[0].1.as_ref().unwrap().contains("Hello world."));
                } else {
                    let rendered = backend.render_pages(&data, dir.path()).unwrap();
                    assert!(rendered[0].1.is_ok());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
