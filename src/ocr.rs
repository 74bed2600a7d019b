//! Optical character recognition for pages without a text layer

use crate::error::{Error, Result};
use std::path::Path;
use std::process::Command;

/// Recognizes text in a raster image.
pub trait OcrEngine: Send + Sync {
    /// Best-effort text for the image at `image`
    fn recognize(&self, image: &Path) -> Result<String>;
}

/// Tesseract driven through its command-line executable.
///
/// Output goes to stdout, so no intermediate text files are created.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    command: String,
    language: String,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self {
            command: "tesseract".to_string(),
            language: "eng".to_string(),
        }
    }
}

impl TesseractCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different executable (absolute path or name on `PATH`)
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Set language(s) for OCR (e.g., "eng", "eng+fra")
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Check whether the executable can be launched
    pub fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(&self, image: &Path) -> Result<String> {
        let output = Command::new(&self.command)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|e| Error::Ocr {
                reason: format!("Failed to run {}: {}", self.command, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Ocr {
                reason: format!("{} exited with {}: {}", self.command, output.status, stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
