//! OCR backend abstraction.
//!
//! The PDF extractor receives an `OcrBackend` at construction rather than
//! reaching for a global engine, so tests can substitute a stub and
//! deployments can swap recognizers.

use std::path::Path;

use thiserror::Error;

/// Errors from OCR backends.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Recognized text for one rasterized page.
#[derive(Debug, Clone, Default)]
pub struct OcrResult {
    /// Extracted text content.
    pub text: String,
    /// Per-word recognizer confidence, 0-100.
    pub word_confidences: Vec<f32>,
    /// Which backend produced this result.
    pub backend: &'static str,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl OcrResult {
    /// Mean word confidence, or 0 when nothing was recognized.
    pub fn confidence(&self) -> f64 {
        if self.word_confidences.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.word_confidences.iter().map(|c| *c as f64).sum();
        sum / self.word_confidences.len() as f64
    }
}

/// Trait for OCR backends: rasterize a PDF page and recognize its text.
pub trait OcrBackend: Send + Sync {
    /// Short backend name for logs and records.
    fn name(&self) -> &'static str;

    /// Check if this backend is available (dependencies installed).
    fn is_available(&self) -> bool;

    /// Get a description of what's needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Page count, for when the PDF's own metadata could not be read.
    fn page_count(&self, _pdf_path: &Path) -> Option<u32> {
        None
    }

    /// Rasterize one page (1-based) at `scale` × 72 DPI and recognize it.
    fn ocr_pdf_page(&self, pdf_path: &Path, page: u32, scale: f32)
        -> Result<OcrResult, OcrError>;
}
