//! PDF text extraction with OCR fallback.
//!
//! Direct extraction reads the embedded text layer. When that text looks
//! unreliable and is short, pages are rasterized and recognized through the
//! injected OCR backend, and the better of the two outputs (or a hybrid)
//! becomes the document text.

mod metadata;
mod text_layer;

pub use metadata::{decode_pdf_string, parse_pdf_date, read_metadata, PdfMetadata};
pub use text_layer::{
    direct_confidence, text_layer_for, PdfExtractLayer, PdftotextLayer, TextLayer,
};

use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::PdfConfig;
use crate::error::ExtractionError;
use crate::models::ExtractionMethod;
use crate::ocr::OcrBackend;
use crate::quality::{self, QualityMetrics};
use crate::utils::clean_text;

/// Outcome of extracting one PDF.
#[derive(Debug, Clone)]
pub struct PdfExtractionResult {
    pub text: String,
    pub metadata: PdfMetadata,
    pub quality_metrics: QualityMetrics,
    pub extraction_method: ExtractionMethod,
    pub confidence_score: f64,
    pub processing_time: Duration,
    pub errors: Vec<String>,
}

/// Text chosen between the direct and OCR outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub method: ExtractionMethod,
    pub text: String,
    pub confidence: f64,
}

impl Selection {
    fn failed() -> Self {
        Self {
            method: ExtractionMethod::Failed,
            text: String::new(),
            confidence: 0.0,
        }
    }
}

/// Recognized text for a whole document.
#[derive(Debug, Clone)]
struct OcrOutcome {
    text: String,
    confidence: f64,
}

/// PDF extractor holding its text-layer and OCR backends.
pub struct PdfExtractor {
    config: PdfConfig,
    text_layer: Arc<dyn TextLayer>,
    ocr_backend: Option<Arc<dyn OcrBackend>>,
}

impl PdfExtractor {
    pub fn new(
        config: PdfConfig,
        text_layer: Arc<dyn TextLayer>,
        ocr_backend: Option<Arc<dyn OcrBackend>>,
    ) -> Self {
        Self {
            config,
            text_layer,
            ocr_backend,
        }
    }

    pub fn config(&self) -> &PdfConfig {
        &self.config
    }

    /// Extract text, metadata and quality from PDF bytes.
    ///
    /// Never fails: every problem ends up in `errors`, and a panic inside a
    /// backend yields a `failed` result.
    pub fn extract(&self, pdf: &[u8], filename: Option<&str>) -> PdfExtractionResult {
        let start = Instant::now();
        let label = filename.unwrap_or("<memory>");
        let mut errors = Vec::new();

        let metadata = match read_metadata(pdf) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("{}: {}", label, e);
                errors.push(e.to_string());
                PdfMetadata::unreadable(pdf.len() as u64)
            }
        };

        let selection = match panic::catch_unwind(AssertUnwindSafe(|| {
            self.extract_text(pdf, &metadata, &mut errors)
        })) {
            Ok(selection) => selection,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!("{}: PDF extraction panicked: {}", label, message);
                errors.push(format!("PDF extraction panicked: {}", message));
                Selection::failed()
            }
        };

        let text = clean_text(&selection.text);
        let quality_metrics = quality::compute_metrics(&text);

        info!(
            "{}: extracted {} chars via {} (confidence {:.1})",
            label,
            text.chars().count(),
            selection.method.as_str(),
            selection.confidence
        );

        PdfExtractionResult {
            text,
            metadata,
            quality_metrics,
            extraction_method: selection.method,
            confidence_score: selection.confidence,
            processing_time: start.elapsed(),
            errors,
        }
    }

    fn extract_text(
        &self,
        pdf: &[u8],
        metadata: &PdfMetadata,
        errors: &mut Vec<String>,
    ) -> Selection {
        let (direct_text, direct_failed) = match self.text_layer.extract_text(pdf) {
            Ok(text) => (text, false),
            Err(e) => {
                warn!("{} direct extraction failed: {}", self.text_layer.name(), e);
                errors.push(e.to_string());
                (String::new(), true)
            }
        };
        let direct_conf = direct_confidence(&direct_text);
        debug!(
            "Direct extraction: {} chars, confidence {:.1}",
            direct_text.trim().chars().count(),
            direct_conf
        );

        let ocr = if self.should_run_ocr(direct_conf, &direct_text) {
            match self.run_ocr(pdf, metadata.pages) {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    warn!("{}", e);
                    errors.push(e.to_string());
                    None
                }
            }
        } else {
            None
        };

        let ocr_has_text = ocr.as_ref().is_some_and(|o| !o.text.trim().is_empty());
        if direct_failed && !ocr_has_text {
            return Selection::failed();
        }

        select_output(
            &direct_text,
            direct_conf,
            ocr.as_ref().map(|o| (o.text.as_str(), o.confidence)),
        )
    }

    /// Whether direct output is weak enough to warrant OCR.
    pub fn should_run_ocr(&self, direct_confidence: f64, direct_text: &str) -> bool {
        if !self.config.ocr_enabled {
            return false;
        }
        let Some(backend) = &self.ocr_backend else {
            return false;
        };

        let direct_chars = direct_text.trim().chars().count();
        let weak = direct_confidence < self.config.ocr_min_confidence
            && direct_chars < self.config.ocr_max_direct_chars;
        if !weak {
            return false;
        }

        if !backend.is_available() {
            debug!(
                "OCR wanted but {} unavailable: {}",
                backend.name(),
                backend.availability_hint()
            );
            return false;
        }

        debug!(
            "Running OCR: direct confidence {:.1} < {}, {} chars < {}",
            direct_confidence,
            self.config.ocr_min_confidence,
            direct_chars,
            self.config.ocr_max_direct_chars
        );
        true
    }

    fn run_ocr(&self, pdf: &[u8], known_pages: u32) -> Result<OcrOutcome, ExtractionError> {
        let backend = self
            .ocr_backend
            .as_ref()
            .ok_or_else(|| ExtractionError::OcrFailure("no OCR backend configured".to_string()))?;

        let io_err = |e: std::io::Error| ExtractionError::OcrFailure(e.to_string());
        let mut tmp = tempfile::Builder::new()
            .prefix("docsift-ocr-")
            .suffix(".pdf")
            .tempfile()
            .map_err(io_err)?;
        tmp.write_all(pdf).map_err(io_err)?;
        tmp.flush().map_err(io_err)?;

        let pages = if known_pages > 0 {
            known_pages
        } else {
            backend.page_count(tmp.path()).unwrap_or(1)
        };
        let pages = pages.min(self.config.ocr_page_cap);

        self.recognize_pages(backend.as_ref(), tmp.path(), pages)
    }

    fn recognize_pages(
        &self,
        backend: &dyn OcrBackend,
        pdf_path: &Path,
        pages: u32,
    ) -> Result<OcrOutcome, ExtractionError> {
        let mut texts = Vec::new();
        let mut confidences = Vec::new();
        let mut last_error = None;

        for page in 1..=pages {
            match backend.ocr_pdf_page(pdf_path, page, self.config.ocr_scale) {
                Ok(result) => {
                    confidences.push(result.confidence());
                    texts.push(result.text);
                }
                Err(e) => {
                    warn!("OCR failed on page {}: {}", page, e);
                    last_error = Some(e);
                }
            }
        }

        if confidences.is_empty() {
            return Err(match last_error {
                Some(e) => e.into(),
                None => ExtractionError::OcrFailure("document has no pages".to_string()),
            });
        }

        let confidence = confidences.iter().sum::<f64>() / confidences.len() as f64;
        debug!(
            "OCR recognized {}/{} pages with {} (confidence {:.1})",
            confidences.len(),
            pages,
            backend.name(),
            confidence
        );

        Ok(OcrOutcome {
            text: texts.join("\n\n"),
            confidence,
        })
    }
}

/// Choose between direct and OCR output.
///
/// OCR wins outright on higher confidence. Otherwise, when OCR recovered
/// more text, the result is a hybrid: the candidate with meaningful content
/// (or the longer one, direct on ties) at the higher of the two confidences.
pub fn select_output(
    direct_text: &str,
    direct_confidence: f64,
    ocr: Option<(&str, f64)>,
) -> Selection {
    let direct = || Selection {
        method: ExtractionMethod::Direct,
        text: direct_text.to_string(),
        confidence: direct_confidence,
    };

    let Some((ocr_text, ocr_confidence)) = ocr else {
        return direct();
    };

    if ocr_confidence > direct_confidence {
        return Selection {
            method: ExtractionMethod::Ocr,
            text: ocr_text.to_string(),
            confidence: ocr_confidence,
        };
    }

    let ocr_len = ocr_text.trim().chars().count();
    let direct_len = direct_text.trim().chars().count();
    if ocr_len == 0 || ocr_len <= direct_len {
        return direct();
    }

    let direct_meaningful = quality::compute_metrics(direct_text).has_meaningful_content;
    let ocr_meaningful = quality::compute_metrics(ocr_text).has_meaningful_content;
    let text = match (direct_meaningful, ocr_meaningful) {
        (true, false) => direct_text,
        (false, true) => ocr_text,
        _ if ocr_len > direct_len => ocr_text,
        _ => direct_text,
    };

    Selection {
        method: ExtractionMethod::Hybrid,
        text: text.to_string(),
        confidence: direct_confidence.max(ocr_confidence),
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
