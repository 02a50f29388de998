//! Direct extraction of the text already embedded in a PDF.

use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::process::Command;

use crate::config::TextLayerKind;
use crate::error::ExtractionError;
use crate::ocr::{command_stdout, CommandFailure, PDFTOTEXT_NOT_FOUND};

/// Backend that reads a PDF's text layer without rendering pixels.
pub trait TextLayer: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract_text(&self, pdf: &[u8]) -> Result<String, ExtractionError>;
}

/// Build the configured text-layer backend.
pub fn text_layer_for(kind: TextLayerKind) -> Box<dyn TextLayer> {
    match kind {
        TextLayerKind::PdfExtract => Box::new(PdfExtractLayer),
        TextLayerKind::Pdftotext => Box::new(PdftotextLayer::new()),
    }
}

/// Pure Rust extraction via `pdf-extract`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractLayer;

impl TextLayer for PdfExtractLayer {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn extract_text(&self, pdf: &[u8]) -> Result<String, ExtractionError> {
        // pdf-extract panics on some malformed fonts and content streams.
        match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(pdf))) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(ExtractionError::DirectExtractionFailure(e.to_string())),
            Err(_) => Err(ExtractionError::DirectExtractionFailure(
                "pdf-extract panicked while reading the text layer".to_string(),
            )),
        }
    }
}

/// Poppler's `pdftotext`, fed through a temporary file.
#[derive(Debug, Clone)]
pub struct PdftotextLayer {
    /// Keep the physical layout (`-layout`).
    pub layout: bool,
}

impl PdftotextLayer {
    pub fn new() -> Self {
        Self { layout: true }
    }
}

impl Default for PdftotextLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayer for PdftotextLayer {
    fn name(&self) -> &'static str {
        "pdftotext"
    }

    fn extract_text(&self, pdf: &[u8]) -> Result<String, ExtractionError> {
        let io_err = |e: std::io::Error| ExtractionError::DirectExtractionFailure(e.to_string());

        let mut tmp = tempfile::Builder::new()
            .prefix("docsift-")
            .suffix(".pdf")
            .tempfile()
            .map_err(io_err)?;
        tmp.write_all(pdf).map_err(io_err)?;
        tmp.flush().map_err(io_err)?;

        let mut cmd = Command::new("pdftotext");
        if self.layout {
            cmd.arg("-layout");
        }
        let output = cmd.args(["-enc", "UTF-8"]).arg(tmp.path()).arg("-").output();

        command_stdout(output).map_err(|failure| match failure {
            CommandFailure::NotFound => {
                ExtractionError::DirectExtractionFailure(PDFTOTEXT_NOT_FOUND.to_string())
            }
            CommandFailure::Failed(stderr) => {
                ExtractionError::DirectExtractionFailure(format!("pdftotext failed: {}", stderr))
            }
            CommandFailure::Io(e) => io_err(e),
        })
    }
}

/// Heuristic confidence (0-100) for directly extracted text.
///
/// Rewards an average word length near 5 and a high share of alphabetic
/// characters; garbled text layers score low on both. Words are the same
/// `\w+` tokens the quality scorer counts, and text without any scores 0.
pub fn direct_confidence(text: &str) -> f64 {
    let (word_count, word_chars) = crate::quality::words(text)
        .fold((0usize, 0usize), |(n, chars), w| (n + 1, chars + w.chars().count()));
    if word_count == 0 {
        return 0.0;
    }

    let avg_word_length = word_chars as f64 / word_count as f64;
    let word_len_score = (100.0 - (avg_word_length - 5.0).abs() * 10.0).max(0.0);

    let total_chars = text.chars().count();
    let alpha_chars = text.chars().filter(|c| c.is_alphabetic()).count();
    let alpha_score = alpha_chars as f64 / total_chars as f64 * 100.0;

    (word_len_score * 0.4 + alpha_score * 0.6).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_text_scores_zero() {
        assert_eq!(direct_confidence(""), 0.0);
        assert_eq!(direct_confidence(" \n\t "), 0.0);
    }

    #[test]
    fn test_symbol_only_text_scores_zero() {
        assert_eq!(direct_confidence("@@ ##"), 0.0);
        assert_eq!(direct_confidence("-- ** //"), 0.0);
    }

    #[test]
    fn test_punctuation_not_counted_in_word_length() {
        // Words: Hello world This is fine, avg length 4; alpha 20 of 27 chars.
        let conf = direct_confidence("Hello, world. This is fine.");
        let expected = 90.0 * 0.4 + (20.0 / 27.0 * 100.0) * 0.6;
        assert!((conf - expected).abs() < 1e-9, "scored {}", conf);
        assert!((conf - 80.44).abs() < 0.01);
    }

    #[test]
    fn test_ideal_word_length() {
        // "abcde" x2: avg length 5, alpha 10 of 11 chars.
        let conf = direct_confidence("abcde abcde");
        let expected = 100.0 * 0.4 + (10.0 / 11.0 * 100.0) * 0.6;
        assert!((conf - expected).abs() < 1e-9);
    }

    #[test]
    fn test_garbled_text_scores_low() {
        let garbled = direct_confidence("#$% ^&* 1234567890 ()_+ {}|:");
        let prose = direct_confidence("The flight school offers private pilot training courses");
        assert!(garbled < 45.0, "garbled scored {}", garbled);
        assert!(prose > 60.0, "prose scored {}", prose);
    }

    #[test]
    fn test_confidence_bounds() {
        for text in ["a", "x y z", "supercalifragilisticexpialidocious", "12 34", "é à ü"] {
            let conf = direct_confidence(text);
            assert!((0.0..=100.0).contains(&conf), "{} -> {}", text, conf);
        }
    }

    #[test]
    fn test_pdf_extract_rejects_garbage() {
        let result = PdfExtractLayer.extract_text(b"not a pdf at all");
        assert!(matches!(result, Err(ExtractionError::DirectExtractionFailure(_))));
    }

    #[test]
    fn test_text_layer_for_kind() {
        assert_eq!(text_layer_for(TextLayerKind::PdfExtract).name(), "pdf-extract");
        assert_eq!(text_layer_for(TextLayerKind::Pdftotext).name(), "pdftotext");
    }
}
