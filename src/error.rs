//! Error types for document extraction.
//!
//! Extraction failures are always recovered at a component boundary and
//! surfaced as strings in `ExtractionRecord::errors`. Configuration errors
//! are the only fatal class and are raised before any document is processed.

use std::path::PathBuf;

use thiserror::Error;

use crate::ocr::OcrError;

/// Errors that can occur while extracting text from a single document.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("HTML parse failed: {0}")]
    ParseFailure(String),

    #[error("Metadata extraction failed: {0}")]
    MetadataExtractionFailure(String),

    #[error("Direct text extraction failed: {0}")]
    DirectExtractionFailure(String),

    #[error("OCR failed: {0}")]
    OcrFailure(String),

    #[error("Unsupported document type: {0}")]
    UnsupportedDocumentType(String),
}

impl From<OcrError> for ExtractionError {
    fn from(e: OcrError) -> Self {
        match e {
            OcrError::OcrFailed(msg) => ExtractionError::OcrFailure(msg),
            other => ExtractionError::OcrFailure(other.to_string()),
        }
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid noise pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid content selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}
