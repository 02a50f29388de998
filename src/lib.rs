//! docsift - document text extraction and quality assessment.
//!
//! Turns raw HTML pages and PDF files collected by a crawler into clean,
//! quality-scored plain text with provenance metadata. HTML is stripped of
//! navigation and advertising chrome; PDFs are read through their text layer
//! with an OCR fallback for scanned or garbled documents.

pub mod cli;
pub mod config;
pub mod error;
pub mod html;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod quality;
pub mod services;
pub mod utils;

pub use config::Settings;
pub use error::{ConfigError, ExtractionError};
pub use models::{Content, DocumentType, ExtractionMethod, ExtractionRecord, RawDocument};
pub use quality::{QualityMetrics, QualityThresholds};
pub use services::{BatchSummary, ExtractionEvent, ExtractionService};
