//! OCR for image-only and garbled PDFs.
//!
//! The engine is an injected capability: `PdfExtractor` holds an
//! `Arc<dyn OcrBackend>` and never touches a global recognizer.
//!
//! ## Backends
//!
//! - **Tesseract**: rasterizes with `pdftoppm`, recognizes with `tesseract`
//!   in TSV mode for per-word confidence (default)

mod backend;
mod tesseract;
mod tools;

pub use backend::{OcrBackend, OcrError, OcrResult};
pub use tesseract::TesseractBackend;
pub use tools::{check_binary, check_tools, EXTERNAL_TOOLS};

pub(crate) use tools::{command_stdout, CommandFailure, PDFTOTEXT_NOT_FOUND};
