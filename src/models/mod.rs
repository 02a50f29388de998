//! Data models for documents and extraction results.

mod document;
mod record;

pub use document::{Content, DocumentType, RawDocument};
pub use record::{ExtractionMethod, ExtractionRecord};
