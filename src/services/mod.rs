//! Service layer for document extraction.
//!
//! Domain logic separated from UI concerns; the CLI drives it through
//! events.

pub mod extraction;

pub use extraction::{
    detect_document_type, BatchSummary, ExtractionEvent, ExtractionService, SourceSummary,
};
