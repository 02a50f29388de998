//! Shared utility functions.
//!
//! - `text`: the cleaning rule applied to all extracted text
//! - `hash`: content hashing and document IDs
//! - `mime`: content sniffing for document type detection

mod hash;
mod mime;
mod text;

pub use hash::{compute_hash, document_id, DOCUMENT_ID_HASH_LEN};
pub use mime::{file_extension, is_pdf_bytes, looks_like_html, PDF_MAGIC};
pub use text::{alpha_ratio, clean_text};
