//! Content sniffing for document type detection.

/// Magic header every PDF file starts with.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Whether the bytes carry a PDF header.
pub fn is_pdf_bytes(content: &[u8]) -> bool {
    content.starts_with(PDF_MAGIC)
        && infer::get(content)
            .map(|kind| kind.mime_type() == "application/pdf")
            .unwrap_or(false)
}

/// Whether decoded text looks like an HTML document.
pub fn looks_like_html(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("<html") || lower.contains("<!doctype html")
}

/// Lowercased extension of a filename, without the dot.
pub fn file_extension(filename: &str) -> Option<String> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}
