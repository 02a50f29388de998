//! PDF document metadata from the info dictionary.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use lopdf::{Dictionary, Document, Object};
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// Info-dictionary fields plus structural facts about the file.
///
/// A missing entry is `None`; an entry present with an empty string is
/// `Some("")`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    /// Normalized `YYYY-MM-DD HH:MM:SS`.
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub pages: u32,
    pub encrypted: bool,
    pub file_size: u64,
}

impl PdfMetadata {
    /// Defaults for a file whose structure could not be read.
    pub fn unreadable(file_size: u64) -> Self {
        Self {
            file_size,
            ..Self::default()
        }
    }

    /// Flatten into the string-keyed map carried by extraction records.
    pub fn to_map(&self) -> BTreeMap<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        }
    }
}

/// Read metadata from an in-memory PDF.
pub fn read_metadata(pdf: &[u8]) -> Result<PdfMetadata, ExtractionError> {
    let doc = Document::load_mem(pdf)
        .map_err(|e| ExtractionError::MetadataExtractionFailure(e.to_string()))?;

    let mut metadata = PdfMetadata {
        pages: doc.get_pages().len() as u32,
        encrypted: doc.trailer.get(b"Encrypt").is_ok(),
        file_size: pdf.len() as u64,
        ..PdfMetadata::default()
    };

    if let Some(info) = info_dictionary(&doc) {
        metadata.title = info_string(&doc, info, b"Title");
        metadata.author = info_string(&doc, info, b"Author");
        metadata.subject = info_string(&doc, info, b"Subject");
        metadata.creator = info_string(&doc, info, b"Creator");
        metadata.producer = info_string(&doc, info, b"Producer");
        metadata.creation_date =
            info_string(&doc, info, b"CreationDate").and_then(|d| parse_pdf_date(&d));
        metadata.modification_date =
            info_string(&doc, info, b"ModDate").and_then(|d| parse_pdf_date(&d));
    }

    Ok(metadata)
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn info_string(doc: &Document, info: &Dictionary, key: &[u8]) -> Option<String> {
    let mut value = info.get(key).ok()?;
    if let Object::Reference(id) = value {
        value = doc.get_object(*id).ok()?;
    }
    match value {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        Object::Name(bytes) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE when it carries a byte-order mark,
/// otherwise UTF-8, falling back to Latin-1.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Normalize a PDF date (`D:YYYYMMDDHHmmSS...`) to `YYYY-MM-DD HH:MM:SS`.
///
/// Missing time components default to `00`; the timezone suffix is ignored.
/// Anything malformed yields `None`.
pub fn parse_pdf_date(raw: &str) -> Option<String> {
    let s = raw.trim();
    let s = s.strip_prefix("D:").unwrap_or(s);

    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).take(14).collect();
    if digits.len() < 8 || digits.len() % 2 != 0 {
        return None;
    }

    let num = |range: std::ops::Range<usize>| -> Option<u32> {
        digits.get(range).map_or(Some(0), |part| part.parse().ok())
    };

    let year: i32 = digits[0..4].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, num(4..6)?, num(6..8)?)?;
    let time = NaiveTime::from_hms_opt(num(8..10)?, num(10..12)?, num(12..14)?)?;

    Some(
        NaiveDateTime::new(date, time)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
    )
}
