//! Text cleanup applied to every extraction result, HTML or PDF.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static BLANK_LINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n+").expect("valid regex"));
static INLINE_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid regex"));

/// Lines shorter than this (after trimming) are dropped.
pub const MIN_LINE_CHARS: usize = 10;

/// Lines longer than this are dropped when mostly non-alphabetic.
pub const SYMBOL_LINE_MIN_CHARS: usize = 20;

/// Minimum alphabetic ratio for a long line to survive.
pub const MIN_ALPHA_RATIO: f64 = 0.3;

/// Normalize and filter raw extracted text.
///
/// NFC-normalizes, collapses blank-line runs and inline whitespace, then drops
/// short lines and long symbol-heavy lines (navigation residue, page numbers,
/// table rules).
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let normalized: String = text.nfc().collect();
    let collapsed = BLANK_LINES_RE.replace_all(&normalized, "\n\n");
    let collapsed = INLINE_SPACE_RE.replace_all(&collapsed, " ");

    let kept: Vec<&str> = collapsed
        .split('\n')
        .map(str::trim)
        .filter(|line| keep_line(line))
        .collect();

    kept.join("\n").trim().to_string()
}

fn keep_line(line: &str) -> bool {
    let len = line.chars().count();
    if len < MIN_LINE_CHARS {
        return false;
    }
    if len > SYMBOL_LINE_MIN_CHARS && alpha_ratio(line) < MIN_ALPHA_RATIO {
        return false;
    }
    true
}

/// Fraction of characters that are alphabetic. Empty input is 0.
pub fn alpha_ratio(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let alpha = text.chars().filter(|c| c.is_alphabetic()).count();
    alpha as f64 / total as f64
}
