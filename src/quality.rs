//! Text quality metrics and scoring.
//!
//! Shared by the HTML and PDF paths. Everything here is pure: the same text
//! always yields the same metrics and the same score.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid regex"));
static SENTENCE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("valid regex"));

/// Metrics for assessing text extraction quality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub total_chars: usize,
    pub total_words: usize,
    /// Mean characters per word token.
    pub avg_word_length: f64,
    /// `100 - avg_words_per_sentence`, floored at 0.
    pub readability_score: f64,
    pub has_meaningful_content: bool,
    /// Fraction of word tokens made only of alphabetic characters.
    pub language_confidence: f64,
}

/// Thresholds for downstream acceptance gates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityThresholds {
    pub min_words: usize,
    pub min_readability: f64,
    pub min_confidence: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_words: 50,
            min_readability: 20.0,
            min_confidence: 60.0,
        }
    }
}

/// Metrics-only gate, without a derived score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimumQuality {
    pub min_words: usize,
    pub min_readability: f64,
    pub min_language_confidence: f64,
}

impl Default for MinimumQuality {
    fn default() -> Self {
        Self {
            min_words: 50,
            min_readability: 20.0,
            min_language_confidence: 0.7,
        }
    }
}

/// Word tokens as the scorer sees them.
pub(crate) fn words(text: &str) -> impl Iterator<Item = &str> {
    WORD_RE.find_iter(text).map(|m| m.as_str())
}

/// Compute quality metrics for a text. Empty input yields zeroed metrics.
pub fn compute_metrics(text: &str) -> QualityMetrics {
    if text.is_empty() {
        return QualityMetrics::default();
    }

    let mut total_words = 0usize;
    let mut word_chars = 0usize;
    let mut alphabetic_words = 0usize;

    for word in words(text) {
        total_words += 1;
        word_chars += word.chars().count();
        if word.chars().all(char::is_alphabetic) {
            alphabetic_words += 1;
        }
    }

    let avg_word_length = if total_words > 0 {
        word_chars as f64 / total_words as f64
    } else {
        0.0
    };

    // split() always yields at least one piece
    let sentences = SENTENCE_SPLIT_RE.split(text).count();
    let avg_words_per_sentence = total_words as f64 / sentences as f64;
    let readability_score = (100.0 - avg_words_per_sentence).max(0.0);

    let has_meaningful_content =
        total_words > 50 && avg_word_length > 3.0 && readability_score > 20.0;

    let language_confidence = if total_words > 0 {
        alphabetic_words as f64 / total_words as f64
    } else {
        0.0
    };

    QualityMetrics {
        total_chars: text.chars().count(),
        total_words,
        avg_word_length,
        readability_score,
        has_meaningful_content,
        language_confidence,
    }
}

/// Overall quality score in `[0, 100]`.
///
/// Weighted blend of word volume (saturating at 200 words), readability and
/// language confidence. Text without words scores 0.
pub fn score(metrics: &QualityMetrics) -> f64 {
    if metrics.total_words == 0 {
        return 0.0;
    }

    let word_score = (metrics.total_words as f64 / 2.0).min(100.0);
    let readability = metrics.readability_score.clamp(0.0, 100.0);
    let language = metrics.language_confidence * 100.0;

    word_score * 0.4 + readability * 0.3 + language * 0.3
}

/// Acceptance gate combining metrics with a derived score.
pub fn meets_threshold(
    metrics: &QualityMetrics,
    score: f64,
    thresholds: &QualityThresholds,
) -> bool {
    metrics.total_words >= thresholds.min_words
        && metrics.readability_score >= thresholds.min_readability
        && score >= thresholds.min_confidence
        && metrics.has_meaningful_content
}

/// Metrics-only acceptance gate.
pub fn meets_minimum_quality(metrics: &QualityMetrics, minimum: &MinimumQuality) -> bool {
    metrics.total_words >= minimum.min_words
        && metrics.readability_score >= minimum.min_readability
        && metrics.language_confidence >= minimum.min_language_confidence
        && metrics.has_meaningful_content
}
