//! The per-document extraction result.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::DocumentType;
use crate::quality::{self, QualityMetrics, QualityThresholds};

/// How the final text of a record was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    HtmlCleaning,
    Direct,
    Ocr,
    Hybrid,
    Failed,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HtmlCleaning => "html_cleaning",
            Self::Direct => "direct",
            Self::Ocr => "ocr",
            Self::Hybrid => "hybrid",
            Self::Failed => "failed",
        }
    }
}

/// Uniform output for one document, regardless of its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// `{source_name}_{first 12 hex chars of the content SHA-256}`.
    pub document_id: String,
    pub source_name: String,
    pub url: String,
    pub document_type: DocumentType,
    pub text: String,
    pub title: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    #[serde(flatten)]
    pub quality_metrics: QualityMetrics,
    pub extraction_method: ExtractionMethod,
    pub confidence_score: f64,
    #[serde(default)]
    pub errors: Vec<String>,
    /// Wall-clock extraction time, serialized as fractional seconds.
    #[serde(with = "duration_secs")]
    pub processing_time: Duration,
    pub extraction_timestamp: DateTime<Utc>,
}

impl ExtractionRecord {
    /// True when extraction completed without recording any error.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Downstream acceptance gate.
    pub fn meets_quality_thresholds(&self, thresholds: &QualityThresholds) -> bool {
        self.is_success()
            && quality::meets_threshold(&self.quality_metrics, self.confidence_score, thresholds)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
