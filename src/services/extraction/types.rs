//! Extraction service types and events.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ExtractionMethod, ExtractionRecord};
use crate::quality::QualityThresholds;

/// Events emitted during batch extraction.
#[derive(Debug, Clone)]
pub enum ExtractionEvent {
    /// Batch accepted
    BatchStarted { total_documents: usize },
    /// A worker picked up a document
    DocumentStarted {
        index: usize,
        document_id: String,
        source_name: String,
    },
    /// Document produced usable text
    DocumentCompleted {
        index: usize,
        document_id: String,
        method: ExtractionMethod,
        confidence: f64,
    },
    /// Document failed or finished with errors
    DocumentFailed {
        index: usize,
        document_id: String,
        error: String,
    },
    /// All records collected
    BatchComplete { succeeded: usize, failed: usize },
}

/// Per-source counts in a batch summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub total: usize,
    pub successful: usize,
}

/// Aggregate view of a processed batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch_timestamp: DateTime<Utc>,
    pub total_documents: usize,
    pub successful_extractions: usize,
    pub quality_passed: usize,
    pub by_source: BTreeMap<String, SourceSummary>,
    pub by_document_type: BTreeMap<String, usize>,
    pub errors: Vec<String>,
}

impl BatchSummary {
    pub fn from_records(records: &[ExtractionRecord], thresholds: &QualityThresholds) -> Self {
        let mut summary = Self {
            batch_timestamp: Utc::now(),
            total_documents: records.len(),
            successful_extractions: 0,
            quality_passed: 0,
            by_source: BTreeMap::new(),
            by_document_type: BTreeMap::new(),
            errors: Vec::new(),
        };

        for record in records {
            let success = record.is_success();
            if success {
                summary.successful_extractions += 1;
            }
            if record.meets_quality_thresholds(thresholds) {
                summary.quality_passed += 1;
            }

            let source = summary
                .by_source
                .entry(record.source_name.clone())
                .or_default();
            source.total += 1;
            if success {
                source.successful += 1;
            }

            *summary
                .by_document_type
                .entry(record.document_type.as_str().to_string())
                .or_default() += 1;

            summary.errors.extend(record.errors.iter().cloned());
        }

        summary
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
