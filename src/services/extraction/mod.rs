//! Document extraction service.
//!
//! Detects the document type, dispatches to the HTML or PDF extractor and
//! assembles a uniform `ExtractionRecord`. Batches run on tokio's blocking
//! pool and emit events for progress tracking.

mod types;

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::ConfigError;
use crate::html::HtmlExtractor;
use crate::models::{Content, DocumentType, ExtractionMethod, ExtractionRecord, RawDocument};
use crate::ocr::{OcrBackend, TesseractBackend};
use crate::pdf::{panic_message, text_layer_for, PdfExtractor, TextLayer};
use crate::quality::{self, QualityMetrics};
use crate::utils::{document_id, file_extension, is_pdf_bytes, looks_like_html};

pub use types::{BatchSummary, ExtractionEvent, SourceSummary};

/// Detect the type of a document from its filename, then its content.
///
/// Defaults to HTML when nothing decides.
pub fn detect_document_type(content: &Content, filename: Option<&str>) -> DocumentType {
    if let Some(ext) = filename.and_then(file_extension) {
        match ext.as_str() {
            "pdf" => return DocumentType::Pdf,
            "html" | "htm" => return DocumentType::Html,
            _ => {}
        }
    }

    match content {
        Content::Bytes(bytes) if is_pdf_bytes(bytes) => DocumentType::Pdf,
        Content::Bytes(bytes) => {
            if looks_like_html(&String::from_utf8_lossy(bytes)) {
                return DocumentType::Html;
            }
            debug!("Could not detect document type, assuming HTML");
            DocumentType::Html
        }
        Content::Text(text) => {
            if !looks_like_html(text) {
                debug!("Could not detect document type, assuming HTML");
            }
            DocumentType::Html
        }
    }
}

/// Output of a single extractor run, before record assembly.
struct Extracted {
    text: String,
    title: String,
    metadata: BTreeMap<String, Value>,
    quality_metrics: QualityMetrics,
    method: ExtractionMethod,
    confidence: f64,
    errors: Vec<String>,
}

impl Extracted {
    fn failed(error: String) -> Self {
        Self {
            text: String::new(),
            title: String::new(),
            metadata: BTreeMap::new(),
            quality_metrics: QualityMetrics::default(),
            method: ExtractionMethod::Failed,
            confidence: 0.0,
            errors: vec![error],
        }
    }
}

/// Service that turns raw documents into extraction records.
///
/// Cheap to clone: extractors are immutable and shared.
#[derive(Clone)]
pub struct ExtractionService {
    html: Arc<HtmlExtractor>,
    pdf: Arc<PdfExtractor>,
    workers: usize,
}

impl ExtractionService {
    /// Build the service with the configured text layer and Tesseract OCR.
    pub fn new(settings: &Settings) -> Result<Self, ConfigError> {
        let text_layer: Arc<dyn TextLayer> = Arc::from(text_layer_for(settings.pdf.text_layer));
        let ocr: Arc<dyn OcrBackend> = Arc::new(TesseractBackend::with_config(settings.ocr.clone()));
        Self::with_backends(settings, text_layer, Some(ocr))
    }

    /// Build the service with explicit backends.
    pub fn with_backends(
        settings: &Settings,
        text_layer: Arc<dyn TextLayer>,
        ocr_backend: Option<Arc<dyn OcrBackend>>,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            html: Arc::new(HtmlExtractor::new(&settings.html)?),
            pdf: Arc::new(PdfExtractor::new(
                settings.pdf.clone(),
                text_layer,
                ocr_backend,
            )),
            workers: settings.batch.effective_workers(),
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Extract a single document.
    ///
    /// Never fails: extraction problems, including panics inside a backend,
    /// produce a record with method `failed` and a populated `errors` list.
    pub fn process(
        &self,
        content: &Content,
        source_name: &str,
        url: &str,
        document_type: Option<DocumentType>,
        filename: Option<&str>,
    ) -> ExtractionRecord {
        let start = Instant::now();
        let document_id = document_id(source_name, content.as_bytes());
        let document_type =
            document_type.unwrap_or_else(|| detect_document_type(content, filename));

        debug!("Processing {} as {}", document_id, document_type);

        let extracted = match panic::catch_unwind(AssertUnwindSafe(|| match document_type {
            DocumentType::Html => self.extract_html(content, url),
            DocumentType::Pdf => self.extract_pdf(content.as_bytes(), filename),
        })) {
            Ok(extracted) => extracted,
            Err(payload) => {
                Extracted::failed(format!("Extraction panicked: {}", panic_message(payload.as_ref())))
            }
        };

        let record = ExtractionRecord {
            document_id,
            source_name: source_name.to_string(),
            url: url.to_string(),
            document_type,
            text: extracted.text,
            title: extracted.title,
            metadata: extracted.metadata,
            quality_metrics: extracted.quality_metrics,
            extraction_method: extracted.method,
            confidence_score: extracted.confidence,
            errors: extracted.errors,
            processing_time: start.elapsed(),
            extraction_timestamp: Utc::now(),
        };

        if record.extraction_method == ExtractionMethod::Failed {
            warn!(
                "Extraction failed for {}: {}",
                record.document_id,
                record.errors.join("; ")
            );
        } else {
            info!(
                "Extracted {} ({}, {} words, confidence {:.1}) in {:.2}s",
                record.document_id,
                record.extraction_method.as_str(),
                record.quality_metrics.total_words,
                record.confidence_score,
                record.processing_time.as_secs_f64()
            );
        }

        record
    }

    /// Extract a crawler-supplied document.
    pub fn process_raw(&self, doc: &RawDocument) -> ExtractionRecord {
        self.process(
            &doc.content,
            &doc.source_name,
            &doc.url,
            doc.document_type,
            doc.filename.as_deref(),
        )
    }

    fn extract_html(&self, content: &Content, url: &str) -> Extracted {
        let source_url = Some(url).filter(|u| !u.is_empty());
        let result = match content {
            Content::Text(text) => self.html.extract_str(text, source_url),
            Content::Bytes(bytes) => self.html.extract(bytes, source_url),
        };

        match result.error {
            Some(error) => Extracted::failed(error.to_string()),
            None => Extracted {
                confidence: quality::score(&result.quality_metrics),
                text: result.cleaned_text,
                title: result.title,
                metadata: result.metadata,
                quality_metrics: result.quality_metrics,
                method: ExtractionMethod::HtmlCleaning,
                errors: Vec::new(),
            },
        }
    }

    fn extract_pdf(&self, pdf: &[u8], filename: Option<&str>) -> Extracted {
        let result = self.pdf.extract(pdf, filename);
        Extracted {
            text: result.text,
            title: result.metadata.title.clone().unwrap_or_default(),
            metadata: result.metadata.to_map(),
            quality_metrics: result.quality_metrics,
            method: result.extraction_method,
            confidence: result.confidence_score,
            errors: result.errors,
        }
    }

    /// Extract a batch of documents, returning records in input order.
    pub async fn process_batch(&self, docs: Vec<RawDocument>) -> Vec<ExtractionRecord> {
        self.run_batch(docs, None).await
    }

    /// Extract a batch while reporting progress on `event_tx`.
    ///
    /// Workers wait for channel capacity before every event, holding their
    /// concurrency permit. The receiver must be drained concurrently (for
    /// example from a spawned task) unless the channel can hold
    /// `2 * docs.len() + 2` events; otherwise the batch stalls.
    pub async fn process_batch_with_events(
        &self,
        docs: Vec<RawDocument>,
        event_tx: mpsc::Sender<ExtractionEvent>,
    ) -> Vec<ExtractionRecord> {
        self.run_batch(docs, Some(event_tx)).await
    }

    async fn run_batch(
        &self,
        docs: Vec<RawDocument>,
        event_tx: Option<mpsc::Sender<ExtractionEvent>>,
    ) -> Vec<ExtractionRecord> {
        let total = docs.len();
        if let Some(tx) = &event_tx {
            let _ = tx
                .send(ExtractionEvent::BatchStarted {
                    total_documents: total,
                })
                .await;
        }

        let semaphore = Arc::new(Semaphore::new(self.workers.max(1)));
        let mut handles = Vec::with_capacity(total);

        for (index, doc) in docs.into_iter().enumerate() {
            let fallback = FailedStub::for_document(&doc);
            let permit = semaphore.clone().acquire_owned().await.ok();
            let service = self.clone();
            let event_tx = event_tx.clone();

            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                service.process_reporting(index, &doc, event_tx.as_ref())
            });
            handles.push((handle, fallback));
        }

        let mut records = Vec::with_capacity(total);
        for (index, (handle, fallback)) in handles.into_iter().enumerate() {
            let record = match handle.await {
                Ok(record) => record,
                Err(e) => {
                    warn!("Worker for {} failed: {}", fallback.document_id, e);
                    let record = fallback.into_record(format!("Worker failed: {}", e));
                    if let Some(tx) = &event_tx {
                        let _ = tx
                            .send(ExtractionEvent::DocumentFailed {
                                index,
                                document_id: record.document_id.clone(),
                                error: record.errors.join("; "),
                            })
                            .await;
                    }
                    record
                }
            };
            records.push(record);
        }

        let succeeded = records.iter().filter(|r| r.is_success()).count();
        info!(
            "Batch complete: {}/{} documents without errors",
            succeeded, total
        );
        if let Some(tx) = &event_tx {
            let _ = tx
                .send(ExtractionEvent::BatchComplete {
                    succeeded,
                    failed: total - succeeded,
                })
                .await;
        }

        records
    }

    /// Process one batch entry on a blocking worker, emitting events.
    fn process_reporting(
        &self,
        index: usize,
        doc: &RawDocument,
        event_tx: Option<&mpsc::Sender<ExtractionEvent>>,
    ) -> ExtractionRecord {
        // Blocking sends: we are on the blocking pool, not inside the runtime.
        let send = |event: ExtractionEvent| {
            if let Some(tx) = event_tx {
                let _ = futures::executor::block_on(tx.send(event));
            }
        };

        send(ExtractionEvent::DocumentStarted {
            index,
            document_id: document_id(&doc.source_name, doc.content.as_bytes()),
            source_name: doc.source_name.clone(),
        });

        let record = self.process_raw(doc);

        if record.is_success() {
            send(ExtractionEvent::DocumentCompleted {
                index,
                document_id: record.document_id.clone(),
                method: record.extraction_method,
                confidence: record.confidence_score,
            });
        } else {
            send(ExtractionEvent::DocumentFailed {
                index,
                document_id: record.document_id.clone(),
                error: record.errors.join("; "),
            });
        }

        record
    }
}

/// Identity of a batch entry, kept so a crashed worker still yields a record.
struct FailedStub {
    document_id: String,
    source_name: String,
    url: String,
    document_type: DocumentType,
}

impl FailedStub {
    fn for_document(doc: &RawDocument) -> Self {
        Self {
            document_id: document_id(&doc.source_name, doc.content.as_bytes()),
            source_name: doc.source_name.clone(),
            url: doc.url.clone(),
            document_type: doc
                .document_type
                .unwrap_or_else(|| detect_document_type(&doc.content, doc.filename.as_deref())),
        }
    }

    fn into_record(self, error: String) -> ExtractionRecord {
        ExtractionRecord {
            document_id: self.document_id,
            source_name: self.source_name,
            url: self.url,
            document_type: self.document_type,
            text: String::new(),
            title: String::new(),
            metadata: BTreeMap::new(),
            quality_metrics: QualityMetrics::default(),
            extraction_method: ExtractionMethod::Failed,
            confidence_score: 0.0,
            errors: vec![error],
            processing_time: Duration::ZERO,
            extraction_timestamp: Utc::now(),
        }
    }
}
