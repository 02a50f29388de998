//! End-to-end extraction through the public service API.

use std::path::Path;
use std::sync::Arc;

use docsift::config::Settings;
use docsift::error::ExtractionError;
use docsift::models::{Content, DocumentType, ExtractionMethod, RawDocument};
use docsift::ocr::{OcrBackend, OcrError, OcrResult};
use docsift::pdf::TextLayer;
use docsift::services::{BatchSummary, ExtractionService};
use docsift::QualityThresholds;
use lopdf::{dictionary, Document, Object};

const PROSE: &str = "Blue Ridge Flight School provides private and commercial pilot \
    training from a towered airport in the valley. The school operates six training \
    aircraft and two simulators, and every student is paired with a dedicated instructor. \
    Lessons are scheduled seven days a week with evening ground school sessions. Graduates \
    regularly continue to instrument ratings and regional airline careers after building \
    time as flight instructors.";

struct StubLayer(&'static str);

impl TextLayer for StubLayer {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn extract_text(&self, _pdf: &[u8]) -> Result<String, ExtractionError> {
        Ok(self.0.to_string())
    }
}

struct ScannedPages;

impl OcrBackend for ScannedPages {
    fn name(&self) -> &'static str {
        "scanned"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        String::new()
    }

    fn ocr_pdf_page(&self, _pdf_path: &Path, page: u32, _scale: f32) -> Result<OcrResult, OcrError> {
        Ok(OcrResult {
            text: format!("Page {} of the scanned brochure. {}", page, PROSE),
            word_confidences: vec![91.0, 89.0],
            backend: "scanned",
            processing_time_ms: 0,
        })
    }
}

fn service_with(layer: &'static str, ocr: Option<Arc<dyn OcrBackend>>) -> ExtractionService {
    ExtractionService::with_backends(&Settings::default(), Arc::new(StubLayer(layer)), ocr)
        .unwrap()
}

fn html_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>Blue Ridge Flight School</title>
  <meta name="description" content="Pilot training in the valley">
  <style>body {{ font-family: sans-serif; }}</style>
  <script>window.analytics = {{ track: function() {{}} }};</script>
</head>
<body>
  <nav class="menu"><a href="/">Home</a><a href="/pricing">Pricing and scheduling</a></nav>
  <div class="cookie-banner">We use cookies to improve your experience on this site.</div>
  <article><p>{}</p></article>
  <footer>Copyright Blue Ridge Flight School. All rights reserved.</footer>
</body>
</html>"#,
        PROSE
    )
}

fn generated_pdf(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            })
            .into()
        })
        .collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Blue Ridge Brochure"),
        "Author" => Object::string_literal("Admissions"),
        "CreationDate" => Object::string_literal("D:20230704120000Z"),
    });
    doc.trailer.set("Info", info_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

#[test]
fn html_noise_is_removed() {
    let service = service_with("", None);
    let record = service.process(
        &Content::from(html_page()),
        "blueridge",
        "https://blueridge.example/",
        None,
        None,
    );

    assert_eq!(record.extraction_method, ExtractionMethod::HtmlCleaning);
    assert_eq!(record.title, "Blue Ridge Flight School");
    assert!(record.text.starts_with("Blue Ridge Flight School provides"));
    for noise in ["analytics", "font-family", "Pricing and scheduling", "cookies", "Copyright"] {
        assert!(!record.text.contains(noise), "noise leaked: {}", noise);
    }
    assert!(record.quality_metrics.total_words > 50);
    assert_eq!(record.metadata["description"], "Pilot training in the valley");
    assert!(record.meets_quality_thresholds(&QualityThresholds::default()));
}

#[test]
fn latin1_html_is_extracted() {
    let service = service_with("", None);
    let html = html_page().replace(
        "Blue Ridge Flight School provides",
        "Caf\u{E9} Blue Ridge provides",
    );
    let bytes: Vec<u8> = html
        .chars()
        .map(|c| if c == '\u{E9}' { 0xE9 } else { c as u8 })
        .collect();
    assert!(std::str::from_utf8(&bytes).is_err());

    let record = service.process(
        &Content::from(bytes),
        "blueridge",
        "https://blueridge.example/",
        None,
        Some("page.html"),
    );

    assert_eq!(record.extraction_method, ExtractionMethod::HtmlCleaning);
    assert!(record.errors.is_empty(), "{:?}", record.errors);
    assert!(record.text.contains("Blue Ridge provides private and commercial pilot"));
    assert!(record.is_success());
}

#[test]
fn pdf_title_and_metadata_come_from_info_dictionary() {
    let service = service_with(PROSE, None);
    let pdf = generated_pdf(2);
    let record = service.process(
        &Content::Bytes(pdf.clone()),
        "blueridge",
        "https://blueridge.example/brochure",
        None,
        None,
    );

    assert_eq!(record.document_type, DocumentType::Pdf);
    assert_eq!(record.extraction_method, ExtractionMethod::Direct);
    assert!(record.is_success(), "errors: {:?}", record.errors);
    assert_eq!(record.title, "Blue Ridge Brochure");
    assert_eq!(record.metadata["author"], "Admissions");
    assert_eq!(record.metadata["pages"], 2);
    assert_eq!(record.metadata["creation_date"], "2023-07-04 12:00:00");
    assert_eq!(record.metadata["file_size"], pdf.len() as u64);
}

#[test]
fn scanned_pdf_uses_ocr_for_every_page() {
    let service = service_with("", Some(Arc::new(ScannedPages)));
    let record = service.process(
        &Content::Bytes(generated_pdf(3)),
        "blueridge",
        "https://blueridge.example/scan.pdf",
        None,
        Some("scan.pdf"),
    );

    assert_eq!(record.extraction_method, ExtractionMethod::Ocr);
    assert!((record.confidence_score - 90.0).abs() < 1e-9);
    assert!(record.text.contains("Page 1 of the scanned brochure"));
    assert!(record.text.contains("Page 3 of the scanned brochure"));
    assert!(!record.text.contains("Page 4"));
}

#[test]
fn document_id_is_stable_across_calls() {
    let service = service_with("", None);
    let content = Content::from(html_page());
    let first = service.process(&content, "blueridge", "u", None, None);
    let second = service.process(&content, "blueridge", "u", None, None);
    let other_source = service.process(&content, "elsewhere", "u", None, None);

    assert_eq!(first.document_id, second.document_id);
    assert_eq!(
        first.document_id.trim_start_matches("blueridge_"),
        other_source.document_id.trim_start_matches("elsewhere_")
    );
}

#[test]
fn serialized_record_flattens_metrics() {
    let service = service_with("", None);
    let record = service.process(&Content::from(html_page()), "blueridge", "u", None, None);
    let value: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();

    for key in [
        "total_chars",
        "total_words",
        "avg_word_length",
        "readability_score",
        "has_meaningful_content",
        "language_confidence",
    ] {
        assert!(value.get(key).is_some(), "missing {}", key);
    }
    assert!(value.get("quality_metrics").is_none());
    assert_eq!(value["extraction_method"], "html_cleaning");
    assert!(value["processing_time"].is_f64());
    assert!(value["extraction_timestamp"].is_string());
}

#[tokio::test]
async fn batch_isolates_malformed_documents() {
    let service = service_with("", None);
    let docs = vec![
        RawDocument::new(html_page(), "first", "https://one.example"),
        RawDocument::new(Vec::<u8>::new(), "broken", "https://two.example")
            .with_filename("broken.html"),
        RawDocument::new(html_page(), "third", "https://three.example"),
    ];

    let records = service.process_batch(docs).await;

    assert_eq!(records.len(), 3);
    let sources: Vec<&str> = records.iter().map(|r| r.source_name.as_str()).collect();
    assert_eq!(sources, ["first", "broken", "third"]);

    assert_eq!(records[1].extraction_method, ExtractionMethod::Failed);
    assert!(!records[1].errors.is_empty());
    assert!(records[1].text.is_empty());
    for record in [&records[0], &records[2]] {
        assert_eq!(record.extraction_method, ExtractionMethod::HtmlCleaning);
        assert!(record.is_success());
        assert_eq!(record.text, records[0].text);
    }

    let summary = BatchSummary::from_records(&records, &QualityThresholds::default());
    assert_eq!(summary.total_documents, 3);
    assert_eq!(summary.successful_extractions, 2);
    assert_eq!(summary.by_source["broken"].successful, 0);
    assert_eq!(summary.errors.len(), 1);
}
