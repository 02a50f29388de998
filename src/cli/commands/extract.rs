//! The `extract` command: run a batch over local files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use crate::config::Settings;
use crate::models::{DocumentType, ExtractionRecord, RawDocument};
use crate::quality::QualityThresholds;
use crate::services::extraction::{BatchSummary, ExtractionEvent, ExtractionService};

/// Name of the summary file written next to the records.
const SUMMARY_FILE: &str = "batch_summary.json";

pub struct ExtractArgs {
    pub files: Vec<PathBuf>,
    pub source: String,
    pub url: Option<String>,
    pub doc_type: Option<DocumentType>,
    pub output: Option<PathBuf>,
}

/// Extract every file and write or print the records.
pub async fn cmd_extract(settings: &Settings, args: ExtractArgs) -> anyhow::Result<()> {
    let service = ExtractionService::new(settings)?;

    let docs = args
        .files
        .iter()
        .map(|path| load_document(path, &args))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let progress_style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")?
        .progress_chars("█▓░");

    let (event_tx, mut event_rx) = mpsc::channel::<ExtractionEvent>(100);

    let event_handler = tokio::spawn(async move {
        let mut progress: Option<ProgressBar> = None;

        while let Some(event) = event_rx.recv().await {
            match event {
                ExtractionEvent::BatchStarted { total_documents } => {
                    let pb = ProgressBar::new(total_documents as u64);
                    pb.set_style(progress_style.clone());
                    pb.set_message("Extracting...");
                    progress = Some(pb);
                }
                ExtractionEvent::DocumentStarted { document_id, .. } => {
                    if let Some(ref pb) = progress {
                        pb.set_message(document_id);
                    }
                }
                ExtractionEvent::DocumentCompleted { .. } => {
                    if let Some(ref pb) = progress {
                        pb.inc(1);
                    }
                }
                ExtractionEvent::DocumentFailed { document_id, error, .. } => {
                    let line = format!("  {} {}: {}", style("✗").red(), document_id, error);
                    match progress {
                        Some(ref pb) => {
                            pb.suspend(|| eprintln!("{}", line));
                            pb.inc(1);
                        }
                        None => eprintln!("{}", line),
                    }
                }
                ExtractionEvent::BatchComplete { .. } => {
                    if let Some(pb) = progress.take() {
                        pb.finish_and_clear();
                    }
                }
            }
        }
    });

    let records = service.process_batch_with_events(docs, event_tx).await;
    let _ = event_handler.await;

    let summary = BatchSummary::from_records(&records, &QualityThresholds::default());

    match args.output {
        Some(ref dir) => write_outputs(dir, &records, &summary)?,
        None => println!("{}", serde_json::to_string_pretty(&records)?),
    }

    eprintln!(
        "{} {}/{} documents extracted, {} passed quality thresholds",
        style("✓").green(),
        summary.successful_extractions,
        summary.total_documents,
        summary.quality_passed
    );
    if let Some(ref dir) = args.output {
        eprintln!("  {} {}", style("→").dim(), dir.display());
    }

    Ok(())
}

fn load_document(path: &Path, args: &ExtractArgs) -> anyhow::Result<RawDocument> {
    let content =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let url = match args.url {
        Some(ref url) => url.clone(),
        None => {
            let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
            format!("file://{}", absolute.display())
        }
    };

    let mut doc = RawDocument::new(content, args.source.clone(), url);
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        doc = doc.with_filename(name);
    }
    if let Some(doc_type) = args.doc_type {
        doc = doc.with_type(doc_type);
    }
    Ok(doc)
}

fn write_outputs(
    dir: &Path,
    records: &[ExtractionRecord],
    summary: &BatchSummary,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    for record in records {
        let path = dir.join(format!("{}.json", record.document_id));
        std::fs::write(&path, record.to_json()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    let summary_path = dir.join(SUMMARY_FILE);
    std::fs::write(&summary_path, summary.to_json()?)
        .with_context(|| format!("Failed to write {}", summary_path.display()))?;

    Ok(())
}
