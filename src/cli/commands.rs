//! CLI commands implementation.

mod extract;
mod tools;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;
use crate::models::DocumentType;

#[derive(Parser)]
#[command(name = "docsift")]
#[command(about = "Extract clean, quality-scored text from HTML and PDF documents")]
#[command(version)]
pub struct Cli {
    /// Config file (TOML or JSON)
    #[arg(long, global = true, env = "DOCSIFT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from local HTML and PDF files
    Extract {
        /// Files to extract
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Source name recorded on every document
        #[arg(long, default_value = "local")]
        source: String,
        /// Source URL (defaults to a file:// URL per document)
        #[arg(long)]
        url: Option<String>,
        /// Document type, skipping detection (html or pdf)
        #[arg(long = "type", value_name = "TYPE")]
        doc_type: Option<DocumentType>,
        /// Directory for per-document JSON and the batch summary
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Disable the OCR fallback for PDFs
        #[arg(long)]
        no_ocr: bool,
        /// Number of workers (0 = one per CPU core)
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Check availability of external PDF and OCR tools
    Tools,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract {
            files,
            source,
            url,
            doc_type,
            output,
            no_ocr,
            workers,
        } => {
            if no_ocr {
                settings.pdf.ocr_enabled = false;
            }
            if let Some(workers) = workers {
                settings.batch.workers = workers;
            }
            extract::cmd_extract(
                &settings,
                extract::ExtractArgs {
                    files,
                    source,
                    url,
                    doc_type,
                    output,
                },
            )
            .await
        }
        Commands::Tools => tools::cmd_tools(&settings),
    }
}
