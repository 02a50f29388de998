//! The `tools` command: report external tool availability.

use console::style;

use crate::config::{Settings, TextLayerKind};
use crate::ocr::{check_tools, OcrBackend, TesseractBackend};

/// Print which PDF and OCR tools are installed.
pub fn cmd_tools(settings: &Settings) -> anyhow::Result<()> {
    println!("\n{}", style("Extraction Tool Status").bold());
    println!("{}", "-".repeat(50));

    println!("\n{}", style("External Tools:").cyan());
    let mut all_found = true;
    for (tool, available) in check_tools() {
        let status = if available {
            style("✓ found").green()
        } else {
            all_found = false;
            style("✗ not found").red()
        };
        println!("  {:<15} {}", tool, status);
    }

    println!("\n{}", style("OCR Backend:").cyan());
    let tesseract = TesseractBackend::with_config(settings.ocr.clone());
    let status = if tesseract.is_available() {
        style("✓ available").green()
    } else {
        style("✗ not available").red()
    };
    println!("  {:<15} {}", "Tesseract", status);
    if !tesseract.is_available() {
        println!("                  {}", style(tesseract.availability_hint()).dim());
    }

    let text_layer = match settings.pdf.text_layer {
        TextLayerKind::PdfExtract => "pdf-extract (built in)",
        TextLayerKind::Pdftotext => "pdftotext",
    };
    println!("\n{} {}", style("Text layer:").cyan(), text_layer);
    println!(
        "{} {}",
        style("OCR fallback:").cyan(),
        if settings.pdf.ocr_enabled { "enabled" } else { "disabled" }
    );

    if !all_found {
        println!(
            "\n{} Missing tools limit PDF extraction; pdf-extract still reads text layers.",
            style("!").yellow()
        );
        println!("  Install with: apt install poppler-utils tesseract-ocr");
    }

    Ok(())
}
