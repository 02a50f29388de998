//! Helpers for the external command-line tools used for PDF work.

use std::process::Output;

/// Poppler and Tesseract binaries the CLI-backed extractors shell out to.
pub const EXTERNAL_TOOLS: &[&str] = &["pdftotext", "pdftoppm", "pdfinfo", "tesseract"];

pub const PDFTOTEXT_NOT_FOUND: &str = "pdftotext not found (install poppler-utils)";
pub const PDFTOPPM_NOT_FOUND: &str = "pdftoppm not found (install poppler-utils)";
pub const TESSERACT_NOT_FOUND: &str = "tesseract not found (install tesseract-ocr)";

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Availability of every external tool, in a fixed order.
pub fn check_tools() -> Vec<(String, bool)> {
    EXTERNAL_TOOLS
        .iter()
        .map(|tool| (tool.to_string(), check_binary(tool)))
        .collect()
}

/// Why a command produced no usable stdout.
#[derive(Debug)]
pub enum CommandFailure {
    /// The binary is not installed.
    NotFound,
    /// The binary ran and exited non-zero; carries stderr.
    Failed(String),
    Io(std::io::Error),
}

/// Extract stdout on success, classifying the failure otherwise.
pub fn command_stdout(result: std::io::Result<Output>) -> Result<String, CommandFailure> {
    match result {
        Ok(output) if output.status.success() => {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        }
        Ok(output) => Err(CommandFailure::Failed(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        )),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CommandFailure::NotFound),
        Err(e) => Err(CommandFailure::Io(e)),
    }
}
