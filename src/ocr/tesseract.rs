//! Tesseract OCR backend.
//!
//! Rasterizes pages with `pdftoppm` and runs `tesseract` in TSV mode so that
//! per-word confidence comes back alongside the text.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use tempfile::TempDir;

use super::backend::{OcrBackend, OcrError, OcrResult};
use super::tools::{
    check_binary, command_stdout, CommandFailure, PDFTOPPM_NOT_FOUND, TESSERACT_NOT_FOUND,
};
use crate::config::OcrConfig;

/// Base resolution that raster scale factors multiply.
const BASE_DPI: f32 = 72.0;

/// TSV row level for individual words.
const WORD_LEVEL: u32 = 5;

/// Tesseract OCR backend.
pub struct TesseractBackend {
    config: OcrConfig,
}

impl TesseractBackend {
    /// Create a new Tesseract backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: OcrConfig::default(),
        }
    }

    /// Create a new Tesseract backend with custom configuration.
    pub fn with_config(config: OcrConfig) -> Self {
        Self { config }
    }

    /// Run Tesseract on an image file, returning raw TSV.
    fn run_tesseract(&self, image_path: &Path) -> Result<String, OcrError> {
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.config.language])
            .args(&self.config.tesseract_args)
            .arg("tsv")
            .output();

        command_stdout(output).map_err(|failure| match failure {
            CommandFailure::NotFound => {
                OcrError::BackendNotAvailable(TESSERACT_NOT_FOUND.to_string())
            }
            CommandFailure::Failed(stderr) => {
                OcrError::OcrFailed(format!("tesseract failed: {}", stderr))
            }
            CommandFailure::Io(e) => OcrError::Io(e),
        })
    }

    /// Convert a PDF page to a PNG image.
    fn pdf_page_to_image(
        &self,
        pdf_path: &Path,
        page: u32,
        scale: f32,
        output_dir: &Path,
    ) -> Result<PathBuf, OcrError> {
        let page_str = page.to_string();
        let dpi = (BASE_DPI * scale).round().max(1.0) as u32;
        let dpi_str = dpi.to_string();

        let status = Command::new("pdftoppm")
            .args(["-png", "-r", &dpi_str, "-f", &page_str, "-l", &page_str])
            .arg(pdf_path)
            .arg(output_dir.join("page"))
            .status();

        match status {
            Ok(s) if s.success() => find_page_image(output_dir, page)
                .ok_or_else(|| OcrError::OcrFailed(format!("No image generated for page {}", page))),
            Ok(_) => Err(OcrError::OcrFailed(format!(
                "pdftoppm failed to convert page {}",
                page
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                OcrError::BackendNotAvailable(PDFTOPPM_NOT_FOUND.to_string()),
            ),
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrBackend for TesseractBackend {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        check_binary("tesseract") && check_binary("pdftoppm")
    }

    fn availability_hint(&self) -> String {
        if !check_binary("tesseract") {
            "Tesseract not installed. Install with: apt install tesseract-ocr".to_string()
        } else if !check_binary("pdftoppm") {
            "pdftoppm not installed. Install with: apt install poppler-utils".to_string()
        } else {
            "Tesseract is available".to_string()
        }
    }

    fn page_count(&self, pdf_path: &Path) -> Option<u32> {
        let output = Command::new("pdfinfo").arg(pdf_path).output().ok()?;
        if !output.status.success() {
            return None;
        }
        parse_pdfinfo_pages(&String::from_utf8_lossy(&output.stdout))
    }

    fn ocr_pdf_page(
        &self,
        pdf_path: &Path,
        page: u32,
        scale: f32,
    ) -> Result<OcrResult, OcrError> {
        let start = Instant::now();

        let temp_dir = TempDir::new()?;
        let image_path = self.pdf_page_to_image(pdf_path, page, scale, temp_dir.path())?;
        let tsv = self.run_tesseract(&image_path)?;
        let (text, word_confidences) = parse_tsv(&tsv);

        Ok(OcrResult {
            text,
            word_confidences,
            backend: self.name(),
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Find the image file for a specific page number.
///
/// pdftoppm names files like page-01.png, page-02.png, etc.
/// The padding width varies based on total page count.
fn find_page_image(temp_path: &Path, page_num: u32) -> Option<PathBuf> {
    for digits in [1, 2, 3, 4] {
        let filename = format!("page-{:0width$}.png", page_num, width = digits);
        let path = temp_path.join(&filename);
        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// Read the page count from `pdfinfo` output.
fn parse_pdfinfo_pages(output: &str) -> Option<u32> {
    output
        .lines()
        .find(|line| line.starts_with("Pages:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse().ok())
}

/// Rebuild text and collect word confidences from Tesseract TSV output.
///
/// Words on the same line are joined by spaces, lines by newlines, and
/// paragraphs by a blank line. Rows with confidence -1 are structural and
/// carry no word.
pub(crate) fn parse_tsv(tsv: &str) -> (String, Vec<f32>) {
    let mut text = String::new();
    let mut confidences = Vec::new();
    let mut current_line: Option<(u32, u32, u32)> = None;

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }

        let level: u32 = match cols[0].parse() {
            Ok(l) => l,
            Err(_) => continue,
        };
        if level != WORD_LEVEL {
            continue;
        }

        let conf: f32 = cols[10].trim().parse().unwrap_or(-1.0);
        let word = cols[11].trim();
        if conf < 0.0 {
            continue;
        }
        confidences.push(conf);
        if word.is_empty() {
            continue;
        }

        let block: u32 = cols[2].parse().unwrap_or(0);
        let par: u32 = cols[3].parse().unwrap_or(0);
        let line: u32 = cols[4].parse().unwrap_or(0);
        let key = (block, par, line);

        match current_line {
            None => {}
            Some(prev) if prev == key => text.push(' '),
            Some((prev_block, prev_par, _)) if prev_block == block && prev_par == par => {
                text.push('\n')
            }
            Some(_) => text.push_str("\n\n"),
        }
        text.push_str(word);
        current_line = Some(key);
    }

    (text, confidences)
}
