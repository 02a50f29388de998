//! Configuration for the extraction engine.
//!
//! Every value is optional and defaulted. Files are TOML (or JSON, chosen by
//! extension). Validation compiles noise patterns and content selectors so a
//! malformed list fails at startup, before any document is processed.

use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "DOCSIFT_CONFIG";

/// Tags whose subtrees never carry primary content.
pub const DEFAULT_REMOVE_TAGS: &[&str] = &[
    "script",
    "style",
    "noscript",
    "iframe",
    "embed",
    "object",
    "nav",
    "header",
    "footer",
    "aside",
    "sidebar",
    "advertisement",
    "ads",
    "banner",
    "popup",
    "social-share",
    "share-buttons",
    "comments",
    "cookie-notice",
    "gdpr-banner",
    "newsletter-signup",
];

/// Class/id patterns for advertising, social, consent and navigation chrome.
pub const DEFAULT_NOISE_PATTERNS: &[&str] = &[
    r"\b(ads?|advertisement|banner|popup|modal|overlay)\b",
    r"\b(share|social|facebook|twitter|linkedin|instagram)\b",
    r"\b(cookie|gdpr|privacy|newsletter|subscribe)\b",
    r"\b(nav|menu|header|footer|sidebar)\b",
];

/// Main-content selectors, in priority order.
pub const DEFAULT_CONTENT_SELECTORS: &[&str] = &[
    "main",
    "[role=\"main\"]",
    ".content",
    ".main-content",
    ".post-content",
    ".entry-content",
    "article",
    ".article-content",
];

/// HTML extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlConfig {
    /// Minimum rendered length for a region to count as main content.
    pub min_content_length: usize,
    pub remove_tags: Vec<String>,
    pub noise_patterns: Vec<String>,
    pub content_selectors: Vec<String>,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            min_content_length: 50,
            remove_tags: to_strings(DEFAULT_REMOVE_TAGS),
            noise_patterns: to_strings(DEFAULT_NOISE_PATTERNS),
            content_selectors: to_strings(DEFAULT_CONTENT_SELECTORS),
        }
    }
}

impl HtmlConfig {
    /// Compile noise patterns (case-insensitive).
    pub fn compile_noise_patterns(&self) -> Result<Vec<Regex>, ConfigError> {
        self.noise_patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| ConfigError::InvalidPattern {
                        pattern: pattern.clone(),
                        source,
                    })
            })
            .collect()
    }
}

/// Which backend reads the embedded PDF text layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextLayerKind {
    /// Pure Rust extraction via the pdf-extract crate.
    #[default]
    PdfExtract,
    /// Poppler's pdftotext command-line tool.
    Pdftotext,
}

/// PDF extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    pub ocr_enabled: bool,
    /// Direct-extraction confidence below which OCR is attempted.
    pub ocr_min_confidence: f64,
    /// OCR is skipped when direct text is at least this long.
    pub ocr_max_direct_chars: usize,
    /// Maximum number of pages rasterized for OCR.
    pub ocr_page_cap: u32,
    /// Raster scale relative to 72 DPI.
    pub ocr_scale: f32,
    pub text_layer: TextLayerKind,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            ocr_enabled: true,
            ocr_min_confidence: 60.0,
            ocr_max_direct_chars: 1000,
            ocr_page_cap: 50,
            ocr_scale: 2.0,
            text_layer: TextLayerKind::default(),
        }
    }
}

/// OCR engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Tesseract language (e.g., "eng", "deu+eng").
    pub language: String,
    /// Extra tesseract arguments.
    pub tesseract_args: Vec<String>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            tesseract_args: to_strings(&["--oem", "3", "--psm", "6"]),
        }
    }
}

/// Batch processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker count; 0 means one per available CPU core.
    pub workers: usize,
}

impl BatchConfig {
    /// Effective worker count.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub html: HtmlConfig,
    pub pdf: PdfConfig,
    pub ocr: OcrConfig,
    pub batch: BatchConfig,
}

impl Settings {
    /// Load settings from a file, choosing the format by extension.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
        let settings: Settings = match ext {
            "json" => serde_json::from_str(&contents).map_err(|e| ConfigError::InvalidValue {
                key: "config",
                reason: format!("{}: {}", path.display(), e),
            })?,
            _ => toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?,
        };

        settings.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(settings)
    }

    /// Load settings using the discovery order: explicit path, then
    /// `$DOCSIFT_CONFIG`, then `<config_dir>/docsift/config.toml`, then defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }

        if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
            if !env_path.is_empty() {
                return Self::load_from_path(Path::new(&env_path));
            }
        }

        if let Some(path) = default_config_path().filter(|p| p.exists()) {
            return Self::load_from_path(&path);
        }

        let settings = Self::default();
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check every value that could make extraction misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.html.compile_noise_patterns()?;

        for selector in &self.html.content_selectors {
            scraper::Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
                selector: selector.clone(),
                reason: e.to_string(),
            })?;
        }

        if self.html.remove_tags.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: "html.remove_tags",
                reason: "tag names must not be empty".to_string(),
            });
        }

        if !(0.0..=100.0).contains(&self.pdf.ocr_min_confidence) {
            return Err(ConfigError::InvalidValue {
                key: "pdf.ocr_min_confidence",
                reason: format!("{} is outside 0-100", self.pdf.ocr_min_confidence),
            });
        }

        if !(self.pdf.ocr_scale.is_finite() && self.pdf.ocr_scale > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "pdf.ocr_scale",
                reason: format!("{} must be a positive number", self.pdf.ocr_scale),
            });
        }

        Ok(())
    }
}

/// Default config file location, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("docsift").join("config.toml"))
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.html.min_content_length, 50);
        assert!(settings.pdf.ocr_enabled);
        assert_eq!(settings.pdf.ocr_min_confidence, 60.0);
        assert_eq!(settings.pdf.ocr_page_cap, 50);
        assert_eq!(settings.pdf.ocr_scale, 2.0);
        assert_eq!(settings.pdf.text_layer, TextLayerKind::PdfExtract);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            [pdf]
            ocr_enabled = false
            text_layer = "pdftotext"

            [batch]
            workers = 3
            "#,
        )
        .unwrap();

        assert!(!settings.pdf.ocr_enabled);
        assert_eq!(settings.pdf.text_layer, TextLayerKind::Pdftotext);
        assert_eq!(settings.pdf.ocr_min_confidence, 60.0);
        assert_eq!(settings.html.remove_tags.len(), DEFAULT_REMOVE_TAGS.len());
        assert_eq!(settings.batch.effective_workers(), 3);
    }

    #[test]
    fn test_malformed_noise_pattern_is_fatal() {
        let result = Settings::from_toml_str(
            r#"
            [html]
            noise_patterns = ["(unclosed"]
            "#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidPattern { .. })));
    }

    #[test]
    fn test_malformed_selector_is_fatal() {
        let result = Settings::from_toml_str(
            r#"
            [html]
            content_selectors = ["div[["]
            "#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidSelector { .. })));
    }

    #[test]
    fn test_out_of_range_confidence_rejected() {
        let result = Settings::from_toml_str(
            r#"
            [pdf]
            ocr_min_confidence = 150.0
            "#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("docsift.toml");
        std::fs::write(&path, "[html]\nmin_content_length = 120\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.html.min_content_length, 120);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = Settings::load(Some(Path::new("/nonexistent/docsift.toml")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_auto_workers_is_positive() {
        assert!(BatchConfig::default().effective_workers() >= 1);
    }
}
