//! HTML content extraction.
//!
//! Parses a page, masks navigation, advertising and other chrome, picks the
//! region most likely to hold the primary content, and normalizes its text.

mod metadata;
mod noise;

pub use metadata::extract_metadata;
pub use noise::NoiseFilter;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::debug;

use crate::config::HtmlConfig;
use crate::error::{ConfigError, ExtractionError};
use crate::quality::{self, QualityMetrics};
use crate::utils::clean_text;

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid selector"));
static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").expect("valid selector"));
static DIV: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div").expect("valid selector"));
static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid selector"));

/// Result of cleaning one HTML document.
#[derive(Debug)]
pub struct HtmlExtraction {
    pub title: String,
    pub cleaned_text: String,
    pub metadata: BTreeMap<String, Value>,
    pub quality_metrics: QualityMetrics,
    pub success: bool,
    pub error: Option<ExtractionError>,
}

impl HtmlExtraction {
    fn failed(error: ExtractionError) -> Self {
        Self {
            title: String::new(),
            cleaned_text: String::new(),
            metadata: BTreeMap::new(),
            quality_metrics: QualityMetrics::default(),
            success: false,
            error: Some(error),
        }
    }
}

/// HTML extractor with its selectors and noise patterns compiled up front.
pub struct HtmlExtractor {
    filter: NoiseFilter,
    content_selectors: Vec<Selector>,
    min_content_length: usize,
}

impl HtmlExtractor {
    pub fn new(config: &HtmlConfig) -> Result<Self, ConfigError> {
        let patterns = config.compile_noise_patterns()?;
        let content_selectors = config
            .content_selectors
            .iter()
            .map(|s| {
                Selector::parse(s).map_err(|e| ConfigError::InvalidSelector {
                    selector: s.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            filter: NoiseFilter::new(&config.remove_tags, patterns),
            content_selectors,
            min_content_length: config.min_content_length,
        })
    }

    /// Extract from raw bytes. Invalid UTF-8 sequences are replaced with
    /// U+FFFD rather than rejected.
    pub fn extract(&self, html: &[u8], source_url: Option<&str>) -> HtmlExtraction {
        self.extract_str(&String::from_utf8_lossy(html), source_url)
    }

    /// Extract from an already decoded document.
    pub fn extract_str(&self, html: &str, source_url: Option<&str>) -> HtmlExtraction {
        if html.trim().is_empty() {
            return HtmlExtraction::failed(ExtractionError::ParseFailure(
                "document is empty".to_string(),
            ));
        }

        let document = Html::parse_document(html);

        let title = self.title(&document);
        let main_content = self.main_content(&document);
        let cleaned_text = clean_text(&main_content);
        let quality_metrics = quality::compute_metrics(&cleaned_text);
        let metadata = extract_metadata(&document, &self.filter, source_url);

        debug!(
            "HTML extraction: {} chars of main content, {} after cleaning",
            main_content.chars().count(),
            cleaned_text.chars().count()
        );

        HtmlExtraction {
            title,
            cleaned_text,
            metadata,
            quality_metrics,
            success: true,
            error: None,
        }
    }

    /// First unmasked `<title>` with text, else first unmasked `<h1>`.
    fn title(&self, document: &Html) -> String {
        let first_text = |selector: &Selector| {
            document
                .select(selector)
                .filter(|el| !self.filter.is_masked(*el))
                .map(|el| self.filter.render(el, " ").trim().to_string())
                .find(|text| !text.is_empty())
        };

        if let Some(title) = first_text(&TITLE) {
            return title;
        }
        document
            .select(&H1)
            .find(|el| !self.filter.is_masked(*el))
            .map(|el| self.filter.render(el, " ").trim().to_string())
            .unwrap_or_default()
    }

    fn main_content(&self, document: &Html) -> String {
        for selector in &self.content_selectors {
            let Some(element) = self.first_unmasked(document, selector) else {
                continue;
            };
            let text = self.filter.render(element, "\n");
            if text.chars().count() > self.min_content_length {
                return text;
            }
        }

        let mut best: Option<(usize, ElementRef<'_>)> = None;
        for div in document.select(&DIV).filter(|el| !self.filter.is_masked(*el)) {
            let len = self.filter.render(div, " ").chars().count();
            if len > self.min_content_length && best.map_or(true, |(best_len, _)| len > best_len) {
                best = Some((len, div));
            }
        }
        if let Some((_, div)) = best {
            return self.filter.render(div, "\n");
        }

        self.first_unmasked(document, &BODY)
            .map(|body| self.filter.render(body, "\n"))
            .unwrap_or_default()
    }

    fn first_unmasked<'a>(&self, document: &'a Html, selector: &Selector) -> Option<ElementRef<'a>> {
        document
            .select(selector)
            .find(|el| !self.filter.is_masked(*el))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROSE: &str = "Our flight academy has trained professional pilots for more than \
        thirty years. The private pilot course combines classroom instruction with practical \
        flying lessons in well maintained aircraft. Students progress through solo flights, \
        cross country navigation and night operations before the checkride. Financing options \
        are available for qualified applicants, and housing is offered near the airport for \
        students relocating from other states.";

    fn extractor() -> HtmlExtractor {
        HtmlExtractor::new(&HtmlConfig::default()).unwrap()
    }

    #[test]
    fn test_noise_removed_around_prose() {
        let html = format!(
            r#"<html><head><title>Flight Academy</title>
            <script>trackVisitor("navigation menu footer");</script></head>
            <body>
              <nav><a href="/">Home</a> <a href="/about">About our navigation menu</a></nav>
              <main><p>{}</p></main>
              <footer>Copyright 2024 Flight Academy. All rights reserved worldwide.</footer>
            </body></html>"#,
            PROSE
        );

        let result = extractor().extract_str(&html, Some("https://academy.example"));
        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(result.title, "Flight Academy");
        assert!(result.cleaned_text.contains("private pilot course"));
        assert!(!result.cleaned_text.contains("trackVisitor"));
        assert!(!result.cleaned_text.contains("About our navigation"));
        assert!(!result.cleaned_text.contains("Copyright"));
        assert!(result.quality_metrics.total_words > 50);
        assert!(result.quality_metrics.has_meaningful_content);
    }

    #[test]
    fn test_selector_priority_and_threshold() {
        let html = format!(
            r#"<html><body>
              <main><p>Too short to count.</p></main>
              <article><p>{}</p></article>
            </body></html>"#,
            PROSE
        );
        let result = extractor().extract_str(&html, None);
        assert!(result.cleaned_text.starts_with("Our flight academy"));
        assert!(!result.cleaned_text.contains("Too short"));
    }

    #[test]
    fn test_longest_div_fallback() {
        let html = format!(
            r#"<html><body>
              <div><p>A short div that is not quite long enough here.</p></div>
              <div><p>{}</p></div>
              <p>Loose paragraph outside any div that should be dropped entirely.</p>
            </body></html>"#,
            PROSE
        );
        let result = extractor().extract_str(&html, None);
        assert!(result.cleaned_text.starts_with("Our flight academy"));
        assert!(!result.cleaned_text.contains("Loose paragraph"));
    }

    #[test]
    fn test_body_fallback() {
        let html = "<html><body><p>Only a single loose paragraph of body text.</p></body></html>";
        let result = extractor().extract_str(html, None);
        assert_eq!(
            result.cleaned_text,
            "Only a single loose paragraph of body text."
        );
    }

    #[test]
    fn test_title_falls_back_to_h1() {
        let html = "<html><head><title>   </title></head><body><h1>Aviation Pricing</h1></body></html>";
        assert_eq!(extractor().extract_str(html, None).title, "Aviation Pricing");

        let html = "<html><body><header><h1>Masked</h1></header><p>x</p></body></html>";
        assert_eq!(extractor().extract_str(html, None).title, "");
    }

    #[test]
    fn test_latin1_bytes_are_decoded_lossily() {
        let mut html = b"<html><head><title>Caf\xE9 Aviation</title></head>".to_vec();
        html.extend_from_slice(b"<body><main><p>");
        html.extend_from_slice(
            b"The caf\xE9 at the airfield serves pilots and students between lessons. \
              Our flight school offers private pilot training with experienced instructors.",
        );
        html.extend_from_slice(b"</p></main></body></html>");

        let result = extractor().extract(&html, None);
        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(result.title, "Caf\u{FFFD} Aviation");
        assert!(result.cleaned_text.contains("flight school offers private pilot training"));
    }

    #[test]
    fn test_empty_bytes_are_parse_failure() {
        let result = extractor().extract(b"", None);
        assert!(!result.success);
        assert!(matches!(result.error, Some(ExtractionError::ParseFailure(_))));
        assert!(result.cleaned_text.is_empty());
        assert_eq!(result.quality_metrics, QualityMetrics::default());
    }

    #[test]
    fn test_blank_input_is_parse_failure() {
        let result = extractor().extract(b"   \n ", None);
        assert!(!result.success);
        assert!(matches!(result.error, Some(ExtractionError::ParseFailure(_))));
    }

    #[test]
    fn test_malformed_selector_rejected_at_construction() {
        let config = HtmlConfig {
            content_selectors: vec!["main".to_string(), "::nope(".to_string()],
            ..HtmlConfig::default()
        };
        assert!(matches!(
            HtmlExtractor::new(&config),
            Err(ConfigError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let html = format!("<html><body><article>{}</article></body></html>", PROSE);
        let a = extractor().extract_str(&html, None);
        let b = extractor().extract_str(&html, None);
        assert_eq!(a.cleaned_text, b.cleaned_text);
        assert_eq!(a.quality_metrics, b.quality_metrics);
    }
}
