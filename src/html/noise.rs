//! Noise masking over an immutable HTML tree.
//!
//! Nothing is removed from the parsed document. An element is masked when it
//! or any ancestor is a noise element, and masked subtrees are skipped when
//! rendering text.

use std::collections::HashSet;

use regex::Regex;
use scraper::{ElementRef, Node};

/// Decides which elements carry no primary content.
#[derive(Debug, Clone)]
pub struct NoiseFilter {
    remove_tags: HashSet<String>,
    patterns: Vec<Regex>,
}

impl NoiseFilter {
    pub fn new(remove_tags: &[String], patterns: Vec<Regex>) -> Self {
        Self {
            remove_tags: remove_tags
                .iter()
                .map(|t| t.trim().to_ascii_lowercase())
                .collect(),
            patterns,
        }
    }

    /// True when this element itself is noise, by tag or by a class token or
    /// id matching a noise pattern.
    pub fn is_noise(&self, element: ElementRef<'_>) -> bool {
        let value = element.value();
        if self.remove_tags.contains(value.name()) {
            return true;
        }

        value
            .classes()
            .chain(value.id())
            .any(|token| self.patterns.iter().any(|re| re.is_match(token)))
    }

    /// True when the element sits inside (or is) a noise subtree.
    pub fn is_masked(&self, element: ElementRef<'_>) -> bool {
        self.is_noise(element)
            || element
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|ancestor| self.is_noise(ancestor))
    }

    /// Trimmed, non-empty text nodes of the unmasked part of `element`, in
    /// document order. Comments never contribute.
    pub fn text_fragments<'a>(&self, element: ElementRef<'a>) -> Vec<&'a str> {
        let mut fragments = Vec::new();
        if !self.is_noise(element) {
            self.collect_text(element, &mut fragments);
        }
        fragments
    }

    /// Render the unmasked text of `element`, fragments joined by `separator`.
    pub fn render(&self, element: ElementRef<'_>, separator: &str) -> String {
        self.text_fragments(element).join(separator)
    }

    fn collect_text<'a>(&self, element: ElementRef<'a>, out: &mut Vec<&'a str>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        out.push(trimmed);
                    }
                }
                Node::Element(_) => {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        if !self.is_noise(child_el) {
                            self.collect_text(child_el, out);
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HtmlConfig;
    use scraper::{Html, Selector};

    fn filter() -> NoiseFilter {
        let config = HtmlConfig::default();
        NoiseFilter::new(&config.remove_tags, config.compile_noise_patterns().unwrap())
    }

    fn body(doc: &Html) -> ElementRef<'_> {
        let selector = Selector::parse("body").unwrap();
        doc.select(&selector).next().unwrap()
    }

    #[test]
    fn test_tags_are_masked() {
        let doc = Html::parse_document(
            "<html><body><nav>Home | About</nav><p>Kept text</p>\
             <script>var x = 1;</script><footer>Copyright</footer></body></html>",
        );
        assert_eq!(filter().render(body(&doc), "\n"), "Kept text");
    }

    #[test]
    fn test_class_and_id_patterns_are_masked() {
        let doc = Html::parse_document(
            r#"<html><body>
                <div class="content ad-slot">Buy now</div>
                <div class="Social-Links">Follow us</div>
                <div id="cookie">We use cookies</div>
                <div class="article">Real words</div>
            </body></html>"#,
        );
        assert_eq!(filter().render(body(&doc), "\n"), "Real words");
    }

    #[test]
    fn test_pattern_matches_whole_words_only() {
        let doc = Html::parse_document(
            r#"<html><body><div class="header-image">Pictured</div>
               <div class="headerless">Still here</div></body></html>"#,
        );
        // "header-image" contains the word "header"; "headerless" does not.
        assert_eq!(filter().render(body(&doc), "\n"), "Still here");
    }

    #[test]
    fn test_masked_covers_descendants() {
        let doc = Html::parse_document(
            "<html><body><aside><div><p class=\"x\">Nested</p></div></aside></body></html>",
        );
        let selector = Selector::parse("p.x").unwrap();
        let p = doc.select(&selector).next().unwrap();
        let f = filter();
        assert!(!f.is_noise(p));
        assert!(f.is_masked(p));
    }

    #[test]
    fn test_comments_never_render() {
        let doc = Html::parse_document(
            "<html><body><p>Visible<!-- hidden comment --> text</p></body></html>",
        );
        assert_eq!(filter().render(body(&doc), " "), "Visible text");
    }

    #[test]
    fn test_tree_is_not_mutated() {
        let doc = Html::parse_document("<html><body><nav>Menu</nav><p>Body</p></body></html>");
        let _ = filter().render(body(&doc), "\n");
        let nav = Selector::parse("nav").unwrap();
        assert_eq!(doc.select(&nav).count(), 1);
    }
}
