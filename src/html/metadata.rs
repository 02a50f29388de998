//! Page metadata from `<meta>` tags.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::Utc;
use scraper::{Html, Selector};
use serde_json::Value;

use super::noise::NoiseFilter;

static META: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta").expect("valid selector"));
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid selector"));

/// Collect meta name/property pairs, Open Graph aliases and provenance flags.
pub fn extract_metadata(
    document: &Html,
    filter: &NoiseFilter,
    source_url: Option<&str>,
) -> BTreeMap<String, Value> {
    let mut metadata = BTreeMap::new();
    let mut has_meta_description = false;

    for meta in document.select(&META).filter(|el| !filter.is_masked(*el)) {
        let element = meta.value();
        let name = element.attr("name").filter(|n| !n.is_empty());
        let property = element.attr("property").filter(|p| !p.is_empty());
        let content = element.attr("content").filter(|c| !c.is_empty());

        if name.is_some_and(|n| n.eq_ignore_ascii_case("description")) {
            has_meta_description = true;
        }

        let Some(content) = content else {
            continue;
        };

        if let Some(key) = name.or(property) {
            metadata.insert(key.to_string(), Value::String(content.to_string()));
        }

        if let Some(og) = property.and_then(|p| p.strip_prefix("og:")) {
            if !og.is_empty() {
                metadata.insert(format!("og_{}", og), Value::String(content.to_string()));
            }
        }
    }

    let has_title = document
        .select(&TITLE)
        .any(|el| !filter.is_masked(el));

    metadata.insert(
        "source_url".to_string(),
        source_url.map_or(Value::Null, |u| Value::String(u.to_string())),
    );
    metadata.insert(
        "extracted_at".to_string(),
        Value::String(Utc::now().to_rfc3339()),
    );
    metadata.insert("has_title".to_string(), Value::Bool(has_title));
    metadata.insert(
        "has_meta_description".to_string(),
        Value::Bool(has_meta_description),
    );

    metadata
}
