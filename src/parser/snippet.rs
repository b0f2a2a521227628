use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use super::dom::{first, selectors, trimmed_text};

/// Snippet locations, most specific first. The class names rotate often;
/// line-clamped regions are the most stable signal.
const SNIPPET_SIGNATURES: &[&str] = &[
    r#"[data-sncf="1"]"#,
    r#"[data-sncf="2"]"#,
    r#"div[style*="-webkit-line-clamp"]"#,
    r#"span[style*="-webkit-line-clamp"]"#,
    ".VwiC3b",
    "[data-snf]",
    "div.IsZvec",
    "span.aCOpRe",
    "div.s",
];

/// Shorter matches are labels or breadcrumbs, not descriptions.
const MIN_SNIPPET_CHARS: usize = 20;

static SNIPPET_SELECTORS: LazyLock<Vec<Selector>> =
    LazyLock::new(|| selectors(SNIPPET_SIGNATURES));

/// Descriptive text under `container`, or an empty string.
pub fn extract_snippet(container: Option<ElementRef<'_>>) -> String {
    let Some(container) = container else {
        return String::new();
    };
    SNIPPET_SELECTORS
        .iter()
        .filter_map(|sel| first(container, sel))
        .map(trimmed_text)
        .find(|text| text.chars().count() > MIN_SNIPPET_CHARS)
        .unwrap_or_default()
}
