//! Small tree helpers over `scraper` that mirror what the page itself would
//! see: closest-ancestor matching, flattened text and resolved link targets.

use scraper::{ElementRef, Selector};
use url::Url;

/// Compile a fixed selector. Only used on string constants.
pub fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

/// Compile an ordered selector table.
pub fn selectors(table: &[&str]) -> Vec<Selector> {
    table.iter().map(|css| selector(css)).collect()
}

/// Nearest element matching `sel`, starting at `el` itself and walking up.
pub fn closest<'a>(el: ElementRef<'a>, sel: &Selector) -> Option<ElementRef<'a>> {
    std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .find(|candidate| sel.matches(candidate))
}

/// First descendant of `el` matching `sel` (never `el` itself).
pub fn first<'a>(el: ElementRef<'a>, sel: &Selector) -> Option<ElementRef<'a>> {
    el.select(sel).next()
}

pub fn parent_element(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.parent().and_then(ElementRef::wrap)
}

/// All descendant text concatenated, untrimmed.
pub fn text_content(el: ElementRef<'_>) -> String {
    el.text().collect()
}

pub fn trimmed_text(el: ElementRef<'_>) -> String {
    text_content(el).trim().to_string()
}

/// First `max` chars of `s`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// The link's absolute target, resolved against the page URL.
///
/// A missing `href` yields an empty string, which the skip list rejects. A
/// relative `href` with no page URL to resolve against yields `None`.
pub fn resolve_href(anchor: ElementRef<'_>, base: Option<&Url>) -> Option<String> {
    let Some(raw) = anchor.value().attr("href") else {
        return Some(String::new());
    };
    let raw = raw.trim();
    match base {
        Some(base) => Some(
            base.join(raw)
                .map(String::from)
                .unwrap_or_else(|_| raw.to_string()),
        ),
        None => Url::parse(raw).ok().map(String::from),
    }
}
