use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use super::dom::{closest, selectors, text_content};

/// Structural ad markers; a match on the element or any ancestor is enough.
const AD_SIGNATURES: &[&str] = &[
    "[data-text-ad]",
    "[data-hveid] [data-dtld]",
    ".commercial-unit-desktop-top",
    ".ads-ad",
    r#"[data-sokoban-feature="ad"]"#,
];

/// How many leading chars of the flattened text carry the ad label.
const LABEL_WINDOW: usize = 50;

static AD_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| selectors(AD_SIGNATURES));
static AD_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ad\s*[·•]").unwrap());

type Check = fn(ElementRef<'_>) -> bool;

/// Evaluated in order, first hit wins.
const CHECKS: &[Check] = &[has_ad_marker, has_ad_label];

/// Paid placement test. `None` is never sponsored.
pub fn is_sponsored(element: Option<ElementRef<'_>>) -> bool {
    element.is_some_and(|el| CHECKS.iter().any(|check| check(el)))
}

fn has_ad_marker(el: ElementRef<'_>) -> bool {
    AD_SELECTORS.iter().any(|sel| closest(el, sel).is_some())
}

fn has_ad_label(el: ElementRef<'_>) -> bool {
    let head: String = text_content(el)
        .chars()
        .take(LABEL_WINDOW)
        .collect::<String>()
        .to_lowercase();
    head.contains("sponsored") || AD_LABEL_RE.is_match(&head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::dom::selector;
    use scraper::Html;

    fn check(html: &str) -> bool {
        let doc = Html::parse_document(html);
        let el = doc.select(&selector("#target")).next();
        is_sponsored(el)
    }

    #[test]
    fn absent_element_is_organic() {
        assert!(!is_sponsored(None));
    }

    #[test]
    fn sponsored_label_wins_without_markers() {
        assert!(check(
            r#"<div id="target">Sponsored · <a href="https://shop.example">Shop</a></div>"#
        ));
    }

    #[test]
    fn short_ad_label_at_start() {
        assert!(check(r#"<div id="target">Ad · example.com</div>"#));
        assert!(check(r#"<div id="target">AD• example.com</div>"#));
        assert!(!check(r#"<div id="target">Adventure · travel</div>"#));
        assert!(!check(r#"<div id="target">Read this ad · later</div>"#));
    }

    #[test]
    fn label_must_be_in_first_fifty_chars() {
        let filler = "x".repeat(60);
        assert!(!check(&format!(r#"<div id="target">{filler} sponsored</div>"#)));
    }

    #[test]
    fn ancestor_markers_classify_descendants() {
        assert!(check(
            r#"<div class="commercial-unit-desktop-top"><div><p id="target">Buy</p></div></div>"#
        ));
        assert!(check(r#"<div data-text-ad="1"><p id="target">Buy</p></div>"#));
        assert!(check(r#"<li class="ads-ad"><div id="target">Buy</div></li>"#));
        assert!(check(
            r#"<div data-sokoban-feature="ad"><div id="target">Buy</div></div>"#
        ));
        assert!(check(
            r#"<div data-hveid="CAE"><span data-dtld="shop.example"><b id="target">Buy</b></span></div>"#
        ));
    }

    #[test]
    fn plain_organic_block() {
        assert!(!check(
            r#"<div class="g" data-hveid="CAE"><h3 id="target">Rust Programming Language</h3></div>"#
        ));
    }
}
