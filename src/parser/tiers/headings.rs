use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use super::{admit, ANCHOR, EXTERNAL_LINK};
use crate::parser::collector::Collector;
use crate::parser::dom::{closest, first, parent_element, selector, selectors, trimmed_text, truncate_chars};
use crate::parser::snippet::extract_snippet;
use crate::parser::sponsor::is_sponsored;
use crate::parser::{Draft, Reject, Sponsored, SNIPPET_MAX_CHARS};

static RESULT_HEADINGS: LazyLock<Selector> =
    LazyLock::new(|| selector("#search h3, #rso h3, #main h3"));

/// Enclosing result container for sponsorship and snippet lookup, nearest
/// view-identified block first.
const CONTAINER_SIGNATURES: &[&str] = &["div[data-hveid]", "div.g", "[jscontroller]"];

static CONTAINERS: LazyLock<Vec<Selector>> = LazyLock::new(|| selectors(CONTAINER_SIGNATURES));

type LinkLookup = for<'a> fn(ElementRef<'a>) -> Option<ElementRef<'a>>;

/// Links near the heading, widening outwards. First hit wins.
const LINK_LOOKUPS: &[LinkLookup] = &[
    heading_anchor,
    parent_external_link,
    parent_anchor,
    grandparent_external_link,
];

pub fn run(document: &Html, base: Option<&Url>, out: &mut Collector) -> usize {
    let before = out.len();
    for heading in document.select(&RESULT_HEADINGS) {
        match extract(heading, base, out) {
            Ok(draft) => {
                out.accept(draft);
            }
            Err(reject) => debug!(tier = 2, %reject, "skipping heading"),
        }
    }
    out.len() - before
}

fn extract(heading: ElementRef<'_>, base: Option<&Url>, seen: &Collector) -> Result<Draft, Reject> {
    let title = trimmed_text(heading);
    if title.is_empty() {
        return Err(Reject::EmptyTitle);
    }

    let link = LINK_LOOKUPS
        .iter()
        .find_map(|lookup| lookup(heading))
        .ok_or(Reject::NoLink)?;
    let url = admit(link, base, seen)?;

    let container = CONTAINERS.iter().find_map(|sel| closest(heading, sel));

    Ok(Draft {
        title,
        url,
        snippet: truncate_chars(&extract_snippet(container), SNIPPET_MAX_CHARS),
        sponsored: Sponsored::from(is_sponsored(Some(container.unwrap_or(heading)))),
    })
}

fn heading_anchor(heading: ElementRef<'_>) -> Option<ElementRef<'_>> {
    closest(heading, &ANCHOR)
}

fn parent_external_link(heading: ElementRef<'_>) -> Option<ElementRef<'_>> {
    parent_element(heading).and_then(|parent| first(parent, &EXTERNAL_LINK))
}

fn parent_anchor(heading: ElementRef<'_>) -> Option<ElementRef<'_>> {
    parent_element(heading).and_then(|parent| closest(parent, &ANCHOR))
}

fn grandparent_external_link(heading: ElementRef<'_>) -> Option<ElementRef<'_>> {
    parent_element(heading)
        .and_then(parent_element)
        .and_then(|grandparent| first(grandparent, &EXTERNAL_LINK))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_into(html: &str, out: &mut Collector) -> usize {
        let doc = Html::parse_document(html);
        let base = Url::parse("https://www.google.com/search?q=rust").unwrap();
        run(&doc, Some(&base), out)
    }

    fn urls(html: &str) -> Vec<String> {
        let mut out = Collector::new(1);
        scan_into(html, &mut out);
        out.into_records().into_iter().map(|r| r.url).collect()
    }

    #[test]
    fn headings_under_any_result_region() {
        let html = r#"
            <div id="main"><a href="https://main.example/"><h3>Main</h3></a></div>
            <div id="search"><a href="https://search.example/"><h3>Search</h3></a></div>
            <div id="sidebar"><a href="https://side.example/"><h3>Side</h3></a></div>"#;
        assert_eq!(urls(html), ["https://main.example/", "https://search.example/"]);
    }

    #[test]
    fn link_lookup_widens_from_the_heading() {
        // Sibling link under the same parent.
        let html = r#"<div id="rso"><div>
            <h3>Title</h3><a href="https://sibling.example/">s</a>
        </div></div>"#;
        assert_eq!(urls(html), ["https://sibling.example/"]);

        // Enclosing anchor with a relative target.
        let html = r#"<div id="rso"><a href="/url?q=x"><span><h3>Title</h3></span></a></div>"#;
        assert_eq!(urls(html), ["https://www.google.com/url?q=x"]);

        // Grandparent link as the last resort.
        let html = r#"<div id="rso"><div>
            <a href="https://cousin.example/">c</a>
            <div><h3>Title</h3></div>
        </div></div>"#;
        assert_eq!(urls(html), ["https://cousin.example/"]);

        // Nothing within two levels.
        let html = r#"<div id="rso">
            <a href="https://far.example/">far</a>
            <div><div><h3>Title</h3></div></div>
        </div>"#;
        assert!(urls(html).is_empty());
    }

    #[test]
    fn container_drives_snippet_and_sponsorship() {
        let html = r#"<div id="rso">
            <div data-hveid="CAE" data-text-ad="1">
              <div><a href="https://ad.example/"><h3>Ad title</h3></a></div>
              <div data-sncf="1">Buy the best widgets online today at low prices</div>
            </div>
        </div>"#;
        let mut out = Collector::new(1);
        scan_into(html, &mut out);
        let record = &out.records()[0];
        assert_eq!(record.sponsored, Sponsored::Yes);
        assert_eq!(record.snippet, "Buy the best widgets online today at low prices");
    }

    #[test]
    fn heading_is_classified_without_container() {
        let html = r#"<div id="rso">
            <div><a href="https://ad.example/"><h3>Sponsored result</h3></a></div>
            <div><a href="https://org.example/"><h3>Organic result</h3></a></div>
        </div>"#;
        let mut out = Collector::new(1);
        scan_into(html, &mut out);
        let flags: Vec<Sponsored> = out.records().iter().map(|r| r.sponsored).collect();
        assert_eq!(flags, [Sponsored::Yes, Sponsored::No]);
        assert!(out.records().iter().all(|r| r.snippet.is_empty()));
    }

    #[test]
    fn continues_ranks_and_skips_seen_urls() {
        let html = r#"<div id="rso">
            <a href="https://one.example/"><h3>One</h3></a>
            <a href="https://two.example/"><h3>Two</h3></a>
        </div>"#;
        let mut out = Collector::new(1);
        out.accept(Draft {
            title: "One".into(),
            url: "https://one.example/".into(),
            snippet: String::new(),
            sponsored: Sponsored::No,
        });
        assert_eq!(scan_into(html, &mut out), 1);
        let last = &out.records()[1];
        assert_eq!(last.url, "https://two.example/");
        assert_eq!(last.position.to_string(), "1.2");
    }
}
