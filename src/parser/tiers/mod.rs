//! The three extraction strategies, from most to least reliable.
//!
//! Every tier scans the same read-only document and feeds the shared
//! [`Collector`]; a candidate that cannot produce a title and an acceptable
//! link is rejected on its own and never stops the scan.

pub mod blocks;
pub mod headings;
pub mod links;

use std::fmt;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::collector::Collector;
use super::dom::{resolve_href, selector};
use super::skip::should_skip;
use super::Reject;

static HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h3"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a"));
static EXTERNAL_LINK: LazyLock<Selector> = LazyLock::new(|| selector(r#"a[href^="http"]"#));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Organic result blocks inside the main results region.
    Blocks,
    /// Every result heading, with nearby links.
    Headings,
    /// Bare tracked links.
    Links,
}

impl Tier {
    /// Scan `document` and accept new records into `out`. Returns how many
    /// records this tier added.
    pub fn run(self, document: &Html, base: Option<&Url>, out: &mut Collector) -> usize {
        match self {
            Tier::Blocks => blocks::run(document, base, out),
            Tier::Headings => headings::run(document, base, out),
            Tier::Links => links::run(document, base, out),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Blocks => "tier 1 (result blocks)",
            Tier::Headings => "tier 2 (headings)",
            Tier::Links => "tier 3 (tracked links)",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierReport {
    pub tier: Tier,
    pub accepted: usize,
}

/// Resolve the link target and check it against the skip list and the
/// already-seen set.
fn admit(link: ElementRef<'_>, base: Option<&Url>, seen: &Collector) -> Result<String, Reject> {
    let url = resolve_href(link, base).ok_or(Reject::UnresolvedLink)?;
    if should_skip(&url) {
        return Err(Reject::Skipped(url));
    }
    if seen.contains(&url) {
        return Err(Reject::Duplicate(url));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Draft, Sponsored};

    #[test]
    fn admit_checks_skip_list_then_seen_set() {
        let doc = Html::parse_document(
            r#"<a id="self" href="/search?q=next">next</a>
               <a id="ext" href="https://www.rust-lang.org/">rust</a>"#,
        );
        let base = Url::parse("https://www.google.com/search?q=rust").unwrap();
        let link = |id: &str| doc.select(&selector(&format!("#{id}"))).next().unwrap();

        let mut seen = Collector::new(1);
        assert!(matches!(
            admit(link("self"), Some(&base), &seen),
            Err(Reject::Skipped(_))
        ));
        let url = admit(link("ext"), Some(&base), &seen).unwrap();
        assert_eq!(url, "https://www.rust-lang.org/");

        seen.accept(Draft {
            title: "Rust".into(),
            url,
            snippet: String::new(),
            sponsored: Sponsored::No,
        });
        assert!(matches!(
            admit(link("ext"), Some(&base), &seen),
            Err(Reject::Duplicate(_))
        ));
    }

    #[test]
    fn tiers_render_readable_names() {
        assert_eq!(Tier::Headings.to_string(), "tier 2 (headings)");
    }
}
