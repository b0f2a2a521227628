use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use super::{admit, ANCHOR, HEADING};
use crate::parser::collector::Collector;
use crate::parser::dom::{closest, first, selector, selectors, trimmed_text, truncate_chars};
use crate::parser::snippet::extract_snippet;
use crate::parser::sponsor::is_sponsored;
use crate::parser::{Draft, Reject, Sponsored, SNIPPET_MAX_CHARS};

/// Main results region, primary first.
const RESULT_REGIONS: &[&str] = &["#rso", "#search"];

/// Result block shapes: classic organic, view-identified, sokoban container,
/// script-controlled.
const BLOCK_SIGNATURES: &[&str] = &[
    "div.g:not(.g-blk)",
    r#"div[data-hveid]:not([data-hveid=""])"#,
    "div[data-sokoban-container]",
    "[jscontroller][data-hveid]",
];

/// "People also ask", related questions and refinement panels.
const AUXILIARY_REGIONS: &[&str] = &["[data-initq]", ".related-question-pair", "[data-rf]"];

static REGIONS: LazyLock<Vec<Selector>> = LazyLock::new(|| selectors(RESULT_REGIONS));
static BLOCKS: LazyLock<Selector> = LazyLock::new(|| selector(&BLOCK_SIGNATURES.join(", ")));
static AUXILIARY: LazyLock<Vec<Selector>> = LazyLock::new(|| selectors(AUXILIARY_REGIONS));
static TRACKED_LINK: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"a[href^="http"][data-ved]"#));
static OFFSITE_LINK: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"a[href^="http"]:not([href*="google.com"])"#));
static PING_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[ping]"));

struct Candidate<'a> {
    block: ElementRef<'a>,
    heading: ElementRef<'a>,
}

type LinkLookup = for<'a> fn(&Candidate<'a>) -> Option<ElementRef<'a>>;

/// Which link represents the block. Order decides the winner when a block
/// carries several links.
const LINK_LOOKUPS: &[LinkLookup] = &[heading_anchor, tracked_link, offsite_link, ping_link];

pub fn run(document: &Html, base: Option<&Url>, out: &mut Collector) -> usize {
    let Some(region) = REGIONS
        .iter()
        .find_map(|sel| document.select(sel).next())
    else {
        debug!("no main results region");
        return 0;
    };

    let before = out.len();
    for block in region.select(&BLOCKS) {
        match extract(block, base, out) {
            Ok(draft) => {
                out.accept(draft);
            }
            Err(reject) => debug!(tier = 1, %reject, "skipping result block"),
        }
    }
    out.len() - before
}

fn extract(block: ElementRef<'_>, base: Option<&Url>, seen: &Collector) -> Result<Draft, Reject> {
    if AUXILIARY.iter().any(|sel| closest(block, sel).is_some()) {
        return Err(Reject::AuxiliaryRegion);
    }

    let heading = first(block, &HEADING).ok_or(Reject::NoHeading)?;
    let title = trimmed_text(heading);
    if title.is_empty() {
        return Err(Reject::EmptyTitle);
    }

    let candidate = Candidate { block, heading };
    let link = LINK_LOOKUPS
        .iter()
        .find_map(|lookup| lookup(&candidate))
        .ok_or(Reject::NoLink)?;
    let url = admit(link, base, seen)?;

    Ok(Draft {
        title,
        url,
        snippet: truncate_chars(&extract_snippet(Some(block)), SNIPPET_MAX_CHARS),
        sponsored: Sponsored::from(is_sponsored(Some(block))),
    })
}

fn heading_anchor<'a>(c: &Candidate<'a>) -> Option<ElementRef<'a>> {
    closest(c.heading, &ANCHOR)
}

fn tracked_link<'a>(c: &Candidate<'a>) -> Option<ElementRef<'a>> {
    first(c.block, &TRACKED_LINK)
}

fn offsite_link<'a>(c: &Candidate<'a>) -> Option<ElementRef<'a>> {
    first(c.block, &OFFSITE_LINK)
}

fn ping_link<'a>(c: &Candidate<'a>) -> Option<ElementRef<'a>> {
    first(c.block, &PING_LINK)
}
