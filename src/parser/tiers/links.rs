use std::ops::RangeInclusive;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use super::{admit, HEADING};
use crate::parser::collector::Collector;
use crate::parser::dom::{first, selector, trimmed_text, truncate_chars};
use crate::parser::{Draft, Reject, Sponsored};

static TRACKED_LINKS: LazyLock<Selector> = LazyLock::new(|| {
    selector(r#"#search a[data-ved][href^="http"], #rso a[data-ved][href^="http"]"#)
});

/// Link text outside this range is an icon, a label or a paragraph.
const TITLE_CHARS: RangeInclusive<usize> = 5..=300;
const TITLE_MAX_CHARS: usize = 200;

pub fn run(document: &Html, base: Option<&Url>, out: &mut Collector) -> usize {
    let before = out.len();
    for link in document.select(&TRACKED_LINKS) {
        match extract(link, base, out) {
            Ok(draft) => {
                out.accept(draft);
            }
            Err(reject) => debug!(tier = 3, %reject, "skipping link"),
        }
    }
    out.len() - before
}

fn extract(link: ElementRef<'_>, base: Option<&Url>, seen: &Collector) -> Result<Draft, Reject> {
    let url = admit(link, base, seen)?;

    let title = first(link, &HEADING)
        .map(trimmed_text)
        .unwrap_or_else(|| trimmed_text(link));
    let len = title.chars().count();
    if !TITLE_CHARS.contains(&len) {
        return Err(Reject::TitleLength(len));
    }

    Ok(Draft {
        title: truncate_chars(&title, TITLE_MAX_CHARS),
        url,
        snippet: String::new(),
        sponsored: Sponsored::Unknown,
    })
}
