use std::fmt;

use serde::{Serialize, Serializer};
use url::Url;

/// Query parameter carrying the result offset of the current page.
const OFFSET_PARAM: &str = "start";
const RESULTS_PER_PAGE: u64 = 10;

/// `page.rank` label, stable when CSVs from consecutive pages are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub page: u32,
    pub rank: usize,
}

impl Position {
    pub fn new(page: u32, rank: usize) -> Self {
        Self { page, rank }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_position(self.page, self.rank))
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub fn format_position(page: u32, rank: usize) -> String {
    format!("{}.{}", page, rank)
}

/// 1-based page number from the pagination offset in `page_url`.
pub fn page_number(page_url: Option<&Url>) -> u32 {
    let offset = page_url.map(pagination_offset).unwrap_or(0);
    let page = offset / RESULTS_PER_PAGE + 1;
    u32::try_from(page).unwrap_or(u32::MAX)
}

/// First `start` value; missing, non-numeric and negative offsets are 0.
fn pagination_offset(url: &Url) -> u64 {
    url.query_pairs()
        .find(|(key, _)| key == OFFSET_PARAM)
        .map(|(_, value)| parse_leading_int(&value))
        .unwrap_or(0)
}

/// Lenient integer parse: leading whitespace, optional sign, leading digits.
/// `"20"` and `"20abc"` are 20; `"-10"` and `"abc"` are 0.
fn parse_leading_int(raw: &str) -> u64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if negative || end == 0 {
        return 0;
    }
    digits[..end].parse().unwrap_or(u64::MAX)
}
