pub mod collector;
pub mod dom;
pub mod position;
pub mod skip;
pub mod snippet;
pub mod sponsor;
pub mod tiers;

use std::fmt;

use serde::Serialize;
use tracing::info;

use crate::snapshot::Snapshot;
use collector::Collector;
pub use position::Position;
use tiers::{Tier, TierReport};

/// Below this many records after tier 1, escalate to tier 2.
pub const LOW_RESULTS_THRESHOLD: usize = 5;
/// Below this many records after tier 2, escalate to tier 3.
pub const FLOOR_THRESHOLD: usize = 3;

pub const SNIPPET_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub low_results: usize,
    pub floor: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low_results: LOW_RESULTS_THRESHOLD,
            floor: FLOOR_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sponsored {
    Yes,
    No,
    /// The tier had no container to judge.
    Unknown,
}

impl From<bool> for Sponsored {
    fn from(sponsored: bool) -> Self {
        if sponsored {
            Sponsored::Yes
        } else {
            Sponsored::No
        }
    }
}

impl fmt::Display for Sponsored {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sponsored::Yes => "Yes",
            Sponsored::No => "No",
            Sponsored::Unknown => "Unknown",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRecord {
    pub position: Position,
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub sponsored: Sponsored,
}

/// A candidate's fields before it is ranked.
#[derive(Debug, Clone)]
pub struct Draft {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub sponsored: Sponsored,
}

/// Why a candidate element did not become a record.
#[derive(Debug, thiserror::Error)]
pub enum Reject {
    #[error("inside an auxiliary region")]
    AuxiliaryRegion,
    #[error("no heading")]
    NoHeading,
    #[error("empty title")]
    EmptyTitle,
    #[error("no link")]
    NoLink,
    #[error("relative link with no page URL to resolve against")]
    UnresolvedLink,
    #[error("skip-listed url {0}")]
    Skipped(String),
    #[error("duplicate url {0}")]
    Duplicate(String),
    #[error("title length {0} out of range")]
    TitleLength(usize),
}

pub struct Extraction {
    pub records: Vec<ResultRecord>,
    /// Tiers that ran, in order, with how many records each added.
    pub tiers: Vec<TierReport>,
}

impl Extraction {
    pub fn ran(&self, tier: Tier) -> bool {
        self.tiers.iter().any(|r| r.tier == tier)
    }
}

/// Run the tier cascade over one snapshot: result blocks first, then
/// headings if too few records were found, then bare tracked links.
pub fn extract(snapshot: &Snapshot, thresholds: Thresholds) -> Extraction {
    let document = snapshot.document();
    let base = snapshot.link_base();
    let mut out = Collector::new(snapshot.page_number());
    let mut tiers = Vec::new();

    let mut run = |tier: Tier, out: &mut Collector| {
        let report = TierReport {
            tier,
            accepted: tier.run(document, base, out),
        };
        info!(tier = %report.tier, accepted = report.accepted, total = out.len(), "Tier finished");
        tiers.push(report);
    };

    run(Tier::Blocks, &mut out);
    if out.len() < thresholds.low_results {
        run(Tier::Headings, &mut out);
    }
    if out.len() < thresholds.floor {
        run(Tier::Links, &mut out);
    }

    Extraction {
        records: out.into_records(),
        tiers,
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use url::Url;

    fn fixture(name: &str, page_url: &str) -> Snapshot {
        let html = std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap();
        Snapshot::parse(&html, Some(Url::parse(page_url).unwrap()))
    }

    fn assert_well_formed(records: &[ResultRecord]) {
        let urls: HashSet<&str> = records.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls.len(), records.len(), "duplicate urls");
        for (i, r) in records.iter().enumerate() {
            assert_eq!(r.position.rank, i + 1);
            assert!(!r.title.is_empty());
        }
    }

    #[test]
    fn full_page_stays_in_tier_one() {
        let snap = fixture("organic", "https://www.google.com/search?q=rust+language");
        let ex = extract(&snap, Thresholds::default());

        assert_eq!(ex.records.len(), 6);
        assert!(ex.ran(Tier::Blocks));
        assert!(!ex.ran(Tier::Headings));
        assert!(!ex.ran(Tier::Links));
        assert_well_formed(&ex.records);

        let first = &ex.records[0];
        assert_eq!(first.position.to_string(), "1.1");
        assert_eq!(first.title, "Rust Programming Language");
        assert_eq!(first.url, "https://www.rust-lang.org/");
        assert_eq!(first.sponsored, Sponsored::No);
        assert!(first.snippet.starts_with("A language empowering everyone"));

        let ad = ex.records.iter().find(|r| r.url == "https://rust-jobs.example/").unwrap();
        assert_eq!(ad.sponsored, Sponsored::Yes);

        assert!(ex.records.iter().all(|r| !r.url.contains("google.com")));
        assert!(ex.records.iter().all(|r| r.title != "What is Rust used for?"));
    }

    #[test]
    fn sparse_page_escalates_to_headings_only() {
        let snap = fixture("sparse", "https://www.google.com/search?q=rust&start=20");
        let ex = extract(&snap, Thresholds::default());

        assert_eq!(ex.tiers, [
            TierReport { tier: Tier::Blocks, accepted: 2 },
            TierReport { tier: Tier::Headings, accepted: 4 },
        ]);
        assert_eq!(ex.records.len(), 6);
        assert_well_formed(&ex.records);
        let labels: Vec<String> = ex.records.iter().map(|r| r.position.to_string()).collect();
        assert_eq!(labels, ["3.1", "3.2", "3.3", "3.4", "3.5", "3.6"]);
    }

    #[test]
    fn bare_links_reach_tier_three() {
        let snap = fixture("links_only", "https://www.google.com/search?q=rust&start=10");
        let ex = extract(&snap, Thresholds::default());

        assert!(ex.ran(Tier::Links));
        assert_eq!(ex.tiers.len(), 3);
        assert_well_formed(&ex.records);
        assert_eq!(ex.records.len(), 3);
        assert!(ex.records.iter().all(|r| r.sponsored == Sponsored::Unknown));
        assert!(ex.records.iter().all(|r| r.position.page == 2));
    }

    #[test]
    fn thresholds_are_configurable() {
        let snap = fixture("sparse", "https://www.google.com/search?q=rust");
        let ex = extract(&snap, Thresholds { low_results: 2, floor: 0 });
        assert_eq!(ex.tiers.len(), 1);
        assert_eq!(ex.records.len(), 2);
    }

    #[test]
    fn relative_links_follow_base_href() {
        let html = r#"<html><head><base href="https://mirror.example/"></head><body>
            <div id="rso"><div class="g"><a href="/rust-book"><h3>The Rust Programming Language book</h3></a></div></div>
            </body></html>"#;
        let snap = Snapshot::parse(html, Some(Url::parse("https://www.google.com/search?q=rust").unwrap()));
        let ex = extract(&snap, Thresholds::default());
        assert_eq!(ex.records[0].url, "https://mirror.example/rust-book");
    }

    #[test]
    fn empty_document_yields_empty_list() {
        let snap = Snapshot::parse("<html><body><p>nothing here</p></body></html>", None);
        let ex = extract(&snap, Thresholds::default());
        assert!(ex.records.is_empty());
        assert_eq!(ex.tiers.len(), 3);
    }
}
