use std::collections::HashSet;

use super::position::Position;
use super::{Draft, ResultRecord};

/// Accumulates records across tiers: owns the seen-URL set and hands out
/// ranks in acceptance order. One collector per snapshot.
#[derive(Debug)]
pub struct Collector {
    page: u32,
    seen: HashSet<String>,
    records: Vec<ResultRecord>,
}

impl Collector {
    pub fn new(page: u32) -> Self {
        Self {
            page,
            seen: HashSet::new(),
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Mark the draft's URL as seen and append it with the next rank.
    /// Returns false, leaving state untouched, when the URL was already taken.
    pub fn accept(&mut self, draft: Draft) -> bool {
        if !self.seen.insert(draft.url.clone()) {
            return false;
        }
        let position = Position::new(self.page, self.records.len() + 1);
        self.records.push(ResultRecord {
            position,
            title: draft.title,
            url: draft.url,
            snippet: draft.snippet,
            sponsored: draft.sponsored,
        });
        true
    }

    #[cfg(test)]
    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ResultRecord> {
        self.records
    }
}
