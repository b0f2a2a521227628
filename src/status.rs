use std::fmt;

use tracing::{info, warn};

use crate::export::Target;

/// Terminal result of one export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Exported { count: usize, target: Target },
    NoResults,
    WrongPageType { url: String },
    Failed(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Exported { .. })
    }

    /// The payload went to stdout, so messages must not.
    fn occupies_stdout(&self) -> bool {
        matches!(self, Outcome::Exported { target: Target::Stdout, .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Exported { count, target } => {
                write!(f, "Exported {} results to {}", count, target)
            }
            Outcome::NoResults => f.write_str("No results found on this page."),
            Outcome::WrongPageType { url } => {
                write!(f, "Not a search results page ({}); pass --allow-any-page to export anyway.", url)
            }
            Outcome::Failed(message) => write!(f, "Error: {}", message),
        }
    }
}

/// Print the outcome for the user and record it in the log. Stdout carries
/// the payload when exporting to `-`, so the message goes to stderr then.
pub fn report(outcome: &Outcome) {
    if outcome.is_success() {
        info!(%outcome, "Export finished");
    } else {
        warn!(%outcome, "Export stopped");
    }
    if outcome.occupies_stdout() {
        eprintln!("{}", outcome);
    } else {
        println!("{}", outcome);
    }
}
