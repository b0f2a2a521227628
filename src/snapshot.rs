use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

use crate::parser::dom::selector;
use crate::parser::position;

/// Browsers stamp "Save page as" output with the address it came from.
static SAVED_FROM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--\s*saved from url=\(\d+\)(\S+?)\s*-->").unwrap());
static CANONICAL: LazyLock<Selector> = LazyLock::new(|| selector(r#"link[rel="canonical"][href]"#));
static OG_URL: LazyLock<Selector> = LazyLock::new(|| selector(r#"meta[property="og:url"][content]"#));
static BASE_HREF: LazyLock<Selector> = LazyLock::new(|| selector("base[href]"));

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid page url {url:?}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Search,
    Other,
    /// The snapshot carries no page address.
    Unknown,
}

/// One rendered results page: the parsed tree plus the address it was
/// rendered from, which drives link resolution and pagination.
pub struct Snapshot {
    document: Html,
    page_url: Option<Url>,
    /// What relative links resolve against: `<base href>` when present,
    /// else the page URL.
    link_base: Option<Url>,
}

impl Snapshot {
    /// Parse `html`. Without an explicit `page_url` the address is recovered
    /// from the document itself.
    pub fn parse(html: &str, page_url: Option<Url>) -> Self {
        let document = Html::parse_document(html);
        let page_url = page_url.or_else(|| recover_page_url(html, &document));
        let link_base = document_base(&document, page_url.as_ref()).or_else(|| page_url.clone());
        Self {
            document,
            page_url,
            link_base,
        }
    }

    pub async fn load(path: &Path, page_url: Option<&str>) -> Result<Self, SnapshotError> {
        let page_url = page_url
            .map(|raw| {
                Url::parse(raw).map_err(|source| SnapshotError::InvalidUrl {
                    url: raw.to_string(),
                    source,
                })
            })
            .transpose()?;
        let html = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SnapshotError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let snapshot = Self::parse(&html, page_url);
        info!(
            path = %path.display(),
            bytes = html.len(),
            page_url = snapshot.page_url().map(Url::as_str).unwrap_or("-"),
            "Loaded snapshot"
        );
        Ok(snapshot)
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    pub fn page_url(&self) -> Option<&Url> {
        self.page_url.as_ref()
    }

    pub fn link_base(&self) -> Option<&Url> {
        self.link_base.as_ref()
    }

    pub fn page_number(&self) -> u32 {
        position::page_number(self.page_url())
    }

    /// Whether the snapshot is a results page, judged by substring patterns
    /// on its address.
    pub fn page_kind(&self, patterns: &[String]) -> PageKind {
        match &self.page_url {
            None => PageKind::Unknown,
            Some(url) if patterns.iter().any(|p| url.as_str().contains(p.as_str())) => {
                PageKind::Search
            }
            Some(_) => PageKind::Other,
        }
    }
}

/// First `<base href>`, itself resolved against the page URL.
fn document_base(document: &Html, page_url: Option<&Url>) -> Option<Url> {
    let raw = document
        .select(&BASE_HREF)
        .next()
        .and_then(|el| el.value().attr("href"))?
        .trim();
    let parsed = match page_url {
        Some(page) => page.join(raw),
        None => Url::parse(raw),
    };
    match parsed {
        Ok(url) => Some(url),
        Err(e) => {
            debug!(%raw, error = %e, "ignoring unusable base href");
            None
        }
    }
}

fn recover_page_url(html: &str, document: &Html) -> Option<Url> {
    let saved_from = SAVED_FROM_RE
        .captures(html)
        .map(|caps| caps[1].to_string());
    let canonical = || {
        document
            .select(&CANONICAL)
            .next()
            .and_then(|el| el.value().attr("href"))
            .map(str::to_string)
    };
    let og_url = || {
        document
            .select(&OG_URL)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(str::to_string)
    };

    let raw = saved_from.or_else(canonical).or_else(og_url)?;
    match Url::parse(raw.trim()) {
        Ok(url) => Some(url),
        Err(e) => {
            debug!(%raw, error = %e, "ignoring unparseable page url");
            None
        }
    }
}
