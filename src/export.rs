use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::parser::ResultRecord;

const CSV_HEADER: &str = "Position,Title,URL,Snippet,Sponsored";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to encode records as json")]
    Json(#[from] serde_json::Error),
    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write to stdout")]
    Stdout(#[source] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    #[default]
    Csv,
    Json,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Json => "json",
        }
    }

    pub fn render(self, records: &[ResultRecord]) -> Result<String, ExportError> {
        match self {
            Format::Csv => Ok(to_csv(records)),
            Format::Json => to_json(records),
        }
    }
}

/// Where a payload goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Stdout,
    File(PathBuf),
}

impl Target {
    /// `-` is stdout, anything else a file path.
    pub fn parse(raw: &str) -> Self {
        if raw == "-" {
            Target::Stdout
        } else {
            Target::File(PathBuf::from(raw))
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Stdout => f.write_str("stdout"),
            Target::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Header plus one row per record, `\n` separated, no trailing newline.
/// Free-text fields are always quoted; an empty list renders as "".
pub fn to_csv(records: &[ResultRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(CSV_HEADER.to_string());
    lines.extend(records.iter().map(|r| {
        format!(
            "{},{},{},{},{}",
            r.position,
            quote(&r.title),
            quote(&r.url),
            quote(&r.snippet),
            r.sponsored
        )
    }));
    lines.join("\n")
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

pub fn to_json(records: &[ResultRecord]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(records)?)
}

pub async fn deliver(payload: &str, target: &Target) -> Result<(), ExportError> {
    match target {
        Target::Stdout => {
            let mut out = tokio::io::stdout();
            out.write_all(payload.as_bytes())
                .await
                .map_err(ExportError::Stdout)?;
            if !payload.is_empty() && !payload.ends_with('\n') {
                out.write_all(b"\n").await.map_err(ExportError::Stdout)?;
            }
            out.flush().await.map_err(ExportError::Stdout)
        }
        Target::File(path) => write_file(path, payload).await,
    }
}

async fn write_file(path: &Path, payload: &str) -> Result<(), ExportError> {
    let write_err = |source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    tokio::fs::write(path, payload).await.map_err(write_err)?;
    info!(path = %path.display(), bytes = payload.len(), "Wrote export");
    Ok(())
}
