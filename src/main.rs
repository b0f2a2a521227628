mod export;
mod parser;
mod settings;
mod snapshot;
mod status;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use export::{Format, Target};
use parser::tiers::Tier;
use parser::ResultRecord;
use settings::Settings;
use snapshot::{PageKind, Snapshot};
use status::Outcome;

#[derive(Parser)]
#[command(name = "serp_export", about = "Export saved search result pages to CSV")]
struct Cli {
    /// Settings file (default: serp_export.{toml,json,yaml} when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export one saved results page
    Extract {
        /// Saved HTML of the rendered results page
        input: PathBuf,
        /// Address the page was rendered from (default: read from the snapshot)
        #[arg(long)]
        url: Option<String>,
        /// Output path, or "-" for stdout (default: google_search_results.<ext>)
        #[arg(short, long)]
        output: Option<String>,
        #[arg(short, long, value_enum, default_value_t = Format::Csv)]
        format: Format,
        /// Export even when the page address is not a supported results page
        #[arg(long)]
        allow_any_page: bool,
    },
    /// Export many saved pages, one output file each
    Batch {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Directory for per-page output files
        #[arg(long)]
        out_dir: PathBuf,
        /// Also write every record from every page to this one file
        #[arg(long)]
        combined: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = Format::Csv)]
        format: Format,
        #[arg(long)]
        allow_any_page: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Logs go to stderr; stdout may carry the export itself.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    info!(?settings, "Settings loaded");

    let result = match cli.command {
        Commands::Extract {
            input,
            url,
            output,
            format,
            allow_any_page,
        } => {
            let target = match output {
                Some(raw) => Target::parse(&raw),
                None => Target::File(default_output(&settings, format)),
            };
            run_extract(&settings, &input, url.as_deref(), target, format, allow_any_page).await
        }
        Commands::Batch {
            inputs,
            out_dir,
            combined,
            format,
            allow_any_page,
        } => run_batch(&settings, &inputs, &out_dir, combined.as_deref(), format, allow_any_page).await,
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => Outcome::Failed(format!("{:#}", e)),
    };
    status::report(&outcome);

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        info!("Done in {}", format_duration(elapsed));
    }

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn run_extract(
    settings: &Settings,
    input: &Path,
    url: Option<&str>,
    target: Target,
    format: Format,
    allow_any_page: bool,
) -> Result<Outcome> {
    let snapshot = Snapshot::load(input, url).await?;
    if let Some(outcome) = check_page(&snapshot, settings, allow_any_page) {
        return Ok(outcome);
    }

    let extraction = parser::extract(&snapshot, settings.thresholds());
    if extraction.records.is_empty() {
        return Ok(Outcome::NoResults);
    }
    if extraction.ran(Tier::Links) {
        warn!("Fell back to bare links; titles may be noisy and sponsorship is unknown");
    }

    let payload = format.render(&extraction.records)?;
    export::deliver(&payload, &target).await?;
    Ok(Outcome::Exported {
        count: extraction.records.len(),
        target,
    })
}

/// Batch counters, printed once at the end.
#[derive(Default)]
struct BatchStats {
    total: usize,
    exported: usize,
    empty: usize,
    skipped: usize,
    errors: usize,
}

enum PageResult {
    Exported(Vec<ResultRecord>),
    Empty,
    WrongPage,
}

async fn run_batch(
    settings: &Settings,
    inputs: &[PathBuf],
    out_dir: &Path,
    combined: Option<&Path>,
    format: Format,
    allow_any_page: bool,
) -> Result<Outcome> {
    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {wide_msg}")?
            .progress_chars("=> "),
    );

    let mut stats = BatchStats::default();
    let mut all_records = Vec::new();
    let mut written = HashSet::new();

    for input in inputs {
        pb.set_message(input.display().to_string());
        stats.total += 1;
        match export_page(settings, input, out_dir, &mut written, format, allow_any_page).await {
            Ok(PageResult::Exported(records)) => {
                stats.exported += 1;
                all_records.extend(records);
            }
            Ok(PageResult::Empty) => stats.empty += 1,
            Ok(PageResult::WrongPage) => stats.skipped += 1,
            Err(e) => {
                warn!("Export failed for {}: {:#}", input.display(), e);
                stats.errors += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    println!(
        "Done: {} pages ({} exported, {} empty, {} wrong page type, {} errors), {} records.",
        stats.total, stats.exported, stats.empty, stats.skipped, stats.errors, all_records.len()
    );

    if all_records.is_empty() {
        return Ok(Outcome::NoResults);
    }

    let target = match combined {
        Some(path) => {
            let target = Target::File(path.to_path_buf());
            export::deliver(&format.render(&all_records)?, &target).await?;
            target
        }
        None => Target::File(out_dir.to_path_buf()),
    };
    Ok(Outcome::Exported {
        count: all_records.len(),
        target,
    })
}

async fn export_page(
    settings: &Settings,
    input: &Path,
    out_dir: &Path,
    written: &mut HashSet<PathBuf>,
    format: Format,
    allow_any_page: bool,
) -> Result<PageResult> {
    let snapshot = Snapshot::load(input, None).await?;
    if check_page(&snapshot, settings, allow_any_page).is_some() {
        warn!("Skipping {}: not a search results page", input.display());
        return Ok(PageResult::WrongPage);
    }

    let extraction = parser::extract(&snapshot, settings.thresholds());
    if extraction.records.is_empty() {
        warn!("No results in {}", input.display());
        return Ok(PageResult::Empty);
    }

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(settings.output_stem.as_str());
    let path = unique_output(out_dir, stem, format, written);
    export::deliver(&format.render(&extraction.records)?, &Target::File(path))
        .await
        .with_context(|| format!("Failed to export {}", input.display()))?;
    Ok(PageResult::Exported(extraction.records))
}

/// `out_dir/<stem>.<ext>`, or `<stem>-2.<ext>` and up when an earlier page
/// of this batch already took that name.
fn unique_output(out_dir: &Path, stem: &str, format: Format, written: &mut HashSet<PathBuf>) -> PathBuf {
    let mut path = out_dir.join(format!("{}.{}", stem, format.extension()));
    let mut n = 1;
    while !written.insert(path.clone()) {
        n += 1;
        path = out_dir.join(format!("{}-{}.{}", stem, n, format.extension()));
    }
    path
}

/// `Some` when the snapshot must not be exported.
fn check_page(snapshot: &Snapshot, settings: &Settings, allow_any_page: bool) -> Option<Outcome> {
    match snapshot.page_kind(&settings.supported_pages) {
        PageKind::Search => None,
        PageKind::Unknown => {
            warn!("Snapshot has no page address; assuming page 1 and absolute links");
            None
        }
        PageKind::Other if allow_any_page => None,
        PageKind::Other => Some(Outcome::WrongPageType {
            url: snapshot
                .page_url()
                .map(|u| u.to_string())
                .unwrap_or_default(),
        }),
    }
}

fn default_output(settings: &Settings, format: Format) -> PathBuf {
    PathBuf::from(format!("{}.{}", settings.output_stem, format.extension()))
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

// ── Tests ──
