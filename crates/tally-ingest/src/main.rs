//! tally-ingest binary.
//!
//! Reads `tally.toml` (or the path given with `--config`), finds the latest
//! media-feed document for each requested event in the local mirror, and
//! upserts the extracted rows into the SQLite results store.
//!
//! ```
//! tally-ingest --config tally.toml 25820 27966
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use tally_ingest::{
  IngestConfig, IngestReport, dry_run, ingest_event,
  source::{FeedSource, MirrorSource},
};
use tally_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Election results feed ingester")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "tally.toml")]
  config: PathBuf,

  /// Extract and report without opening the store.
  #[arg(long)]
  dry_run: bool,

  /// Print each event's summary tree as JSON.
  #[arg(long)]
  summary: bool,

  /// Event ids to ingest. Defaults to the configured list, then to every
  /// event in the mirror.
  events: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = IngestConfig::load(&cli.config)
    .with_context(|| format!("failed to load config from {:?}", cli.config))?;

  let source = MirrorSource::new(expand_tilde(&cfg.feed_root));

  let events = if !cli.events.is_empty() {
    cli.events.clone()
  } else if !cfg.events.is_empty() {
    cfg.events.clone()
  } else {
    source
      .event_ids()
      .context("failed to list events in the feed mirror")?
  };
  if events.is_empty() {
    tracing::warn!("no events to ingest");
    return Ok(());
  }

  let store = if cli.dry_run {
    None
  } else {
    let store_path = expand_tilde(&cfg.store_path);
    let store = SqliteStore::open(&store_path)
      .await
      .with_context(|| format!("failed to open store at {store_path:?}"))?;
    Some(store)
  };

  let mut failed = 0usize;
  for event_id in &events {
    let outcome = match &store {
      Some(store) => ingest_event(&source, store, event_id).await,
      None => dry_run(&source, event_id),
    };

    match outcome {
      Ok(Some(report)) => print_report(&cli, &report)?,
      Ok(None) => {}
      Err(e) => {
        tracing::error!(event_id, "{e}");
        failed += 1;
      }
    }
  }

  if failed > 0 {
    anyhow::bail!("{failed} of {} events failed", events.len());
  }
  Ok(())
}

fn print_report(cli: &Cli, report: &IngestReport) -> anyhow::Result<()> {
  if cli.dry_run {
    println!("{} ({})", report.event_id, report.document);
    for (table, rows) in &report.tables {
      println!("  {table:<24} {rows}");
    }
  }
  if cli.summary {
    let json = serde_json::to_string_pretty(&report.summary)
      .context("failed to serialise summary")?;
    println!("{json}");
  }
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
