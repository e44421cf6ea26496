//! Ingest orchestration: retrieve a feed document, extract it, store the rows.
//!
//! Events are processed one at a time. A document is extracted into a
//! [`RecordBuffer`] first and only then applied to the store as a single
//! transaction, so a document that fails to extract leaves the store
//! untouched.

pub mod error;
pub mod source;

pub use error::{Error, Result};

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tally_core::{
  MemorySink, Record, RecordBuffer, RecordSink, Table, store::ResultStore,
  summary::EventSummary,
};

use source::{FeedDocument, FeedSource};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `tally.toml` and `TALLY_*`
/// environment variables.
#[derive(Deserialize, Clone, Debug)]
pub struct IngestConfig {
  /// Root of the local feed mirror.
  pub feed_root:  PathBuf,
  /// SQLite database file.
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  /// Events to ingest when none are given on the command line. Empty means
  /// every event in the mirror.
  #[serde(default)]
  pub events:     Vec<String>,
}

fn default_store_path() -> PathBuf { PathBuf::from("results.sqlite") }

impl IngestConfig {
  /// Layer an optional TOML file under `TALLY_*` environment variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("TALLY")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("events"),
      )
      .build()?
      .try_deserialize()
  }
}

// ─── Reports ─────────────────────────────────────────────────────────────────

/// What one event's document produced.
#[derive(Debug, Clone)]
pub struct IngestReport {
  pub event_id: String,
  pub document: String,
  pub modified: DateTime<Utc>,
  /// Records emitted by extraction, counting repeats of the same key.
  pub records:  usize,
  /// Distinct rows per table described by the document.
  pub tables:   Vec<(Table, usize)>,
  pub summary:  EventSummary,
}

fn report(
  doc: FeedDocument,
  records: usize,
  distinct: &MemorySink,
  summary: EventSummary,
) -> IngestReport {
  IngestReport {
    event_id: doc.event_id,
    document: doc.name,
    modified: doc.modified,
    records,
    tables: Table::ALL.iter().map(|t| (*t, distinct.count(*t))).collect(),
    summary,
  }
}

fn distinct_rows(records: &[Record]) -> MemorySink {
  let mut sink = MemorySink::new();
  for record in records {
    // MemorySink cannot fail.
    let Ok(()) = sink.save(record.clone());
  }
  sink
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// Retrieve, extract and store the latest document for `event_id`.
///
/// Returns `Ok(None)` when the source has no document for the event.
pub async fn ingest_event<F, S>(
  source: &F,
  store: &S,
  event_id: &str,
) -> Result<Option<IngestReport>>
where
  F: FeedSource,
  S: ResultStore,
{
  let Some(doc) = source.latest(event_id)? else {
    tracing::warn!(event_id, "no feed documents");
    return Ok(None);
  };
  tracing::debug!(
    event_id,
    document = %doc.name,
    modified = %doc.modified,
    "retrieved feed document"
  );

  let mut buffer = RecordBuffer::new();
  let summary = tally_feed::extract_document(&doc.bytes, &mut buffer)
    .map_err(|err| Error::Feed { document: doc.name.clone(), source: err })?;
  let distinct = distinct_rows(buffer.records());

  let written = store
    .apply(buffer.into_records())
    .await
    .map_err(|e| Error::Store(Box::new(e)))?;

  tracing::info!(
    event_id,
    document = %doc.name,
    elections = summary.elections.len(),
    contests = summary.contest_count(),
    rows = written,
    "ingested event"
  );

  Ok(Some(report(doc, written, &distinct, summary)))
}

/// Extract the latest document for `event_id` without storing anything.
pub fn dry_run<F: FeedSource>(
  source: &F,
  event_id: &str,
) -> Result<Option<IngestReport>> {
  let Some(doc) = source.latest(event_id)? else {
    tracing::warn!(event_id, "no feed documents");
    return Ok(None);
  };

  let mut sink = MemorySink::new();
  let summary = tally_feed::extract_document(&doc.bytes, &mut sink)
    .map_err(|err| Error::Feed { document: doc.name.clone(), source: err })?;

  tracing::info!(
    event_id,
    document = %doc.name,
    contests = summary.contest_count(),
    records = sink.writes(),
    "extracted event (dry run)"
  );

  let records = sink.writes();
  Ok(Some(report(doc, records, &sink, summary)))
}

#[cfg(test)]
mod tests;
