//! The `RecordSink` trait and two in-memory sinks.
//!
//! The extractor is handed a sink explicitly; it never reaches for a global.
//! [`RecordBuffer`] keeps every record in emission order so a whole document
//! can be committed at once. [`MemorySink`] applies upsert semantics in
//! memory and is what tests and dry runs inspect.

use std::{collections::BTreeMap, convert::Infallible};

use crate::record::{Record, Table, Tally, TallyKind, Value};

/// Receives rows from the extractor.
///
/// Implementations upsert on [`Table::unique_keys`]: saving a record whose
/// key already exists replaces the stored row, and saving an identical record
/// twice is a no-op.
pub trait RecordSink {
  type Error: std::error::Error + Send + Sync + 'static;

  fn save(&mut self, record: Record) -> Result<(), Self::Error>;
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
  type Error = S::Error;

  fn save(&mut self, record: Record) -> Result<(), Self::Error> {
    (**self).save(record)
  }
}

// ─── RecordBuffer ────────────────────────────────────────────────────────────

/// Collects records in the order they were emitted.
#[derive(Debug, Default)]
pub struct RecordBuffer {
  records: Vec<Record>,
}

impl RecordBuffer {
  pub fn new() -> Self { Self::default() }

  pub fn len(&self) -> usize { self.records.len() }

  pub fn is_empty(&self) -> bool { self.records.is_empty() }

  pub fn records(&self) -> &[Record] { &self.records }

  pub fn into_records(self) -> Vec<Record> { self.records }
}

impl RecordSink for RecordBuffer {
  type Error = Infallible;

  fn save(&mut self, record: Record) -> Result<(), Infallible> {
    self.records.push(record);
    Ok(())
  }
}

// ─── MemorySink ──────────────────────────────────────────────────────────────

/// An upserting in-memory table set.
#[derive(Debug, Default)]
pub struct MemorySink {
  rows:   BTreeMap<(Table, Vec<Value>), Record>,
  /// Number of `save` calls, including ones that overwrote an existing row.
  writes: usize,
}

impl MemorySink {
  pub fn new() -> Self { Self::default() }

  /// Rows currently stored in `table`, ordered by key.
  pub fn rows(&self, table: Table) -> impl Iterator<Item = &Record> + '_ {
    self
      .rows
      .iter()
      .filter(move |((t, _), _)| *t == table)
      .map(|(_, record)| record)
  }

  pub fn count(&self, table: Table) -> usize { self.rows(table).count() }

  pub fn writes(&self) -> usize { self.writes }

  /// Look up one row by its unique-key values.
  pub fn get(&self, table: Table, key: &[&str]) -> Option<&Record> {
    let key = key.iter().map(|k| Value::from(*k)).collect();
    self.rows.get(&(table, key))
  }

  pub fn tallies(&self, kind: TallyKind) -> Vec<&Tally> {
    self
      .rows(kind.table())
      .filter_map(|r| match r {
        Record::Tally(t) => Some(t),
        _ => None,
      })
      .collect()
  }
}

impl RecordSink for MemorySink {
  type Error = Infallible;

  fn save(&mut self, record: Record) -> Result<(), Infallible> {
    self.writes += 1;
    self.rows.insert((record.table(), record.key()), record);
    Ok(())
  }
}
