//! The `ResultStore` trait.
//!
//! Implemented by durable backends (e.g. `tally-store-sqlite`). The ingester
//! depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::record::{Contest, Record, Table, Tally, TallyKind};

/// Durable, upserting storage for extracted rows.
///
/// All methods return `Send` futures so a store can be shared across tasks of
/// a multi-threaded runtime.
pub trait ResultStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Upsert every record, in order, as one atomic unit. Either all of them are
  /// stored or none are. Returns the number of records written.
  fn apply(
    &self,
    records: Vec<Record>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Number of rows currently stored in `table`.
  fn count(
    &self,
    table: Table,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// All tally rows of one kind, ordered by contest then candidate.
  fn tallies(
    &self,
    kind: TallyKind,
  ) -> impl Future<Output = Result<Vec<Tally>, Self::Error>> + Send + '_;

  /// All contests, ordered by key.
  fn contests(
    &self,
  ) -> impl Future<Output = Result<Vec<Contest>, Self::Error>> + Send + '_;
}
