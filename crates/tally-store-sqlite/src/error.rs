//! Error type for `tally-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A count does not fit SQLite's signed 64-bit integers (or a stored one
  /// is negative).
  #[error("{column} value {value} is out of range")]
  IntegerRange { column: &'static str, value: String },

  #[error("{column} holds {value}, expected 0 or 1")]
  UnknownBoolean { column: &'static str, value: i64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
