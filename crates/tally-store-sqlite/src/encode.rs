//! Encoding and decoding between [`tally_core`] values and SQLite columns.
//!
//! Counts are stored as signed 64-bit integers, tri-state flags as `0`, `1`
//! or `NULL`, everything else as text.

use rusqlite::types::Value as SqlValue;
use tally_core::{Contest, Record, Table, Tally, TallyKind, Value};

use crate::{Error, Result};

// ─── Writes ──────────────────────────────────────────────────────────────────

pub fn encode_value(column: &'static str, value: Value) -> Result<SqlValue> {
  Ok(match value {
    Value::Null => SqlValue::Null,
    Value::Text(s) => SqlValue::Text(s),
    Value::Integer(n) => SqlValue::Integer(i64::try_from(n).map_err(|_| {
      Error::IntegerRange { column, value: n.to_string() }
    })?),
    Value::Boolean(b) => SqlValue::Integer(i64::from(b)),
  })
}

/// `INSERT … ON CONFLICT (<unique keys>) DO UPDATE SET <other columns>`.
///
/// Falls back to `DO NOTHING` when every column is part of the key.
pub fn upsert_sql(table: Table, columns: &[&str]) -> String {
  let keys = table.unique_keys();
  let placeholders: Vec<String> =
    (1..=columns.len()).map(|i| format!("?{i}")).collect();
  let updates: Vec<String> = columns
    .iter()
    .filter(|c| !keys.iter().any(|k| k == *c))
    .map(|c| format!("{c} = excluded.{c}"))
    .collect();

  let action = if updates.is_empty() {
    "DO NOTHING".to_owned()
  } else {
    format!("DO UPDATE SET {}", updates.join(", "))
  };

  format!(
    "INSERT INTO {table} ({}) VALUES ({}) ON CONFLICT ({}) {action}",
    columns.join(", "),
    placeholders.join(", "),
    keys.join(", "),
  )
}

/// A record turned into its upsert statement and bound parameters.
pub struct EncodedRecord {
  pub sql:    String,
  pub params: Vec<SqlValue>,
}

pub fn encode_record(record: Record) -> Result<EncodedRecord> {
  let table = record.table();
  let columns = record.columns();
  let names: Vec<&str> = columns.iter().map(|(c, _)| *c).collect();
  let sql = upsert_sql(table, &names);
  let params = columns
    .into_iter()
    .map(|(c, v)| encode_value(c, v))
    .collect::<Result<Vec<_>>>()?;
  Ok(EncodedRecord { sql, params })
}

// ─── Reads ───────────────────────────────────────────────────────────────────

pub fn decode_count(column: &'static str, n: i64) -> Result<u64> {
  u64::try_from(n)
    .map_err(|_| Error::IntegerRange { column, value: n.to_string() })
}

pub fn decode_flag(column: &'static str, n: Option<i64>) -> Result<Option<bool>> {
  match n {
    None => Ok(None),
    Some(0) => Ok(Some(false)),
    Some(1) => Ok(Some(true)),
    Some(value) => Err(Error::UnknownBoolean { column, value }),
  }
}

/// Intermediate representation of a `contest` row.
pub struct RawContest {
  pub event_id:    String,
  pub election_id: String,
  pub id:          String,
  pub name:        String,
  pub enrolment:   i64,
}

impl RawContest {
  pub fn into_contest(self) -> Result<Contest> {
    Ok(Contest {
      event_id:    self.event_id,
      election_id: self.election_id,
      id:          self.id,
      name:        self.name,
      enrolment:   decode_count("enrolment", self.enrolment)?,
    })
  }
}

/// Intermediate representation of a tally row, either table.
pub struct RawTally {
  pub event_id:     String,
  pub election_id:  String,
  pub contest_id:   String,
  pub candidate_id: String,
  pub party_id:     Option<String>,
  pub elected:      Option<i64>,
  pub incumbent:    Option<i64>,
  pub votes:        i64,
}

impl RawTally {
  pub fn into_tally(self, kind: TallyKind) -> Result<Tally> {
    Ok(Tally {
      kind,
      event_id: self.event_id,
      election_id: self.election_id,
      contest_id: self.contest_id,
      candidate_id: self.candidate_id,
      party_id: self.party_id,
      elected: decode_flag("elected", self.elected)?,
      incumbent: decode_flag("incumbent", self.incumbent)?,
      votes: decode_count("votes", self.votes)?,
    })
  }
}
