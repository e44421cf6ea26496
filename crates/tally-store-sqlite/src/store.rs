//! The SQLite implementation of [`ResultStore`].

use std::path::Path;

use tally_core::{Contest, Record, Table, Tally, TallyKind, store::ResultStore};

use crate::{
  Result,
  encode::{EncodedRecord, RawContest, RawTally, decode_count, encode_record},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A results store backed by a single SQLite file.
///
/// Cloning shares the inner connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ResultStore impl ────────────────────────────────────────────────────────

impl ResultStore for SqliteStore {
  type Error = crate::Error;

  async fn apply(&self, records: Vec<Record>) -> Result<usize> {
    let encoded = records
      .into_iter()
      .map(encode_record)
      .collect::<Result<Vec<EncodedRecord>>>()?;

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for record in &encoded {
          let mut stmt = tx.prepare_cached(&record.sql)?;
          stmt.execute(rusqlite::params_from_iter(record.params.iter()))?;
        }
        tx.commit()?;
        Ok(encoded.len())
      })
      .await?;

    Ok(written)
  }

  async fn count(&self, table: Table) -> Result<u64> {
    let sql = format!("SELECT COUNT(*) FROM {table}");

    let n: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, [], |row| row.get(0))?))
      .await?;

    decode_count("count", n)
  }

  async fn tallies(&self, kind: TallyKind) -> Result<Vec<Tally>> {
    let sql = format!(
      "SELECT event_id, election_id, contest_id, candidate_id, party_id,
              elected, incumbent, votes
       FROM {}
       ORDER BY event_id, election_id, contest_id, candidate_id",
      kind.table()
    );

    let raws: Vec<RawTally> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawTally {
              event_id:     row.get(0)?,
              election_id:  row.get(1)?,
              contest_id:   row.get(2)?,
              candidate_id: row.get(3)?,
              party_id:     row.get(4)?,
              elected:      row.get(5)?,
              incumbent:    row.get(6)?,
              votes:        row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(|r| r.into_tally(kind)).collect()
  }

  async fn contests(&self) -> Result<Vec<Contest>> {
    let raws: Vec<RawContest> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT event_id, election_id, id, name, enrolment FROM contest
           ORDER BY event_id, election_id, id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawContest {
              event_id:    row.get(0)?,
              election_id: row.get(1)?,
              id:          row.get(2)?,
              name:        row.get(3)?,
              enrolment:   row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawContest::into_contest).collect()
  }
}
