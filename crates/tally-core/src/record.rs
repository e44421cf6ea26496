//! Normalized rows: the relational shape of one results feed.
//!
//! Every row type maps onto exactly one table. A [`Record`] is what the
//! extractor hands to a sink: it knows its [`Table`], the table's unique-key
//! columns, and its own column values, which is everything an upserting
//! backend needs.

use std::fmt;

use serde::Serialize;

// ─── Rows ────────────────────────────────────────────────────────────────────

/// The electoral event a document describes (e.g. a federal election).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
  pub id:   String,
  pub name: String,
}

/// One chamber-level election within an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Election {
  pub event_id: String,
  pub id:       String,
  pub name:     String,
  /// Chamber type, e.g. `House` or `Senate`.
  pub category: String,
}

/// A single electorate's race within an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contest {
  pub event_id:    String,
  pub election_id: String,
  pub id:          String,
  pub name:        String,
  /// Number of enrolled electors.
  pub enrolment:   u64,
}

/// Candidate identity. Not scoped to a contest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
  pub id:   String,
  pub name: String,
}

/// A registered party a candidate may be affiliated with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Party {
  pub id:   String,
  /// Short code such as `ALP`; the feed does not always supply one.
  pub code: Option<String>,
  pub name: String,
}

/// Which count a [`Tally`] row belongs to.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TallyKind {
  /// Primary votes, before any preference distribution.
  FirstPreferences,
  /// Votes after preferences are distributed down to the final two.
  TwoCandidatePreferred,
}

impl TallyKind {
  pub fn table(self) -> Table {
    match self {
      Self::FirstPreferences => Table::FirstPreferences,
      Self::TwoCandidatePreferred => Table::TwoCandidatePreferred,
    }
  }
}

/// One candidate's votes in one contest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tally {
  pub kind:         TallyKind,
  pub event_id:     String,
  pub election_id:  String,
  pub contest_id:   String,
  pub candidate_id: String,
  pub party_id:     Option<String>,
  /// `None` when the feed's flag is absent or unrecognised.
  pub elected:      Option<bool>,
  pub incumbent:    Option<bool>,
  pub votes:        u64,
}

// ─── Tables ──────────────────────────────────────────────────────────────────

/// The seven output tables.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Table {
  Event,
  Election,
  Contest,
  Candidate,
  Party,
  FirstPreferences,
  TwoCandidatePreferred,
}

impl Table {
  pub const ALL: [Table; 7] = [
    Table::Event,
    Table::Election,
    Table::Contest,
    Table::Candidate,
    Table::Party,
    Table::FirstPreferences,
    Table::TwoCandidatePreferred,
  ];

  pub fn name(self) -> &'static str {
    match self {
      Self::Event => "event",
      Self::Election => "election",
      Self::Contest => "contest",
      Self::Candidate => "candidate",
      Self::Party => "party",
      Self::FirstPreferences => "first_preferences",
      Self::TwoCandidatePreferred => "two_candidate_preferred",
    }
  }

  /// Columns that together identify a row; writes upsert on this tuple.
  pub fn unique_keys(self) -> &'static [&'static str] {
    match self {
      Self::Event | Self::Candidate | Self::Party => &["id"],
      Self::Election => &["event_id", "id"],
      Self::Contest => &["event_id", "election_id", "id"],
      Self::FirstPreferences | Self::TwoCandidatePreferred => {
        &["event_id", "election_id", "contest_id", "candidate_id"]
      }
    }
  }
}

impl fmt::Display for Table {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(self.name())
  }
}

// ─── Values ──────────────────────────────────────────────────────────────────

/// A single column value, independent of any storage backend.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
  Null,
  Text(String),
  Integer(u64),
  Boolean(bool),
}

impl From<String> for Value {
  fn from(s: String) -> Self { Value::Text(s) }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self { Value::Text(s.to_owned()) }
}

impl From<u64> for Value {
  fn from(n: u64) -> Self { Value::Integer(n) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(v: Option<T>) -> Self { v.map_or(Value::Null, Into::into) }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self { Value::Boolean(b) }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// Any row the extractor emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
  Event(Event),
  Election(Election),
  Contest(Contest),
  Candidate(Candidate),
  Party(Party),
  Tally(Tally),
}

impl Record {
  pub fn table(&self) -> Table {
    match self {
      Self::Event(_) => Table::Event,
      Self::Election(_) => Table::Election,
      Self::Contest(_) => Table::Contest,
      Self::Candidate(_) => Table::Candidate,
      Self::Party(_) => Table::Party,
      Self::Tally(t) => t.kind.table(),
    }
  }

  /// Column name / value pairs in table column order.
  pub fn columns(&self) -> Vec<(&'static str, Value)> {
    match self {
      Self::Event(e) => {
        vec![("id", e.id.as_str().into()), ("name", e.name.as_str().into())]
      }
      Self::Election(e) => vec![
        ("event_id", e.event_id.as_str().into()),
        ("id", e.id.as_str().into()),
        ("name", e.name.as_str().into()),
        ("category", e.category.as_str().into()),
      ],
      Self::Contest(c) => vec![
        ("event_id", c.event_id.as_str().into()),
        ("election_id", c.election_id.as_str().into()),
        ("id", c.id.as_str().into()),
        ("name", c.name.as_str().into()),
        ("enrolment", c.enrolment.into()),
      ],
      Self::Candidate(c) => {
        vec![("id", c.id.as_str().into()), ("name", c.name.as_str().into())]
      }
      Self::Party(p) => vec![
        ("id", p.id.as_str().into()),
        ("code", p.code.as_deref().into()),
        ("name", p.name.as_str().into()),
      ],
      Self::Tally(t) => vec![
        ("event_id", t.event_id.as_str().into()),
        ("election_id", t.election_id.as_str().into()),
        ("contest_id", t.contest_id.as_str().into()),
        ("candidate_id", t.candidate_id.as_str().into()),
        ("party_id", t.party_id.as_deref().into()),
        ("elected", t.elected.into()),
        ("incumbent", t.incumbent.into()),
        ("votes", t.votes.into()),
      ],
    }
  }

  /// Values of the table's unique-key columns, in key order.
  pub fn key(&self) -> Vec<Value> {
    let keys = self.table().unique_keys();
    let columns = self.columns();
    keys
      .iter()
      .filter_map(|k| {
        columns.iter().find(|(c, _)| c == k).map(|(_, v)| v.clone())
      })
      .collect()
  }
}
