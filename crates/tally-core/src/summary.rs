//! The in-memory summary tree returned by extraction.
//!
//! Tables are the source of truth; the summary is a convenience view of one
//! document, nested event → election → contest → candidate.

use serde::Serialize;

use crate::record::{Party, TallyKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventSummary {
  pub id:        String,
  pub name:      String,
  pub elections: Vec<ElectionSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElectionSummary {
  pub id:       String,
  pub name:     String,
  pub category: String,
  pub contests: Vec<ContestSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContestSummary {
  pub id:         String,
  pub name:       String,
  pub enrolment:  u64,
  /// Which count `candidates` was taken from. Two-candidate-preferred wins
  /// when the contest reports it.
  pub tally:      TallyKind,
  pub candidates: Vec<CandidateSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateSummary {
  pub id:        String,
  pub name:      String,
  pub elected:   Option<bool>,
  pub incumbent: Option<bool>,
  pub votes:     u64,
  pub party:     Option<Party>,
}

impl EventSummary {
  /// Total number of contests across all elections.
  pub fn contest_count(&self) -> usize {
    self.elections.iter().map(|e| e.contests.len()).sum()
  }
}
