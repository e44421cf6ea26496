//! The extraction pipeline: feed tree → normalized records.
//!
//! Four stages, one per level of the feed (event, election, contest,
//! candidate). Each stage reads its own fields, hands its record to the sink,
//! then descends into its children in document order, passing the ids its
//! children need as foreign keys. Parents are always saved before the rows
//! that reference them.

use tally_core::{
  Candidate, Contest, Election, Event, Party, Record, RecordSink, Tally,
  TallyKind,
  summary::{CandidateSummary, ContestSummary, ElectionSummary, EventSummary},
};

use crate::{
  document::{
    FeedNode, Namespace,
    Namespace::{Eml, Feed},
  },
  error::{EntityPath, Error, Result},
};

/// Ids of the contest a candidate row belongs to.
#[derive(Debug, Clone, Copy)]
pub struct ContestKeys<'a> {
  pub event_id:    &'a str,
  pub election_id: &'a str,
  pub contest_id:  &'a str,
}

impl ContestKeys<'_> {
  fn path(&self) -> EntityPath {
    EntityPath::event(self.event_id)
      .election(self.election_id)
      .contest(self.contest_id)
  }
}

// ─── Event ───────────────────────────────────────────────────────────────────

/// Extract the event rooted at `root` (the document element) and everything
/// beneath it.
pub fn extract_event<N, S>(root: &N, sink: &mut S) -> Result<EventSummary>
where
  N: FeedNode,
  S: RecordSink,
{
  let path = EntityPath::default();
  let results = required_child(root, Feed, "Results", &path)?;
  let ident = required_child(results, Eml, "EventIdentifier", &path)?;
  let id = required_attribute(ident, "Id", &path)?;
  let path = EntityPath::event(id);
  let name = required_text(ident, Eml, "EventName", &path)?;

  save(
    sink,
    Record::Event(Event { id: id.to_owned(), name: name.to_owned() }),
  )?;

  let elections = results
    .descendants(Feed, "Election")
    .into_iter()
    .map(|election| extract_election(election, id, sink))
    .collect::<Result<Vec<_>>>()?;

  Ok(EventSummary {
    id: id.to_owned(),
    name: name.to_owned(),
    elections,
  })
}

// ─── Election ────────────────────────────────────────────────────────────────

pub fn extract_election<N, S>(
  node: &N,
  event_id: &str,
  sink: &mut S,
) -> Result<ElectionSummary>
where
  N: FeedNode,
  S: RecordSink,
{
  let path = EntityPath::event(event_id);
  let ident = required_child(node, Eml, "ElectionIdentifier", &path)?;
  let id = required_attribute(ident, "Id", &path)?;
  let path = path.election(id);
  let name = required_text(ident, Eml, "ElectionName", &path)?;
  let category = required_text(ident, Eml, "ElectionCategory", &path)?;

  save(
    sink,
    Record::Election(Election {
      event_id: event_id.to_owned(),
      id:       id.to_owned(),
      name:     name.to_owned(),
      category: category.to_owned(),
    }),
  )?;

  let contests = node
    .descendants(Feed, "Contest")
    .into_iter()
    .map(|contest| extract_contest(contest, event_id, id, sink))
    .collect::<Result<Vec<_>>>()?;

  tracing::debug!(
    event_id,
    election_id = id,
    contests = contests.len(),
    "extracted election"
  );

  Ok(ElectionSummary {
    id: id.to_owned(),
    name: name.to_owned(),
    category: category.to_owned(),
    contests,
  })
}

// ─── Contest ─────────────────────────────────────────────────────────────────

pub fn extract_contest<N, S>(
  node: &N,
  event_id: &str,
  election_id: &str,
  sink: &mut S,
) -> Result<ContestSummary>
where
  N: FeedNode,
  S: RecordSink,
{
  let path = EntityPath::event(event_id).election(election_id);
  let ident = required_child(node, Eml, "ContestIdentifier", &path)?;
  let id = required_attribute(ident, "Id", &path)?;
  let path = path.contest(id);
  let name = required_text(ident, Eml, "ContestName", &path)?;
  let enrolment = parse_count(
    node.child(Feed, "Enrolment").map(FeedNode::text),
    "enrolment",
    &path,
  )?;
  let first_preferences = required_child(node, Feed, "FirstPreferences", &path)?;

  save(
    sink,
    Record::Contest(Contest {
      event_id:    event_id.to_owned(),
      election_id: election_id.to_owned(),
      id:          id.to_owned(),
      name:        name.to_owned(),
      enrolment,
    }),
  )?;

  let keys = ContestKeys { event_id, election_id, contest_id: id };

  let mut tally = TallyKind::FirstPreferences;
  let mut candidates =
    extract_tally_section(first_preferences, keys, tally, sink)?;

  // Both sections are persisted; the summary keeps the two-candidate view
  // when there is one.
  if let Some(section) = node.child(Feed, "TwoCandidatePreferred") {
    tally = TallyKind::TwoCandidatePreferred;
    candidates = extract_tally_section(section, keys, tally, sink)?;
  }

  tracing::debug!(
    event_id,
    election_id,
    contest_id = id,
    candidates = candidates.len(),
    "extracted contest"
  );

  Ok(ContestSummary {
    id: id.to_owned(),
    name: name.to_owned(),
    enrolment,
    tally,
    candidates,
  })
}

fn extract_tally_section<N, S>(
  section: &N,
  keys: ContestKeys<'_>,
  kind: TallyKind,
  sink: &mut S,
) -> Result<Vec<CandidateSummary>>
where
  N: FeedNode,
  S: RecordSink,
{
  section
    .descendants(Feed, "Candidate")
    .into_iter()
    .map(|candidate| extract_candidate(candidate, keys, kind, sink))
    .collect()
}

// ─── Candidate & party ───────────────────────────────────────────────────────

/// Extract one candidate's identity, party and tally row of the given kind.
pub fn extract_candidate<N, S>(
  node: &N,
  keys: ContestKeys<'_>,
  kind: TallyKind,
  sink: &mut S,
) -> Result<CandidateSummary>
where
  N: FeedNode,
  S: RecordSink,
{
  let path = keys.path();
  let ident = required_child(node, Eml, "CandidateIdentifier", &path)?;
  let id = required_attribute(ident, "Id", &path)?;
  let path = path.candidate(id);
  let name = required_text(ident, Eml, "CandidateName", &path)?;

  let elected = coerce_flag(node.child(Feed, "Elected").map(FeedNode::text));
  // Incumbency mirrors `Elected`. The feed's own `<Incumbent>` element is
  // not read until it is settled which of the two is the source.
  let incumbent = elected;
  let votes =
    parse_count(node.child(Feed, "Votes").map(FeedNode::text), "votes", &path)?;

  let party = extract_party(node, &path, sink)?;

  save(
    sink,
    Record::Candidate(Candidate { id: id.to_owned(), name: name.to_owned() }),
  )?;
  save(
    sink,
    Record::Tally(Tally {
      kind,
      event_id: keys.event_id.to_owned(),
      election_id: keys.election_id.to_owned(),
      contest_id: keys.contest_id.to_owned(),
      candidate_id: id.to_owned(),
      party_id: party.as_ref().map(|p| p.id.clone()),
      elected,
      incumbent,
      votes,
    }),
  )?;

  Ok(CandidateSummary {
    id: id.to_owned(),
    name: name.to_owned(),
    elected,
    incumbent,
    votes,
    party,
  })
}

/// Extract the candidate's party affiliation, if it declares one.
pub fn extract_party<N, S>(
  node: &N,
  path: &EntityPath,
  sink: &mut S,
) -> Result<Option<Party>>
where
  N: FeedNode,
  S: RecordSink,
{
  let Some(affiliation) = node.child(Eml, "AffiliationIdentifier") else {
    return Ok(None);
  };

  let party = Party {
    id:   required_attribute(affiliation, "Id", path)?.to_owned(),
    code: affiliation.attribute("ShortCode").map(str::to_owned),
    name: required_text(affiliation, Eml, "RegisteredName", path)?.to_owned(),
  };
  save(sink, Record::Party(party.clone()))?;
  Ok(Some(party))
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// `"true"` → `Some(true)`, `"false"` → `Some(false)`, anything else → `None`.
pub fn coerce_flag(text: Option<&str>) -> Option<bool> {
  match text {
    Some("true") => Some(true),
    Some("false") => Some(false),
    _ => None,
  }
}

fn parse_count(
  text: Option<&str>,
  field: &'static str,
  path: &EntityPath,
) -> Result<u64> {
  let text = text.unwrap_or_default();
  text.trim().parse::<u64>().map_err(|_| Error::Format {
    path: path.clone(),
    field,
    value: text.to_owned(),
  })
}

fn required_child<'n, N: FeedNode>(
  node: &'n N,
  ns: Namespace,
  tag: &str,
  path: &EntityPath,
) -> Result<&'n N> {
  node.child(ns, tag).ok_or_else(|| {
    Error::malformed(path, format!("<{}> has no <{tag}>", node.tag()))
  })
}

fn required_attribute<'n, N: FeedNode>(
  node: &'n N,
  name: &str,
  path: &EntityPath,
) -> Result<&'n str> {
  node.attribute(name).ok_or_else(|| {
    Error::malformed(path, format!("<{}> has no {name} attribute", node.tag()))
  })
}

fn required_text<'n, N: FeedNode>(
  node: &'n N,
  ns: Namespace,
  tag: &str,
  path: &EntityPath,
) -> Result<&'n str> {
  required_child(node, ns, tag, path).map(FeedNode::text)
}

fn save<S: RecordSink>(sink: &mut S, record: Record) -> Result<()> {
  sink.save(record).map_err(|e| Error::Sink(Box::new(e)))
}
