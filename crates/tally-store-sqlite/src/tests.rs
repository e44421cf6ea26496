//! Integration tests for `SqliteStore` against an in-memory database.

use tally_core::{
  Candidate, Contest, Election, Event, Party, Record, RecordBuffer, Table,
  Tally, TallyKind, store::ResultStore,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn parents() -> Vec<Record> {
  vec![
    Record::Event(Event {
      id:   "25820".into(),
      name: "2020 Federal Election".into(),
    }),
    Record::Election(Election {
      event_id: "25820".into(),
      id:       "H".into(),
      name:     "House of Representatives".into(),
      category: "House".into(),
    }),
    Record::Contest(Contest {
      event_id:    "25820".into(),
      election_id: "H".into(),
      id:          "179".into(),
      name:        "Higgins".into(),
      enrolment:   100000,
    }),
    Record::Candidate(Candidate {
      id:   "1001".into(),
      name: "A Citizen".into(),
    }),
  ]
}

fn alp() -> Record {
  Record::Party(Party {
    id:   "200".into(),
    code: Some("ALP".into()),
    name: "Australian Labor Party".into(),
  })
}

fn tally(kind: TallyKind, party_id: Option<&str>, votes: u64) -> Tally {
  Tally {
    kind,
    event_id: "25820".into(),
    election_id: "H".into(),
    contest_id: "179".into(),
    candidate_id: "1001".into(),
    party_id: party_id.map(str::to_owned),
    elected: Some(true),
    incumbent: Some(true),
    votes,
  }
}

fn higgins() -> Vec<Record> {
  let mut records = parents();
  records.push(alp());
  records.push(Record::Tally(tally(
    TallyKind::FirstPreferences,
    Some("200"),
    55000,
  )));
  records
}

// ─── Writes ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn apply_writes_every_table() {
  let s = store().await;
  let written = s.apply(higgins()).await.unwrap();
  assert_eq!(written, 6);

  for table in [
    Table::Event,
    Table::Election,
    Table::Contest,
    Table::Candidate,
    Table::Party,
    Table::FirstPreferences,
  ] {
    assert_eq!(s.count(table).await.unwrap(), 1, "{table}");
  }
  assert_eq!(s.count(Table::TwoCandidatePreferred).await.unwrap(), 0);

  let tallies = s.tallies(TallyKind::FirstPreferences).await.unwrap();
  assert_eq!(tallies, vec![tally(
    TallyKind::FirstPreferences,
    Some("200"),
    55000
  )]);

  let contests = s.contests().await.unwrap();
  assert_eq!(contests.len(), 1);
  assert_eq!(contests[0].name, "Higgins");
  assert_eq!(contests[0].enrolment, 100000);
}

#[tokio::test]
async fn reapplying_is_idempotent() {
  let s = store().await;
  s.apply(higgins()).await.unwrap();
  s.apply(higgins()).await.unwrap();

  for table in Table::ALL {
    let expected = u64::from(table != Table::TwoCandidatePreferred);
    assert_eq!(s.count(table).await.unwrap(), expected, "{table}");
  }
}

#[tokio::test]
async fn upsert_replaces_non_key_columns() {
  let s = store().await;
  s.apply(higgins()).await.unwrap();

  let mut updated = tally(TallyKind::FirstPreferences, Some("200"), 61000);
  updated.elected = None;
  s.apply(vec![Record::Tally(updated.clone())]).await.unwrap();

  let tallies = s.tallies(TallyKind::FirstPreferences).await.unwrap();
  assert_eq!(tallies, vec![updated]);
}

#[tokio::test]
async fn both_tally_kinds_are_kept_apart() {
  let s = store().await;
  let mut records = higgins();
  records.push(Record::Tally(tally(
    TallyKind::TwoCandidatePreferred,
    Some("200"),
    60000,
  )));
  s.apply(records).await.unwrap();

  let fp = s.tallies(TallyKind::FirstPreferences).await.unwrap();
  let tcp = s.tallies(TallyKind::TwoCandidatePreferred).await.unwrap();
  assert_eq!(fp[0].votes, 55000);
  assert_eq!(tcp[0].votes, 60000);
  assert_eq!(tcp[0].kind, TallyKind::TwoCandidatePreferred);
}

#[tokio::test]
async fn null_party_is_stored_as_null() {
  let s = store().await;
  let mut records = parents();
  records.push(Record::Tally(tally(TallyKind::FirstPreferences, None, 12)));
  s.apply(records).await.unwrap();

  assert_eq!(s.count(Table::Party).await.unwrap(), 0);
  let tallies = s.tallies(TallyKind::FirstPreferences).await.unwrap();
  assert_eq!(tallies[0].party_id, None);
}

// ─── Failure atomicity ───────────────────────────────────────────────────────

#[tokio::test]
async fn dangling_foreign_key_rolls_back_the_batch() {
  let s = store().await;

  // Party 999 was never saved.
  let mut records = parents();
  records.push(Record::Tally(tally(
    TallyKind::FirstPreferences,
    Some("999"),
    1,
  )));

  let err = s.apply(records).await.unwrap_err();
  assert!(matches!(err, Error::Database(_)), "{err}");

  for table in Table::ALL {
    assert_eq!(s.count(table).await.unwrap(), 0, "{table}");
  }
}

#[tokio::test]
async fn out_of_range_count_is_rejected_before_writing() {
  let s = store().await;
  let mut records = higgins();
  records.push(Record::Tally(tally(
    TallyKind::TwoCandidatePreferred,
    None,
    u64::MAX,
  )));

  let err = s.apply(records).await.unwrap_err();
  assert!(matches!(err, Error::IntegerRange { column: "votes", .. }), "{err}");
  assert_eq!(s.count(Table::Event).await.unwrap(), 0);
}

// ─── End to end ──────────────────────────────────────────────────────────────

const FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<MediaFeed xmlns="http://www.aec.gov.au/xml/schema/mediafeed"
           xmlns:eml="urn:oasis:names:tc:evs:schema:eml">
  <Results>
    <eml:EventIdentifier Id="25820"><eml:EventName>2020 Federal Election</eml:EventName></eml:EventIdentifier>
    <Election>
      <eml:ElectionIdentifier Id="H">
        <eml:ElectionName>House of Representatives Election</eml:ElectionName>
        <eml:ElectionCategory>House</eml:ElectionCategory>
      </eml:ElectionIdentifier>
      <House><Contests>
        <Contest>
          <eml:ContestIdentifier Id="179"><eml:ContestName>Higgins</eml:ContestName></eml:ContestIdentifier>
          <Enrolment>100000</Enrolment>
          <FirstPreferences>
            <Candidate>
              <eml:CandidateIdentifier Id="1001"><eml:CandidateName>A Citizen</eml:CandidateName></eml:CandidateIdentifier>
              <eml:AffiliationIdentifier Id="200" ShortCode="ALP"><eml:RegisteredName>Australian Labor Party</eml:RegisteredName></eml:AffiliationIdentifier>
              <Elected>true</Elected>
              <Votes>55000</Votes>
            </Candidate>
            <Candidate>
              <eml:CandidateIdentifier Id="1002"><eml:CandidateName>B Resident</eml:CandidateName></eml:CandidateIdentifier>
              <Elected>false</Elected>
              <Votes>45000</Votes>
            </Candidate>
          </FirstPreferences>
          <TwoCandidatePreferred>
            <Candidate>
              <eml:CandidateIdentifier Id="1001"><eml:CandidateName>A Citizen</eml:CandidateName></eml:CandidateIdentifier>
              <eml:AffiliationIdentifier Id="200" ShortCode="ALP"><eml:RegisteredName>Australian Labor Party</eml:RegisteredName></eml:AffiliationIdentifier>
              <Elected>true</Elected>
              <Votes>56000</Votes>
            </Candidate>
            <Candidate>
              <eml:CandidateIdentifier Id="1002"><eml:CandidateName>B Resident</eml:CandidateName></eml:CandidateIdentifier>
              <Elected>false</Elected>
              <Votes>44000</Votes>
            </Candidate>
          </TwoCandidatePreferred>
        </Contest>
      </Contests></House>
    </Election>
  </Results>
</MediaFeed>"#;

#[tokio::test]
async fn extracted_feed_round_trips_through_the_store() {
  let s = store().await;

  for _ in 0..2 {
    let mut buffer = RecordBuffer::new();
    tally_feed::extract_document(FEED.as_bytes(), &mut buffer).unwrap();
    s.apply(buffer.into_records()).await.unwrap();
  }

  assert_eq!(s.count(Table::Event).await.unwrap(), 1);
  assert_eq!(s.count(Table::Candidate).await.unwrap(), 2);
  assert_eq!(s.count(Table::Party).await.unwrap(), 1);
  assert_eq!(s.count(Table::FirstPreferences).await.unwrap(), 2);
  assert_eq!(s.count(Table::TwoCandidatePreferred).await.unwrap(), 2);

  let fp = s.tallies(TallyKind::FirstPreferences).await.unwrap();
  assert_eq!(fp[1].candidate_id, "1002");
  assert_eq!(fp[1].party_id, None);
  assert_eq!(fp[1].elected, Some(false));
}

#[tokio::test]
async fn file_store_persists_across_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("results.sqlite");

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.apply(higgins()).await.unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.count(Table::FirstPreferences).await.unwrap(), 1);
  assert_eq!(s.contests().await.unwrap()[0].id, "179");
}
