//! Ingest against a temporary mirror and an in-memory store.

use std::{fs, path::Path};

use tally_core::{Table, TallyKind, store::ResultStore};
use tally_store_sqlite::SqliteStore;

use crate::{Error, IngestConfig, dry_run, ingest_event, source::MirrorSource};

fn feed(enrolment: &str) -> String {
  format!(
    r#"<?xml version="1.0" encoding="utf-8"?>
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
          <Enrolment>{enrolment}</Enrolment>
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
        </Contest>
      </Contests></House>
    </Election>
  </Results>
</MediaFeed>"#
  )
}

fn publish(root: &Path, event_id: &str, name: &str, body: &str) {
  let dir = root.join(event_id).join("Detailed").join("Verbose");
  fs::create_dir_all(&dir).unwrap();
  fs::write(dir.join(name), body).unwrap();
}

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

// ─── ingest_event ────────────────────────────────────────────────────────────

#[tokio::test]
async fn ingest_stores_the_latest_document() {
  let dir = tempfile::tempdir().unwrap();
  publish(dir.path(), "25820", "aec-mediafeed-25820.xml", &feed("100000"));
  let source = MirrorSource::new(dir.path());
  let s = store().await;

  let report = ingest_event(&source, &s, "25820").await.unwrap().unwrap();
  assert_eq!(report.event_id, "25820");
  assert_eq!(report.document, "aec-mediafeed-25820.xml");
  assert_eq!(report.records, 8);
  assert_eq!(report.summary.contest_count(), 1);
  assert!(report.tables.contains(&(Table::Candidate, 2)));
  assert!(report.tables.contains(&(Table::Party, 1)));

  assert_eq!(s.count(Table::Contest).await.unwrap(), 1);
  let fp = s.tallies(TallyKind::FirstPreferences).await.unwrap();
  assert_eq!(fp.len(), 2);
  assert_eq!(fp[0].votes, 55000);
  assert_eq!(fp[0].party_id.as_deref(), Some("200"));
}

#[tokio::test]
async fn ingesting_twice_leaves_one_row_per_key() {
  let dir = tempfile::tempdir().unwrap();
  publish(dir.path(), "25820", "feed.xml", &feed("100000"));
  let source = MirrorSource::new(dir.path());
  let s = store().await;

  ingest_event(&source, &s, "25820").await.unwrap();
  ingest_event(&source, &s, "25820").await.unwrap();

  assert_eq!(s.count(Table::Event).await.unwrap(), 1);
  assert_eq!(s.count(Table::FirstPreferences).await.unwrap(), 2);
}

#[tokio::test]
async fn event_without_documents_is_skipped() {
  let dir = tempfile::tempdir().unwrap();
  let source = MirrorSource::new(dir.path());
  let s = store().await;

  assert!(ingest_event(&source, &s, "99999").await.unwrap().is_none());
  assert_eq!(s.count(Table::Event).await.unwrap(), 0);
}

#[tokio::test]
async fn bad_document_leaves_the_store_untouched() {
  let dir = tempfile::tempdir().unwrap();
  publish(dir.path(), "25820", "feed.xml", &feed("N/A"));
  let source = MirrorSource::new(dir.path());
  let s = store().await;

  let err = ingest_event(&source, &s, "25820").await.unwrap_err();
  match err {
    Error::Feed { document, source } => {
      assert_eq!(document, "feed.xml");
      assert!(source.is_format(), "{source}");
    }
    other => panic!("unexpected error: {other}"),
  }

  for table in Table::ALL {
    assert_eq!(s.count(table).await.unwrap(), 0, "{table}");
  }
}

// ─── dry_run ─────────────────────────────────────────────────────────────────

#[test]
fn dry_run_counts_distinct_rows() {
  let dir = tempfile::tempdir().unwrap();
  publish(dir.path(), "25820", "feed.xml", &feed("100000"));
  let source = MirrorSource::new(dir.path());

  let report = dry_run(&source, "25820").unwrap().unwrap();
  assert_eq!(report.records, 8);
  assert_eq!(report.tables, vec![
    (Table::Event, 1),
    (Table::Election, 1),
    (Table::Contest, 1),
    (Table::Candidate, 2),
    (Table::Party, 1),
    (Table::FirstPreferences, 2),
    (Table::TwoCandidatePreferred, 0),
  ]);
}

// ─── Configuration ───────────────────────────────────────────────────────────

#[test]
fn config_reads_toml_with_defaults() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("tally.toml");
  fs::write(&path, "feed_root = \"/srv/mediafeed\"\n").unwrap();

  let cfg = IngestConfig::load(&path).unwrap();
  assert_eq!(cfg.feed_root, Path::new("/srv/mediafeed"));
  assert_eq!(cfg.store_path, Path::new("results.sqlite"));
  assert!(cfg.events.is_empty());
}

#[test]
fn config_reads_event_list() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("tally.toml");
  fs::write(
    &path,
    "feed_root = \"mirror\"\nstore_path = \"out.db\"\nevents = [\"25820\", \"27966\"]\n",
  )
  .unwrap();

  let cfg = IngestConfig::load(&path).unwrap();
  assert_eq!(cfg.store_path, Path::new("out.db"));
  assert_eq!(cfg.events, vec!["25820", "27966"]);
}

#[test]
fn config_without_feed_root_is_rejected() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("tally.toml");
  fs::write(&path, "store_path = \"out.db\"\n").unwrap();

  assert!(IngestConfig::load(&path).is_err());
}
