//! Where feed documents come from.
//!
//! The extractor only needs the bytes of one complete document per event.
//! [`FeedSource`] hides how they were obtained; [`MirrorSource`] reads them
//! from a local copy of the publisher's file service, laid out as
//! `<root>/<event id>/Detailed/Verbose/<document>.xml`.

use std::{
  fs,
  path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

/// One retrieved, already-decompressed feed document.
#[derive(Debug, Clone)]
pub struct FeedDocument {
  pub event_id: String,
  /// File name the document was published under.
  pub name:     String,
  pub modified: DateTime<Utc>,
  pub bytes:    Vec<u8>,
}

pub trait FeedSource {
  /// Every event id the source has documents for.
  fn event_ids(&self) -> Result<Vec<String>>;

  /// The most recently published document for `event_id`, or `None` if the
  /// event has none.
  fn latest(&self, event_id: &str) -> Result<Option<FeedDocument>>;
}

// ─── MirrorSource ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MirrorSource {
  root: PathBuf,
}

impl MirrorSource {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  fn documents_dir(&self, event_id: &str) -> PathBuf {
    self.root.join(event_id).join("Detailed").join("Verbose")
  }
}

impl FeedSource for MirrorSource {
  fn event_ids(&self) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    for entry in fs::read_dir(&self.root).map_err(Error::io(&self.root))? {
      let entry = entry.map_err(Error::io(&self.root))?;
      if entry.path().is_dir() {
        ids.push(entry.file_name().to_string_lossy().into_owned());
      }
    }
    ids.sort();
    Ok(ids)
  }

  fn latest(&self, event_id: &str) -> Result<Option<FeedDocument>> {
    let dir = self.documents_dir(event_id);
    if !dir.is_dir() {
      return Ok(None);
    }

    let mut newest: Option<(DateTime<Utc>, String, PathBuf)> = None;
    for entry in fs::read_dir(&dir).map_err(Error::io(&dir))? {
      let entry = entry.map_err(Error::io(&dir))?;
      let path = entry.path();
      if !path.is_file() || !is_xml(&path) {
        continue;
      }
      let modified: DateTime<Utc> = entry
        .metadata()
        .and_then(|m| m.modified())
        .map_err(Error::io(&path))?
        .into();
      let name = entry.file_name().to_string_lossy().into_owned();

      let candidate = (modified, name, path);
      if newest
        .as_ref()
        .is_none_or(|n| (&candidate.0, &candidate.1) > (&n.0, &n.1))
      {
        newest = Some(candidate);
      }
    }

    let Some((modified, name, path)) = newest else {
      return Ok(None);
    };
    let bytes = fs::read(&path).map_err(Error::io(&path))?;

    Ok(Some(FeedDocument {
      event_id: event_id.to_owned(),
      name,
      modified,
      bytes,
    }))
  }
}

fn is_xml(path: &Path) -> bool {
  path
    .extension()
    .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}
