//! Error types for the results feed extractor.

use std::fmt;

use thiserror::Error;

/// Where in the event → election → contest → candidate chain an error
/// occurred.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityPath {
  pub event:     Option<String>,
  pub election:  Option<String>,
  pub contest:   Option<String>,
  pub candidate: Option<String>,
}

impl EntityPath {
  pub fn event(id: &str) -> Self {
    Self { event: Some(id.to_owned()), ..Self::default() }
  }

  pub fn election(mut self, id: &str) -> Self {
    self.election = Some(id.to_owned());
    self
  }

  pub fn contest(mut self, id: &str) -> Self {
    self.contest = Some(id.to_owned());
    self
  }

  pub fn candidate(mut self, id: &str) -> Self {
    self.candidate = Some(id.to_owned());
    self
  }
}

impl fmt::Display for EntityPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let parts = [
      ("event", &self.event),
      ("election", &self.election),
      ("contest", &self.contest),
      ("candidate", &self.candidate),
    ];
    let mut wrote = false;
    for (label, id) in parts {
      if let Some(id) = id {
        if wrote {
          f.write_str(" / ")?;
        }
        write!(f, "{label} {id}")?;
        wrote = true;
      }
    }
    if !wrote {
      f.write_str("document")?;
    }
    Ok(())
  }
}

#[derive(Debug, Error)]
pub enum Error {
  /// The bytes are not well-formed XML.
  #[error("xml error: {0}")]
  Xml(#[from] quick_xml::Error),

  /// Well-formed XML, but a node the feed always carries is missing.
  #[error("malformed document at {path}: {reason}")]
  Malformed { path: EntityPath, reason: String },

  /// A count (`enrolment`, `votes`) is missing or not a non-negative integer.
  #[error("invalid {field} {value:?} at {path}")]
  Format {
    path:  EntityPath,
    field: &'static str,
    value: String,
  },

  #[error("sink error: {0}")]
  Sink(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn malformed(path: &EntityPath, reason: impl Into<String>) -> Self {
    Error::Malformed { path: path.clone(), reason: reason.into() }
  }

  /// True for malformed markup or missing mandatory nodes.
  pub fn is_malformed(&self) -> bool {
    matches!(self, Error::Xml(_) | Error::Malformed { .. })
  }

  pub fn is_format(&self) -> bool { matches!(self, Error::Format { .. }) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
