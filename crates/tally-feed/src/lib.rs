//! Results feed extractor.
//!
//! Turns one media-feed XML document into normalized [`tally_core`] records.
//! Pure synchronous; no I/O beyond the sink it is handed.
//!
//! # Quick start
//!
//! ```no_run
//! use tally_core::{MemorySink, Table};
//!
//! let xml = std::fs::read("aec-mediafeed-results-detailed-verbose-25820.xml").unwrap();
//! let mut sink = MemorySink::new();
//! let summary = tally_feed::extract_document(&xml, &mut sink).unwrap();
//! println!("{}: {} contests", summary.name, summary.contest_count());
//! println!("{} candidates", sink.count(Table::Candidate));
//! ```

pub mod document;
pub mod error;
pub mod extract;

pub use document::{Document, Element, FeedNode, Namespace};
pub use error::{EntityPath, Error, Result};
pub use extract::coerce_flag;
use tally_core::{RecordSink, summary::EventSummary};

/// Parse `xml` and extract every record it describes into `sink`.
///
/// Stops at the first structural or numeric error; records already handed to
/// the sink before the error are the sink's to discard.
pub fn extract_document<S: RecordSink>(
  xml: &[u8],
  sink: &mut S,
) -> Result<EventSummary> {
  let document = Document::parse(xml)?;
  extract::extract_event(document.root(), sink)
}
