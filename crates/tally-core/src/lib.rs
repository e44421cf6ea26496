//! Core types and trait definitions for the election results ingester.
//!
//! This crate is free of XML and database dependencies. The feed extractor
//! writes [`record::Record`]s into a [`sink::RecordSink`]; storage backends
//! implement [`store::ResultStore`].

pub mod record;
pub mod sink;
pub mod store;
pub mod summary;

pub use record::{
  Candidate, Contest, Election, Event, Party, Record, Table, Tally, TallyKind,
  Value,
};
pub use sink::{MemorySink, RecordBuffer, RecordSink};
