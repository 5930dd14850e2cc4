//! Scan engine for logring
//!
//! This crate sits on top of the region:
//! - Scan: the consumer protocol (drain, seek_and_drain), a state machine
//!   holding the region lease for a whole pass
//! - LogRow: the flat output row
//! - Collector: the producer hook, filtering and numbering host events
//! - DiagnosticSink: the host's reporting facility and the test pass-through
//! - CollectorConfig: `logring.toml`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collector;
pub mod config;
pub mod diagnostic;
pub mod row;
pub mod scan;

pub use collector::{Collector, CollectorStats, HostEvent};
pub use config::CollectorConfig;
pub use diagnostic::{test_report, DiagnosticSink, TracingSink};
pub use row::LogRow;
pub use scan::{drain, seek_and_drain, Scan, ScanOptions, ScanPhase, ScannedRecord};
