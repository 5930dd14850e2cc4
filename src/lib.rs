//! logring - fixed-capacity shared circular store for diagnostic events
//!
//! Producers append serialized events to one shared region; a consumer
//! drains them in order, optionally resuming from the offset of a record it
//! has already seen.
//!
//! # Quick Start
//!
//! ```
//! use logring::{drain, Collector, CollectorConfig, HostEvent, Severity};
//!
//! let collector = Collector::with_private_region(CollectorConfig::default())?;
//! collector.capture(&HostEvent::new(Severity::WARNING, "disk almost full"))?;
//!
//! for row in drain(collector.region(), true)?.rows() {
//!     let row = row?;
//!     println!("{} {:?}", row.position, row.message);
//! }
//! # Ok::<(), logring::Error>(())
//! ```
//!
//! # Architecture
//!
//! - `logring-core`: records, the wire codec, severities, errors
//! - `logring-storage`: the region, its lease, append and reset
//! - `logring-engine`: scans, output rows, the collector

pub use logring_core::{codec, severity, sqlstate};
pub use logring_core::{Error, LogRecord, Result, Severity, TextField, TextFields};
pub use logring_engine::{
    drain, seek_and_drain, test_report, Collector, CollectorConfig, CollectorStats,
    DiagnosticSink, HostEvent, LogRow, Scan, ScanOptions, ScanPhase, ScannedRecord, TracingSink,
};
pub use logring_storage::{
    LeaseKind, LockObserver, Region, RegionConfig, RegionLease, RegionStatus, Ring,
};
