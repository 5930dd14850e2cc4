//! Error types for logring
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! None of these errors are retried internally: every one of them is
//! surfaced to the immediate caller.

use std::io;
use thiserror::Error;

/// Result type alias for logring operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the shared log region
#[derive(Debug, Error)]
pub enum Error {
    /// Serialized record would not fit even in an empty region
    #[error("Record too large: {size} bytes does not fit in a {capacity} byte region")]
    RecordTooLarge {
        /// Serialized size of the record, header included
        size: usize,
        /// Capacity of the region's data array
        capacity: usize,
    },

    /// Record guard mismatch or malformed field lengths
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    /// Region header guard mismatch, stale capacity, or cursor out of range
    #[error("Corrupt region: {0}")]
    CorruptRegion(String),

    /// A resume scan walked the whole unread range without meeting its target
    #[error("Nothing with position {0} was found")]
    ResumeTargetNotFound(u32),

    /// Rejected configuration (capacity, thresholds, config file contents)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Severity name with no entry in the lookup table
    #[error("Unknown level name: {0}")]
    UnknownSeverity(String),

    /// Severity code with no symbolic name
    #[error("Invalid error level code: {0}")]
    UnknownSeverityCode(i32),

    /// I/O error (backing file, mapping, advisory lock)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create a corrupt record error
    pub fn corrupt_record(msg: impl Into<String>) -> Self {
        Error::CorruptRecord(msg.into())
    }

    /// Create a corrupt region error
    pub fn corrupt_region(msg: impl Into<String>) -> Self {
        Error::CorruptRegion(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfiguration(msg.into())
    }

    /// Whether this error means the shared bytes can no longer be trusted.
    ///
    /// Integrity errors end the scan that hit them; skipping past a bad
    /// record would misread whatever follows it as a header.
    pub fn is_integrity_error(&self) -> bool {
        matches!(self, Error::CorruptRecord(_) | Error::CorruptRegion(_))
    }
}
