//! Core types for logring
//!
//! This crate defines the foundational pieces shared by the region and the
//! scan engine:
//! - Error: Error type hierarchy
//! - LogRecord / TextField: the event model with its canonical field order
//! - codec: the self-describing record wire format
//! - severity: symbolic severity names and their numeric codes
//! - sqlstate: five-character SQLSTATE packing

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod error;
pub mod record;
pub mod severity;
pub mod sqlstate;

pub use codec::{RECORD_HEADER_SIZE, RECORD_MAGIC};
pub use error::{Error, Result};
pub use record::{LogRecord, TextField, TextFields};
pub use severity::Severity;
