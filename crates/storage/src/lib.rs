//! Storage layer for logring
//!
//! This crate implements the shared Ring Region:
//! - RegionHeader: the mapped header holding the shared cursors
//! - Ring: modular arithmetic over the circular data array
//! - Region: the handle, with append and reset
//! - RegionLease: the exclusive lock (in-process mutex plus file lock),
//!   released on drop
//!
//! # Sharing
//!
//! An anonymous region is shared by the threads of one process. A
//! file-backed region is mapped by every process that opens the file; the
//! cursors live in the mapping, so all of them see one state.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod backing;
pub mod config;
pub mod layout;
pub mod region;
pub mod ring;

pub use config::RegionConfig;
pub use layout::{RegionHeader, REGION_HEADER_SIZE, REGION_MAGIC};
pub use region::{LeaseKind, LockObserver, Region, RegionLease, RegionStatus};
pub use ring::{Advance, Ring};
