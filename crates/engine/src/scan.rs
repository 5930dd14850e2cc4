//! Scan protocol
//!
//! A [`Scan`] is one forward-only pass over the unread records of a region.
//! It takes the region lease when it begins and holds it until it is
//! dropped: producers, resets, and other scans all wait for the whole pass,
//! including whatever the caller does between records.
//!
//! # Phases
//!
//! ```text
//! Searching ──(position == resume target, commit rewind)──▶ Yielding
//!     │                                                        │
//!     └──────────────(limit reached)──────▶ Exhausted ◀────────┘
//! ```
//!
//! A scan without a resume target starts in `Yielding`. The limit and the
//! wrap sense are snapshotted from the header when the scan begins; since
//! the lease excludes producers, the snapshot stays exact for the whole
//! pass.
//!
//! Two things are written back to the shared header, both independent:
//!
//! - on meeting the resume target, the read cursor is rewound to it at
//!   once, before the first record is produced
//! - with `commit_on_finish`, the read cursor moves to the limit when the
//!   pass is exhausted
//!
//! Dropping a scan part way never commits anything beyond the rewind.

use logring_core::codec;
use logring_core::{Error, LogRecord, Result, RECORD_HEADER_SIZE};
use logring_storage::{Advance, LeaseKind, Region, RegionLease};
use tracing::{debug, trace};

use crate::row::LogRow;

/// Options for one scan pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Skip records until one starts exactly at this offset
    pub resume_from: Option<u32>,
    /// Move the shared read cursor to the end of data when exhausted
    pub commit_on_finish: bool,
}

impl ScanOptions {
    /// Full pass from the current read cursor.
    pub fn drain(commit: bool) -> Self {
        ScanOptions {
            resume_from: None,
            commit_on_finish: commit,
        }
    }

    /// Pass that starts yielding at the record at `offset`.
    pub fn seek(offset: u32, commit: bool) -> Self {
        ScanOptions {
            resume_from: Some(offset),
            commit_on_finish: commit,
        }
    }
}

/// Where a scan is in its pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// Skipping records until the resume target
    Searching,
    /// Producing records
    Yielding,
    /// Finished; produces nothing more
    Exhausted,
}

/// A decoded record and the offset it starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedRecord {
    /// Starting offset; usable as a resume token
    pub position: u32,
    /// The decoded record
    pub record: LogRecord,
}

impl ScannedRecord {
    /// Flatten into an output row.
    pub fn into_row(self) -> LogRow {
        LogRow::from_record(self.position, self.record)
    }
}

/// One pass over the unread records, holding the region lease.
pub struct Scan<'a> {
    lease: RegionLease<'a>,
    options: ScanOptions,
    phase: ScanPhase,
    position: usize,
    sense: bool,
    limit: usize,
    yielded: usize,
}

impl<'a> Scan<'a> {
    /// Take the region lease and snapshot the unread range.
    ///
    /// Blocks while any other lease on the region is held.
    pub fn begin(region: &'a Region, options: ScanOptions) -> Result<Self> {
        let lease = region.lease(LeaseKind::Scan)?;
        let header = lease.header()?;
        let phase = if options.resume_from.is_some() {
            ScanPhase::Searching
        } else {
            ScanPhase::Yielding
        };
        debug!(
            target: "logring::scan",
            read_position = header.read_position,
            end_position = header.end_position,
            wrapped = header.wrapped,
            resume_from = ?options.resume_from,
            commit_on_finish = options.commit_on_finish,
            "Scan started"
        );
        Ok(Scan {
            lease,
            options,
            phase,
            position: header.read_position as usize,
            sense: header.wrapped,
            limit: header.end_position as usize,
            yielded: 0,
        })
    }

    /// Current phase
    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    /// Offset the walk has reached
    pub fn position(&self) -> u32 {
        self.position as u32
    }

    /// Adapt into an iterator of output rows.
    pub fn rows(self) -> impl Iterator<Item = Result<LogRow>> + 'a {
        self.map(|scanned| scanned.map(ScannedRecord::into_row))
    }

    /// Whether the walk has caught up with the snapshot limit.
    ///
    /// While the wrap sense is set the walk has not yet crossed the end of
    /// the array, so it cannot have reached the limit.
    fn reached_limit(&self) -> bool {
        !self.sense && self.position >= self.limit
    }

    fn move_to(&mut self, advance: Advance, start: usize) -> Result<()> {
        if advance.crossed {
            if !self.sense {
                return Err(Error::corrupt_record(format!(
                    "record at {} runs past the end of data at {}",
                    start, self.limit
                )));
            }
            self.sense = false;
        }
        if !self.sense && advance.position > self.limit {
            return Err(Error::corrupt_record(format!(
                "record at {} runs past the end of data at {}",
                start, self.limit
            )));
        }
        self.position = advance.position;
        Ok(())
    }

    /// One walk step: `Some` when a record was produced, `None` when the
    /// step only moved the cursor.
    fn step(&mut self) -> Result<Option<ScannedRecord>> {
        let ring = self.lease.ring();
        let start = self.position;

        if !ring.fits_contiguously(start, RECORD_HEADER_SIZE) {
            // The writer skips a tail too short for a record header.
            if !self.sense {
                return Err(Error::corrupt_region(format!(
                    "unread range ends at {} inside a skipped tail",
                    start
                )));
            }
            trace!(target: "logring::scan", position = start, "Skipping short tail");
            self.position = 0;
            self.sense = false;
            return Ok(None);
        }

        let total_len = self.lease.peek_total_len(start)?;

        if self.phase == ScanPhase::Searching {
            let target = self.options.resume_from.map(|t| t as usize);
            if target != Some(start) {
                trace!(target: "logring::scan", position = start, total_len, "Skipping record");
                let advance = ring.advance(start, total_len);
                self.move_to(advance, start)?;
                return Ok(None);
            }
            self.lease.commit_read(start, self.sense);
            self.phase = ScanPhase::Yielding;
            debug!(
                target: "logring::scan",
                position = start,
                wrapped = self.sense,
                "Resume target found, read position rewound"
            );
        }

        let (bytes, advance) = self.lease.read(start, total_len);
        let record = codec::decode(&bytes)?;
        self.move_to(advance, start)?;
        self.yielded += 1;
        Ok(Some(ScannedRecord {
            position: start as u32,
            record,
        }))
    }

    fn finish(&mut self) -> Option<Result<ScannedRecord>> {
        let searching = self.phase == ScanPhase::Searching;
        self.phase = ScanPhase::Exhausted;

        if searching {
            if let Some(target) = self.options.resume_from {
                debug!(target: "logring::scan", target, "Resume target not found");
                return Some(Err(Error::ResumeTargetNotFound(target)));
            }
        }
        if self.options.commit_on_finish {
            self.lease.commit_read(self.position, false);
        }
        debug!(
            target: "logring::scan",
            records = self.yielded,
            position = self.position,
            committed = self.options.commit_on_finish,
            "Scan finished"
        );
        None
    }
}

impl Iterator for Scan<'_> {
    type Item = Result<ScannedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.phase == ScanPhase::Exhausted {
                return None;
            }
            if self.reached_limit() {
                return self.finish();
            }
            match self.step() {
                Ok(Some(scanned)) => return Some(Ok(scanned)),
                Ok(None) => continue,
                Err(e) => {
                    self.phase = ScanPhase::Exhausted;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl std::iter::FusedIterator for Scan<'_> {}

/// Scan from the current read cursor to the end of data.
///
/// With `commit`, the read cursor moves to the end of data once the pass
/// is exhausted.
pub fn drain(region: &Region, commit: bool) -> Result<Scan<'_>> {
    Scan::begin(region, ScanOptions::drain(commit))
}

/// Scan that skips to the record starting at `from`.
///
/// The read cursor is rewound to `from` as soon as the record is found,
/// whether or not the pass is later consumed. `commit` additionally moves
/// it to the end of data once the pass is exhausted. A `from` that is not
/// the start of an unread record ends the pass with
/// `ResumeTargetNotFound` and leaves the cursors as they were.
pub fn seek_and_drain(region: &Region, from: u32, commit: bool) -> Result<Scan<'_>> {
    Scan::begin(region, ScanOptions::seek(from, commit))
}
