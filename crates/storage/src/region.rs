//! The shared log region and its lock.
//!
//! [`Region`] is the handle every operation takes by shared reference. One
//! exclusive lock guards the cursors, the capacity, and every copy into or
//! out of the data array. It has two halves:
//!
//! - a `parking_lot::Mutex` excluding threads of this process
//! - for file-backed regions, an exclusive advisory lock on the region file
//!   excluding other processes
//!
//! Both halves are taken by [`Region::lease`] and released when the returned
//! [`RegionLease`] is dropped, on every exit path. A scan holds one lease for
//! its entire pass, so producers and other consumers wait for the whole
//! drain, not just for one record.
//!
//! # Overrun policy
//!
//! Producers never block on a full region. An append whose new extent runs
//! over unread bytes still proceeds; it is logged and counted in
//! [`RegionStatus::overruns`]. Records overwritten this way are lost, and a
//! consumer may then see a corrupt record where one used to start.

use crate::backing::Backing;
use crate::config::{validate_capacity, RegionConfig};
use crate::layout::RegionHeader;
use crate::ring::{Advance, Ring};
use logring_core::codec::{self, RECORD_PEEK_SIZE};
use logring_core::{Error, LogRecord, Result, RECORD_HEADER_SIZE};
use parking_lot::{Mutex, MutexGuard};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// What a lease was taken for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeaseKind {
    /// One append
    Append,
    /// A whole scan pass
    Scan,
    /// Reset or resize
    Reset,
    /// Read-only status snapshot
    Inspect,
}

/// Hook told about every lock acquisition and release.
///
/// `acquired` runs after both halves of the lock are held; `released` runs
/// before either half is let go. Calls from one region therefore never
/// interleave: an `acquired` is always followed by its own `released`.
pub trait LockObserver: Send + Sync {
    /// The lock was taken
    fn acquired(&self, kind: LeaseKind);
    /// The lock is about to be released
    fn released(&self, kind: LeaseKind);
}

/// Snapshot of the region's cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionStatus {
    /// Current capacity of the data array
    pub capacity: usize,
    /// Capacity the region was created with
    pub initial_capacity: usize,
    /// Consumption cursor
    pub read_position: u32,
    /// Write cursor
    pub end_position: u32,
    /// Whether the unread range crosses the end of the array
    pub wrapped: bool,
    /// Bytes not yet consumed
    pub unread_bytes: usize,
    /// Appends from this process that ran over unread bytes
    pub overruns: u64,
}

/// Handle to a shared log region.
pub struct Region {
    backing: Mutex<Backing>,
    observer: Option<Arc<dyn LockObserver>>,
    overruns: AtomicU64,
}

impl std::fmt::Debug for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Region")
            .field("overruns", &self.overruns.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Region {
    fn from_backing(backing: Backing) -> Self {
        Region {
            backing: Mutex::new(backing),
            observer: None,
            overruns: AtomicU64::new(0),
        }
    }

    /// Create a region in private memory, shared by the threads of this
    /// process.
    pub fn anonymous(config: &RegionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_backing(Backing::anonymous(config.capacity)?))
    }

    /// Create an empty region in a file that other processes can map with
    /// [`Region::open`]. An existing file is truncated.
    pub fn create(path: impl AsRef<Path>, config: &RegionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_backing(Backing::create(
            path.as_ref(),
            config.capacity,
        )?))
    }

    /// Map a region file created by [`Region::create`].
    ///
    /// # Errors
    ///
    /// `CorruptRegion` when the file's guard value, version, or size do not
    /// describe a region.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_backing(Backing::open(path.as_ref())?))
    }

    /// Attach a lock observer (builder pattern).
    pub fn with_observer(mut self, observer: Arc<dyn LockObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Path of the backing file, if any
    pub fn path(&self) -> Option<std::path::PathBuf> {
        self.backing.lock().path().map(Path::to_path_buf)
    }

    /// Take the exclusive region lock.
    ///
    /// Blocks until no other lease on this region exists in any process.
    /// The lock is released when the lease is dropped.
    pub fn lease(&self, kind: LeaseKind) -> Result<RegionLease<'_>> {
        let guard = self.backing.lock();
        guard.lock_file()?;
        let mut lease = RegionLease {
            guard,
            kind,
            region: self,
        };
        if let Some(observer) = &self.observer {
            observer.acquired(kind);
        }
        lease.guard.refresh()?;
        trace!(target: "logring::region", ?kind, "Lease acquired");
        Ok(lease)
    }

    /// Append one serialized record.
    ///
    /// Returns the record's starting offset, usable later as a resume token.
    pub fn append(&self, record_bytes: &[u8]) -> Result<u32> {
        self.lease(LeaseKind::Append)?.append(record_bytes)
    }

    /// Serialize and append one record.
    ///
    /// The record is sized against the capacity seen under the lock, so a
    /// concurrent resize cannot let an oversized record through.
    pub fn append_record(&self, record: &LogRecord) -> Result<u32> {
        let mut lease = self.lease(LeaseKind::Append)?;
        let bytes = codec::encode(record, lease.capacity())?;
        lease.append(&bytes)
    }

    /// Discard all records; with `capacity`, also resize the data array.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` for an unusable capacity, before anything is
    /// touched.
    pub fn reset(&self, capacity: Option<usize>) -> Result<()> {
        if let Some(capacity) = capacity {
            validate_capacity(capacity)?;
        }
        self.lease(LeaseKind::Reset)?.reset(capacity)
    }

    /// Discard all records and restore the capacity the region was created
    /// with.
    pub fn reset_to_initial(&self) -> Result<()> {
        let mut lease = self.lease(LeaseKind::Reset)?;
        let initial = lease.guard.header().initial_capacity as usize;
        lease.reset(Some(initial))
    }

    /// Current cursors and counters.
    pub fn status(&self) -> Result<RegionStatus> {
        let lease = self.lease(LeaseKind::Inspect)?;
        let header = lease.guard.header();
        Ok(RegionStatus {
            capacity: header.capacity as usize,
            initial_capacity: header.initial_capacity as usize,
            read_position: header.read_position,
            end_position: header.end_position,
            wrapped: header.wrapped,
            unread_bytes: header.unread_bytes(),
            overruns: self.overruns.load(Ordering::Relaxed),
        })
    }
}

/// Exclusive access to a region, released on drop.
pub struct RegionLease<'a> {
    guard: MutexGuard<'a, Backing>,
    kind: LeaseKind,
    region: &'a Region,
}

impl<'a> RegionLease<'a> {
    /// What this lease was taken for
    pub fn kind(&self) -> LeaseKind {
        self.kind
    }

    /// Capacity of the data array
    pub fn capacity(&self) -> usize {
        self.guard.mapped_capacity()
    }

    /// Ring arithmetic for the current capacity
    pub fn ring(&self) -> Ring {
        Ring::new(self.capacity())
    }

    /// Shared header, with its cursors checked.
    pub fn header(&self) -> Result<RegionHeader> {
        let header = self.guard.header();
        header.check_cursors()?;
        Ok(header)
    }

    /// Size of the record starting at `at`, read from its header alone.
    ///
    /// Record headers never straddle the end of the array, so the caller
    /// must only peek where `ring().fits_contiguously(at, RECORD_HEADER_SIZE)`.
    pub fn peek_total_len(&self, at: usize) -> Result<usize> {
        let data = self.guard.data();
        codec::peek_total_len(&data[at..at + RECORD_PEEK_SIZE], self.capacity())
    }

    /// Copy `len` bytes starting at `at` into a contiguous buffer.
    pub fn read(&self, at: usize, len: usize) -> (Vec<u8>, Advance) {
        self.ring().read(self.guard.data(), at, len)
    }

    /// Move the shared consumption cursor.
    pub fn commit_read(&mut self, position: usize, wrapped: bool) {
        let mut header = self.guard.header();
        header.read_position = position as u32;
        header.wrapped = wrapped;
        self.guard.store_header(&header);
        debug!(target: "logring::region", position, wrapped, "Committed read position");
    }

    /// Write one serialized record at the write cursor.
    ///
    /// A record header never straddles the end of the array: if fewer than
    /// a header's worth of bytes remain, the tail is left unused and the
    /// record starts at 0. The body may split across the end. When nothing
    /// is unread at that point, both cursors restart at 0 instead, so the
    /// region stays unwrapped.
    pub fn append(&mut self, record_bytes: &[u8]) -> Result<u32> {
        let capacity = self.capacity();
        let len = record_bytes.len();
        if len >= capacity {
            return Err(Error::RecordTooLarge {
                size: len,
                capacity,
            });
        }

        let mut header = self.header()?;
        let ring = self.ring();
        let end = header.end_position as usize;
        let unread = header.unread_bytes();
        let (start, skipped) = if ring.fits_contiguously(end, RECORD_HEADER_SIZE) {
            (end, 0)
        } else if unread == 0 {
            header.read_position = 0;
            header.wrapped = false;
            (0, 0)
        } else {
            (0, capacity - end)
        };

        if unread > 0 && unread + skipped + len > capacity {
            self.region.overruns.fetch_add(1, Ordering::Relaxed);
            warn!(
                target: "logring::region",
                unread,
                record_len = len,
                read_position = header.read_position,
                "Append overwrites unread records"
            );
        }

        let advance = ring.write(self.guard.data_mut(), start, record_bytes);
        header.end_position = advance.position as u32;
        header.wrapped = header.wrapped || skipped > 0 || advance.crossed;
        self.guard.store_header(&header);

        trace!(
            target: "logring::region",
            start,
            len,
            end = header.end_position,
            wrapped = header.wrapped,
            "Appended record"
        );
        Ok(start as u32)
    }

    /// Reset both cursors; with `capacity`, also replace the data array.
    pub fn reset(&mut self, capacity: Option<usize>) -> Result<()> {
        let old = self.guard.header();
        let mut header = old;
        if let Some(capacity) = capacity {
            validate_capacity(capacity)?;
            if capacity != self.capacity() {
                self.guard.resize(capacity)?;
            }
            header.capacity = capacity as u32;
        }
        header.read_position = 0;
        header.end_position = 0;
        header.wrapped = false;
        self.guard.store_header(&header);

        info!(
            target: "logring::region",
            discarded_bytes = old.unread_bytes(),
            old_capacity = old.capacity,
            capacity = header.capacity,
            "Region reset"
        );
        Ok(())
    }
}

impl Drop for RegionLease<'_> {
    fn drop(&mut self) {
        if let Some(observer) = &self.region.observer {
            observer.released(self.kind);
        }
        self.guard.unlock_file();
    }
}
