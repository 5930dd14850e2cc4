//! Shared region layout.
//!
//! The region is one mapping: a fixed header followed by the data array.
//! Every process that maps the region reads and writes the cursors in the
//! header itself, so cursor state is shared rather than cached.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ Region Header (64 bytes)                 │
//! ├──────────────────────────────────────────┤
//! │ Data array (capacity bytes, circular)    │
//! └──────────────────────────────────────────┘
//!
//! Header (little-endian):
//!   0  magic             u32   0xAABBCCDD
//!   4  format_version    u32
//!   8  capacity          u32   current data array size
//!  12  initial_capacity  u32   size the region was created with
//!  16  read_position     u32   oldest unread record
//!  20  end_position      u32   next free byte
//!  24  wrapped           u8    unread range crosses the array end
//!  25  padding
//! ```

use byteorder::{ByteOrder, LittleEndian};
use logring_core::{Error, Result};

/// Guard value at the start of the region
pub const REGION_MAGIC: u32 = 0xAABB_CCDD;

/// Current region format version
pub const REGION_FORMAT_VERSION: u32 = 1;

/// Size of the region header in bytes
pub const REGION_HEADER_SIZE: usize = 64;

/// Region header as stored at offset 0 of the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionHeader {
    /// Magic: 0xAABBCCDD
    pub magic: u32,

    /// Format version for compatibility checking
    pub format_version: u32,

    /// Current size of the data array
    pub capacity: u32,

    /// Size the region was created with, restored by a reset to initial size
    pub initial_capacity: u32,

    /// Consumption cursor
    pub read_position: u32,

    /// Write cursor
    pub end_position: u32,

    /// Whether the unread range crosses the end of the data array
    pub wrapped: bool,
}

impl RegionHeader {
    /// Create a header for an empty region.
    pub fn new(capacity: u32) -> Self {
        RegionHeader {
            magic: REGION_MAGIC,
            format_version: REGION_FORMAT_VERSION,
            capacity,
            initial_capacity: capacity,
            read_position: 0,
            end_position: 0,
            wrapped: false,
        }
    }

    /// Serialize header to bytes.
    pub fn to_bytes(&self) -> [u8; REGION_HEADER_SIZE] {
        let mut bytes = [0u8; REGION_HEADER_SIZE];
        LittleEndian::write_u32(&mut bytes[0..4], self.magic);
        LittleEndian::write_u32(&mut bytes[4..8], self.format_version);
        LittleEndian::write_u32(&mut bytes[8..12], self.capacity);
        LittleEndian::write_u32(&mut bytes[12..16], self.initial_capacity);
        LittleEndian::write_u32(&mut bytes[16..20], self.read_position);
        LittleEndian::write_u32(&mut bytes[20..24], self.end_position);
        bytes[24] = self.wrapped as u8;
        bytes
    }

    /// Deserialize header from bytes.
    pub fn from_bytes(bytes: &[u8; REGION_HEADER_SIZE]) -> Self {
        RegionHeader {
            magic: LittleEndian::read_u32(&bytes[0..4]),
            format_version: LittleEndian::read_u32(&bytes[4..8]),
            capacity: LittleEndian::read_u32(&bytes[8..12]),
            initial_capacity: LittleEndian::read_u32(&bytes[12..16]),
            read_position: LittleEndian::read_u32(&bytes[16..20]),
            end_position: LittleEndian::read_u32(&bytes[20..24]),
            wrapped: bytes[24] != 0,
        }
    }

    /// Check the guard value and version.
    ///
    /// A region that fails this is never used, not even by a reset.
    pub fn validate(&self) -> Result<()> {
        if self.magic != REGION_MAGIC {
            return Err(Error::corrupt_region(format!(
                "bad region magic {:#010x}",
                self.magic
            )));
        }
        if self.format_version != REGION_FORMAT_VERSION {
            return Err(Error::corrupt_region(format!(
                "unsupported region format version {}",
                self.format_version
            )));
        }
        if self.capacity == 0 {
            return Err(Error::corrupt_region("region capacity is zero"));
        }
        Ok(())
    }

    /// Check that the cursors describe a consistent unread range.
    pub fn check_cursors(&self) -> Result<()> {
        if self.read_position >= self.capacity || self.end_position >= self.capacity {
            return Err(Error::corrupt_region(format!(
                "cursors read={} end={} outside capacity {}",
                self.read_position, self.end_position, self.capacity
            )));
        }
        if !self.wrapped && self.read_position > self.end_position {
            return Err(Error::corrupt_region(format!(
                "unwrapped region has read={} past end={}",
                self.read_position, self.end_position
            )));
        }
        Ok(())
    }

    /// Bytes between the consumption cursor and the write cursor.
    ///
    /// Never more than the capacity, even after an overrun has carried the
    /// write cursor past the read cursor.
    pub fn unread_bytes(&self) -> usize {
        let (read, end) = (self.read_position as usize, self.end_position as usize);
        let capacity = self.capacity as usize;
        if self.wrapped {
            (capacity.saturating_sub(read) + end).min(capacity)
        } else {
            end.saturating_sub(read)
        }
    }
}
