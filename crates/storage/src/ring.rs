//! Modular arithmetic over the circular data array.
//!
//! Offsets `p` and `p + capacity` name the same byte. A logical range that
//! runs past the end of the array continues at offset 0; [`Ring::spans`]
//! turns such a range into at most two physical ranges, and every copy into
//! or out of the array goes through it. Append and scan both use this type,
//! so the boundary-crossing rule exists in one place.

use std::ops::Range;

/// Result of moving an offset forward around the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    /// New offset, always in `[0, capacity)`
    pub position: usize,
    /// Whether the move reached or passed the end of the array
    pub crossed: bool,
}

/// A circular address space of `capacity` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ring {
    capacity: usize,
}

impl Ring {
    /// Create a ring over `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Ring { capacity }
    }

    /// Number of addressable bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Move `at` forward by `len` bytes.
    ///
    /// Landing exactly on `capacity` wraps to 0 and counts as a crossing, so
    /// positions stay in `[0, capacity)`.
    pub fn advance(&self, at: usize, len: usize) -> Advance {
        debug_assert!(at < self.capacity && len < self.capacity);
        let next = at + len;
        if next >= self.capacity {
            Advance {
                position: next - self.capacity,
                crossed: true,
            }
        } else {
            Advance {
                position: next,
                crossed: false,
            }
        }
    }

    /// Whether `len` bytes starting at `at` fit before the end of the array.
    pub fn fits_contiguously(&self, at: usize, len: usize) -> bool {
        at + len <= self.capacity
    }

    /// Physical ranges covered by the logical range `[at, at + len)`.
    ///
    /// The first range starts at `at`; the second starts at 0 and is empty
    /// unless the logical range crosses the end of the array.
    pub fn spans(&self, at: usize, len: usize) -> (Range<usize>, Range<usize>) {
        debug_assert!(at < self.capacity && len < self.capacity);
        let first = len.min(self.capacity - at);
        (at..at + first, 0..len - first)
    }

    /// Copy `bytes` into `data` starting at `at`, splitting at the end of
    /// the array.
    pub fn write(&self, data: &mut [u8], at: usize, bytes: &[u8]) -> Advance {
        debug_assert_eq!(data.len(), self.capacity);
        let (head, tail) = self.spans(at, bytes.len());
        let split = head.len();
        data[head].copy_from_slice(&bytes[..split]);
        data[tail].copy_from_slice(&bytes[split..]);
        self.advance(at, bytes.len())
    }

    /// Copy `len` bytes starting at `at` out of `data` into one contiguous
    /// buffer: the tail-of-array part first, then the head-of-array part.
    pub fn read(&self, data: &[u8], at: usize, len: usize) -> (Vec<u8>, Advance) {
        debug_assert_eq!(data.len(), self.capacity);
        let (head, tail) = self.spans(at, len);
        let mut out = Vec::with_capacity(len);
        out.extend_from_slice(&data[head]);
        out.extend_from_slice(&data[tail]);
        (out, self.advance(at, len))
    }
}
