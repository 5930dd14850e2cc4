//! Region configuration.
//!
//! This module provides configuration for the shared log region.

use crate::layout::REGION_HEADER_SIZE;
use logring_core::{Error, Result, RECORD_HEADER_SIZE};

/// Default capacity of the data array (1MB)
pub const DEFAULT_CAPACITY: usize = 1024 * 1024;

/// Largest capacity whose offsets still fit the `u32` cursors
pub const MAX_CAPACITY: usize = u32::MAX as usize - REGION_HEADER_SIZE;

/// Smallest capacity that can hold a record with an empty body
pub const MIN_CAPACITY: usize = RECORD_HEADER_SIZE + 1;

/// Region configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionConfig {
    /// Size of the data array in bytes (default: 1MB).
    ///
    /// Every record must be strictly smaller than this.
    pub capacity: usize,
}

impl Default for RegionConfig {
    fn default() -> Self {
        RegionConfig {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl RegionConfig {
    /// Create a new region configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set capacity (builder pattern).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        validate_capacity(self.capacity)
    }

    /// Create a configuration optimized for testing (small region).
    pub fn for_testing() -> Self {
        RegionConfig {
            capacity: 4 * 1024, // 4KB so tests wrap after a few dozen records
        }
    }
}

/// Check that `capacity` is usable for a region.
///
/// # Errors
///
/// `InvalidConfiguration` when the capacity is zero, too small for the
/// smallest record, or too large for the cursor width.
pub fn validate_capacity(capacity: usize) -> Result<()> {
    if capacity == 0 {
        return Err(Error::invalid_config("capacity must be positive"));
    }
    if capacity < MIN_CAPACITY {
        return Err(Error::invalid_config(format!(
            "capacity {} cannot hold any record (minimum {})",
            capacity, MIN_CAPACITY
        )));
    }
    if capacity > MAX_CAPACITY {
        return Err(Error::invalid_config(format!(
            "capacity {} exceeds maximum {}",
            capacity, MAX_CAPACITY
        )));
    }
    Ok(())
}
