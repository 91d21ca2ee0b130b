//! Storage configuration.
//!
//! Describes where the credential record lives inside the non-volatile
//! region. The defaults match the device: a 512-byte region with the record
//! at offset 0.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::RECORD_SIZE;

/// Region size reserved on the device.
pub const DEFAULT_REGION_SIZE: usize = 512;

/// Offset of the credential record inside the region.
pub const DEFAULT_BASE_OFFSET: usize = 0;

/// Errors that can occur while validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The record does not fit between `base_offset` and the end of the region.
    #[error(
        "Region of {region_size} bytes cannot hold a {size}-byte record at offset {base_offset}",
        size = RECORD_SIZE
    )]
    RegionTooSmall {
        region_size: usize,
        base_offset: usize,
    },
}

/// Placement of the credential record in non-volatile memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageConfig {
    /// Bytes requested from the driver at initialization.
    pub region_size: usize,

    /// Offset of the first record byte.
    pub base_offset: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            region_size: DEFAULT_REGION_SIZE,
            base_offset: DEFAULT_BASE_OFFSET,
        }
    }
}

impl StorageConfig {
    /// Check that the record fits in the region.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.record_end() {
            Some(end) if end <= self.region_size => Ok(()),
            _ => Err(ConfigError::RegionTooSmall {
                region_size: self.region_size,
                base_offset: self.base_offset,
            }),
        }
    }

    /// Offset one past the last record byte, `None` on overflow.
    pub fn record_end(&self) -> Option<usize> {
        self.base_offset.checked_add(RECORD_SIZE)
    }
}
