//! Non-volatile memory driver abstraction.
//!
//! The settings store never touches hardware directly. It talks to a
//! byte-addressable region through [`NonVolatileMemory`], which the platform
//! supplies (EEPROM emulation on the device, an image file on the host,
//! [`MemoryNvm`] in tests).
//!
//! The contract follows EEPROM-emulation semantics: `write_byte` only
//! changes a RAM cache, and nothing is durable until `flush` succeeds.

use thiserror::Error;

/// Value of a byte that has never been written.
pub const ERASED_BYTE: u8 = 0xFF;

/// Errors reported by a non-volatile memory driver.
#[derive(Debug, Error)]
pub enum NvmError {
    /// `read_byte`/`write_byte`/`flush` called before `initialize`.
    #[error("Non-volatile memory used before initialization")]
    NotInitialized,

    /// The durability flush did not complete.
    #[error("Non-volatile memory flush failed")]
    FlushFailed,

    /// Backing storage I/O failed (file-backed drivers).
    #[error("Non-volatile memory I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Byte-addressable non-volatile region.
///
/// All methods are synchronous and blocking. Offsets are relative to the
/// start of the region; callers must keep them below [`region_size`].
///
/// [`region_size`]: NonVolatileMemory::region_size
pub trait NonVolatileMemory {
    /// Prepare a region of `region_size` bytes.
    ///
    /// Must be idempotent: calling it again with the same size keeps the
    /// current contents.
    fn initialize(&mut self, region_size: usize) -> Result<(), NvmError>;

    /// Size of the prepared region, `0` before [`initialize`](Self::initialize).
    fn region_size(&self) -> usize;

    /// Read one byte from the cache.
    fn read_byte(&self, offset: usize) -> u8;

    /// Write one byte to the cache. Not durable until [`flush`](Self::flush).
    fn write_byte(&mut self, offset: usize, value: u8);

    /// Commit pending writes to durable storage.
    fn flush(&mut self) -> Result<(), NvmError>;
}

impl<N: NonVolatileMemory + ?Sized> NonVolatileMemory for &mut N {
    fn initialize(&mut self, region_size: usize) -> Result<(), NvmError> {
        (**self).initialize(region_size)
    }

    fn region_size(&self) -> usize {
        (**self).region_size()
    }

    fn read_byte(&self, offset: usize) -> u8 {
        (**self).read_byte(offset)
    }

    fn write_byte(&mut self, offset: usize, value: u8) {
        (**self).write_byte(offset, value)
    }

    fn flush(&mut self) -> Result<(), NvmError> {
        (**self).flush()
    }
}

/// In-memory EEPROM emulation.
///
/// Keeps a RAM cache and a separate durable image. Supports:
/// - Failure injection for the next flush
/// - Flush counting
/// - Power-cycle simulation that drops unflushed writes
///
/// # Example
///
/// ```
/// use scoreboard_core::nvm::{MemoryNvm, NonVolatileMemory};
///
/// let mut nvm = MemoryNvm::new();
/// nvm.initialize(16).unwrap();
/// nvm.write_byte(0, 42);
/// assert_eq!(nvm.durable()[0], 0xFF);
///
/// nvm.flush().unwrap();
/// assert_eq!(nvm.durable()[0], 42);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryNvm {
    /// Working copy seen by read/write.
    cache: Vec<u8>,
    /// Contents that survive a power cycle.
    durable: Vec<u8>,
    fail_next_flush: bool,
    flush_count: usize,
}

impl MemoryNvm {
    /// Create an uninitialized, erased device.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a device whose durable contents are `image`.
    ///
    /// `initialize` still has to be called; it pads the image with erased
    /// bytes when the requested region is larger.
    pub fn from_image(image: &[u8]) -> Self {
        Self {
            cache: image.to_vec(),
            durable: image.to_vec(),
            ..Self::default()
        }
    }

    /// Durable contents (what a power cycle would preserve).
    pub fn durable(&self) -> &[u8] {
        &self.durable
    }

    /// Current cache contents, including unflushed writes.
    pub fn cache(&self) -> &[u8] {
        &self.cache
    }

    /// Make the next [`flush`](NonVolatileMemory::flush) fail without
    /// touching the durable image.
    pub fn fail_next_flush(&mut self) {
        self.fail_next_flush = true;
    }

    /// Number of successful flushes.
    pub fn flush_count(&self) -> usize {
        self.flush_count
    }

    /// Drop unflushed writes, as a reboot would.
    pub fn power_cycle(&mut self) {
        self.cache.clone_from(&self.durable);
        self.fail_next_flush = false;
    }
}

impl NonVolatileMemory for MemoryNvm {
    fn initialize(&mut self, region_size: usize) -> Result<(), NvmError> {
        if self.cache.len() < region_size {
            self.cache.resize(region_size, ERASED_BYTE);
        }
        if self.durable.len() < region_size {
            self.durable.resize(region_size, ERASED_BYTE);
        }
        Ok(())
    }

    fn region_size(&self) -> usize {
        self.cache.len()
    }

    fn read_byte(&self, offset: usize) -> u8 {
        self.cache[offset]
    }

    fn write_byte(&mut self, offset: usize, value: u8) {
        self.cache[offset] = value;
    }

    fn flush(&mut self) -> Result<(), NvmError> {
        if self.fail_next_flush {
            self.fail_next_flush = false;
            return Err(NvmError::FlushFailed);
        }
        self.durable.clone_from(&self.cache);
        self.flush_count += 1;
        Ok(())
    }
}
