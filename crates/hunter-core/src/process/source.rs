//! Process source abstraction for testability.
//!
//! The catalog only needs two things from a target process: its memory map
//! and a way to copy bytes out of it. Abstracting both lets the same catalog
//! code run against a live process or an in-memory mock.

use crate::error::Result;
use crate::process::maps::MapEntry;

/// Something whose memory can be enumerated and copied.
pub trait MemorySource {
    /// Process id, used for diagnostics.
    fn pid(&self) -> i32;

    /// Enumerate every mapping, in the order the OS reports them.
    fn memory_map(&self) -> Result<Vec<MapEntry>>;

    /// Copy bytes starting at `address` into `buf`.
    ///
    /// Returns the number of bytes copied, which may be less than
    /// `buf.len()` when only part of the range is readable.
    fn read_into(&self, address: u64, buf: &mut [u8]) -> Result<usize>;

    /// Read exactly `size` bytes, treating a short copy as a failure.
    fn read_exact(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; size];
        let copied = self.read_into(address, &mut buffer)?;
        if copied != size {
            return Err(crate::error::Error::BufferTooSmall {
                address,
                size,
                available: copied,
            });
        }
        Ok(buffer)
    }
}
