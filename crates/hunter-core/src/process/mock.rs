//! In-memory process for testing
//!
//! Provides a configurable implementation of [`MemorySource`] that serves a
//! memory map and region contents from plain buffers, so catalog, refresh and
//! persistence logic can be exercised without a second process.

use std::cell::Cell;

use crate::error::{Error, Result};
use crate::process::maps::MapEntry;
use crate::process::source::MemorySource;

#[derive(Debug, Clone)]
struct MockRegion {
    begin: u64,
    data: Vec<u8>,
    permissions: String,
    inode: u64,
    pathname: Option<String>,
    /// Reads of this region fail outright.
    fail: bool,
    /// Only this many leading bytes can be copied.
    readable_len: Option<usize>,
}

impl MockRegion {
    fn end(&self) -> u64 {
        self.begin + self.data.len() as u64
    }

    fn map_entry(&self) -> MapEntry {
        let line = format!(
            "{:x}-{:x} {} 00000000 00:00 {} {}",
            self.begin,
            self.end(),
            self.permissions,
            self.inode,
            self.pathname.as_deref().unwrap_or("")
        );
        MapEntry {
            begin: self.begin,
            end: self.end(),
            permissions: self.permissions.clone(),
            offset: 0,
            device: "00:00".to_string(),
            inode: self.inode,
            pathname: self.pathname.clone(),
            line: line.trim_end().to_string(),
        }
    }
}

/// Mock process memory
///
/// Regions are kept sorted by address. Every call to `read_into` is counted,
/// which lets tests check when the catalog goes back to the process.
#[derive(Debug, Default)]
pub struct MockProcess {
    pid: i32,
    regions: Vec<MockRegion>,
    reads: Cell<usize>,
}

impl MockProcess {
    pub fn builder() -> MockProcessBuilder {
        MockProcessBuilder::new()
    }

    /// Number of `read_into` calls served so far.
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }

    pub fn reset_read_count(&self) {
        self.reads.set(0);
    }

    /// Overwrite bytes in an existing region.
    ///
    /// # Panics
    ///
    /// Panics if the range is not inside a single region.
    pub fn write_bytes(&mut self, address: u64, bytes: &[u8]) {
        let region = self
            .regions
            .iter_mut()
            .find(|r| r.begin <= address && address < r.end())
            .expect("mock write outside all regions");
        let offset = (address - region.begin) as usize;
        region.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    pub fn write_u64(&mut self, address: u64, value: u64) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    /// Add a readable anonymous mapping.
    pub fn map(&mut self, begin: u64, data: Vec<u8>) {
        self.insert(MockRegion {
            begin,
            data,
            permissions: "rw-p".to_string(),
            inode: 0,
            pathname: None,
            fail: false,
            readable_len: None,
        });
    }

    /// Remove the mapping starting at `begin`.
    pub fn unmap(&mut self, begin: u64) {
        self.regions.retain(|r| r.begin != begin);
    }

    fn insert(&mut self, region: MockRegion) {
        let index = self.regions.partition_point(|r| r.begin < region.begin);
        self.regions.insert(index, region);
    }
}

impl MemorySource for MockProcess {
    fn pid(&self) -> i32 {
        self.pid
    }

    fn memory_map(&self) -> Result<Vec<MapEntry>> {
        Ok(self.regions.iter().map(MockRegion::map_entry).collect())
    }

    fn read_into(&self, address: u64, buf: &mut [u8]) -> Result<usize> {
        self.reads.set(self.reads.get() + 1);

        let region = self
            .regions
            .iter()
            .find(|r| r.begin <= address && address < r.end())
            .ok_or_else(|| Error::RegionReadFailure {
                begin: address,
                end: address.wrapping_add(buf.len() as u64),
                message: "Bad address".to_string(),
            })?;

        if region.fail {
            return Err(Error::RegionReadFailure {
                begin: address,
                end: address.wrapping_add(buf.len() as u64),
                message: "Operation not permitted".to_string(),
            });
        }

        let offset = (address - region.begin) as usize;
        let readable = region.readable_len.unwrap_or(region.data.len());
        let available = readable.saturating_sub(offset);
        let count = buf.len().min(available);
        buf[..count].copy_from_slice(&region.data[offset..offset + count]);
        Ok(count)
    }
}

/// Builder for creating mock processes
///
/// Provides a fluent API for constructing memory maps for testing.
#[derive(Debug, Default)]
pub struct MockProcessBuilder {
    pid: i32,
    regions: Vec<MockRegion>,
}

impl MockProcessBuilder {
    pub fn new() -> Self {
        Self {
            pid: 4242,
            regions: Vec::new(),
        }
    }

    pub fn pid(mut self, pid: i32) -> Self {
        self.pid = pid;
        self
    }

    /// Readable anonymous region with the given contents.
    pub fn region(self, begin: u64, data: Vec<u8>) -> Self {
        self.push(begin, data, "rw-p", 0, None)
    }

    /// Zero-filled readable anonymous region.
    pub fn zeroed(self, begin: u64, size: usize) -> Self {
        self.region(begin, vec![0; size])
    }

    /// File-backed mapping (non-zero inode); never cataloged.
    pub fn file_backed(self, begin: u64, data: Vec<u8>, path: &str) -> Self {
        self.push(begin, data, "r-xp", 1234, Some(path.to_string()))
    }

    /// Anonymous mapping without read permission; never cataloged.
    pub fn guard(self, begin: u64, size: usize) -> Self {
        self.push(begin, vec![0; size], "---p", 0, None)
    }

    /// Readable region whose reads always fail.
    pub fn failing(mut self, begin: u64, size: usize) -> Self {
        self = self.zeroed(begin, size);
        if let Some(region) = self.regions.last_mut() {
            region.fail = true;
        }
        self
    }

    /// Readable region of which only `readable` leading bytes can be copied.
    pub fn short(mut self, begin: u64, data: Vec<u8>, readable: usize) -> Self {
        self = self.region(begin, data);
        if let Some(region) = self.regions.last_mut() {
            region.readable_len = Some(readable);
        }
        self
    }

    /// Write a little-endian u64 into the most recently added region.
    pub fn write_u64(mut self, offset: usize, value: u64) -> Self {
        if let Some(region) = self.regions.last_mut() {
            region.data[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
        }
        self
    }

    /// Write a little-endian i32 into the most recently added region.
    pub fn write_i32(mut self, offset: usize, value: i32) -> Self {
        if let Some(region) = self.regions.last_mut() {
            region.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        }
        self
    }

    /// Write raw bytes into the most recently added region.
    pub fn write_bytes(mut self, offset: usize, bytes: &[u8]) -> Self {
        if let Some(region) = self.regions.last_mut() {
            region.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        }
        self
    }

    pub fn build(self) -> MockProcess {
        let mut process = MockProcess {
            pid: self.pid,
            regions: Vec::new(),
            reads: Cell::new(0),
        };
        for region in self.regions {
            process.insert(region);
        }
        process
    }

    fn push(
        mut self,
        begin: u64,
        data: Vec<u8>,
        permissions: &str,
        inode: u64,
        pathname: Option<String>,
    ) -> Self {
        self.regions.push(MockRegion {
            begin,
            data,
            permissions: permissions.to_string(),
            inode,
            pathname,
            fail: false,
            readable_len: None,
        });
        self
    }
}
