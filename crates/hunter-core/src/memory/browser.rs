//! The browsing session: one catalog, one optional live source and a fixed
//! set of options.

use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::BrowserOptions;
use crate::error::{Error, Result};
use crate::memory::catalog::{CatalogStats, RegionCatalog};
use crate::memory::region::MemoryRegion;
use crate::pattern::CompiledPattern;
use crate::process::{LiveProcess, MemorySource, Primitive, TextEncoding, decode_text};
use crate::storage::{load_regions, store_regions};

/// Reads, searches and persists the memory of one target.
///
/// A session without a source can only work on loaded dumps.
///
/// # Example
///
/// ```
/// use hunter_core::{Browser, BrowserOptions, MockProcess};
/// use hunter_core::pattern::CompiledPattern;
///
/// let process = MockProcess::builder()
///     .zeroed(0x1000, 0x20)
///     .write_bytes(4, &[0x90, 0x90, 0xAA, 0xBB])
///     .build();
/// let mut browser = Browser::with_source(process, BrowserOptions::default());
/// browser.snapshot().unwrap();
///
/// let pattern = CompiledPattern::compile("demo", "90 90 AA BB").unwrap();
/// assert_eq!(browser.find(&pattern, 0), Some(0x1004));
/// ```
#[derive(Debug)]
pub struct Browser<S: MemorySource = LiveProcess> {
    source: Option<S>,
    options: BrowserOptions,
    catalog: RegionCatalog,
    last_duration: Option<Duration>,
}

impl Browser<LiveProcess> {
    /// Session on a running process. Nothing is read until the first
    /// [`snapshot`](Browser::snapshot) or [`refresh_catalog`](Browser::refresh_catalog).
    pub fn attach(pid: i32, options: BrowserOptions) -> Self {
        Self::with_source(LiveProcess::new(pid), options)
    }

    /// Replay-only session, to be filled with [`load`](Browser::load).
    pub fn offline(options: BrowserOptions) -> Self {
        Self {
            source: None,
            options,
            catalog: RegionCatalog::default(),
            last_duration: None,
        }
    }
}

impl<S: MemorySource> Browser<S> {
    pub fn with_source(source: S, options: BrowserOptions) -> Self {
        Self {
            source: Some(source),
            options,
            catalog: RegionCatalog::default(),
            last_duration: None,
        }
    }

    pub fn options(&self) -> &BrowserOptions {
        &self.options
    }

    pub fn source(&self) -> Option<&S> {
        self.source.as_ref()
    }

    pub fn source_mut(&mut self) -> Option<&mut S> {
        self.source.as_mut()
    }

    pub fn regions(&self) -> &[MemoryRegion] {
        self.catalog.regions()
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            last_duration: self.last_duration,
            ..self.catalog.stats()
        }
    }

    fn live_source(&self) -> Result<&S> {
        self.source.as_ref().ok_or(Error::NoProcess)
    }

    /// Replace the catalog with a full copy of the process memory.
    pub fn snapshot(&mut self) -> Result<()> {
        let started = Instant::now();
        let source = self.source.as_ref().ok_or(Error::NoProcess)?;
        let mut catalog = RegionCatalog::enumerate(source, true)?;
        catalog.verify()?;
        catalog.bulk_read(source);
        self.catalog = catalog;

        let elapsed = started.elapsed();
        self.last_duration = Some(elapsed);
        info!(
            "Snapshot of pid {}: {} regions in {:?}",
            source.pid(),
            self.catalog.len(),
            elapsed
        );
        Ok(())
    }

    /// Bring the catalog in line with the current memory map.
    ///
    /// Called once at the start of every polling cycle. Unchanged regions
    /// keep their buffers; every region is marked stale.
    pub fn refresh_catalog(&mut self) -> Result<()> {
        let started = Instant::now();
        let source = self.source.as_ref().ok_or(Error::NoProcess)?;
        self.catalog.rebuild(source, self.options.lazy_alloc)?;

        let elapsed = started.elapsed();
        self.last_duration = Some(elapsed);
        debug!("Catalog refreshed: {} regions in {:?}", self.catalog.len(), elapsed);
        Ok(())
    }

    /// Drop every region.
    pub fn clear(&mut self) {
        self.catalog.clear();
    }

    /// Write the captured memory into `dir`, one file per region.
    pub fn store<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        store_regions(dir.as_ref(), self.catalog.regions())
    }

    /// Replace the catalog with dumps previously written by [`store`](Browser::store).
    pub fn load<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let started = Instant::now();
        let regions = load_regions(dir.as_ref())?;
        self.catalog = RegionCatalog::from_regions(regions)?;
        self.last_duration = Some(started.elapsed());
        info!(
            "Loaded {} regions from {}",
            self.catalog.len(),
            dir.as_ref().display()
        );
        Ok(())
    }

    /// Address of the first match at or after `start_address`.
    pub fn find(&self, pattern: &CompiledPattern, start_address: u64) -> Option<u64> {
        self.catalog.find(pattern, start_address)
    }

    /// Search every pattern from the start of memory, storing each result
    /// in its `resolved_address`. Returns how many were found.
    pub fn find_all(&self, patterns: &mut [CompiledPattern], debug_all: bool) -> usize {
        let mut found = 0;
        for pattern in patterns.iter_mut() {
            pattern.resolved_address = self.find(pattern, 0);
            if pattern.resolved_address.is_some() {
                found += 1;
            }
            if debug_all {
                match pattern.resolved_address {
                    Some(address) => debug!("Pattern {} found at {:#x}", pattern.name(), address),
                    None => debug!("Pattern {} not found", pattern.name()),
                }
                debug!("Pattern {} layout:\n{}", pattern.name(), pattern);
            }
        }
        found
    }

    /// Run `f` over `len` bytes at `address`, honouring the read mode.
    fn with_bytes<R>(
        &mut self,
        address: u64,
        len: usize,
        allow_refresh: bool,
        f: impl FnOnce(&[u8]) -> R,
    ) -> Result<R> {
        if self.options.direct_mem {
            let bytes = self
                .live_source()?
                .read_exact(address, len)
                .map_err(|e| match e {
                    Error::RegionReadFailure { message, .. } => Error::not_mapped(address, message),
                    other => other,
                })?;
            return Ok(f(&bytes));
        }

        let index = self
            .catalog
            .index_of(address)
            .ok_or_else(|| Error::not_mapped(address, "outside all cataloged regions"))?;
        if allow_refresh {
            if let Some(source) = self.source.as_ref() {
                self.catalog
                    .refresh_region(source, index, self.options.dirty_tracking);
            }
        }

        let region = self
            .catalog
            .region(index)
            .ok_or_else(|| Error::not_mapped(address, "region vanished"))?;
        let offset = (address - region.begin()) as usize;
        let captured = region.captured_bytes();
        let available = captured.len().saturating_sub(offset);
        if len > available {
            return Err(Error::BufferTooSmall {
                address,
                size: len,
                available,
            });
        }
        Ok(f(&captured[offset..offset + len]))
    }

    /// Read a value, refreshing its region first when `allow_refresh` is set.
    pub fn read<T: Primitive>(&mut self, address: u64, allow_refresh: bool) -> Result<T> {
        self.with_bytes(address, T::SIZE, allow_refresh, T::decode)?
            .ok_or_else(|| Error::not_mapped(address, "decode length mismatch"))
    }

    pub fn try_read<T: Primitive>(&mut self, address: u64, allow_refresh: bool) -> Option<T> {
        self.read(address, allow_refresh).ok()
    }

    /// Copy `len` raw bytes.
    pub fn read_bytes(&mut self, address: u64, len: usize, allow_refresh: bool) -> Result<Vec<u8>> {
        self.with_bytes(address, len, allow_refresh, <[u8]>::to_vec)
    }

    /// Read a fixed-size text field of `len` bytes.
    pub fn read_text(
        &mut self,
        address: u64,
        len: usize,
        encoding: TextEncoding,
        allow_refresh: bool,
    ) -> Result<String> {
        self.with_bytes(address, len, allow_refresh, |bytes| {
            decode_text(bytes, encoding)
        })
    }

    pub fn try_read_text(
        &mut self,
        address: u64,
        len: usize,
        encoding: TextEncoding,
        allow_refresh: bool,
    ) -> Option<String> {
        self.read_text(address, len, encoding, allow_refresh).ok()
    }
}
