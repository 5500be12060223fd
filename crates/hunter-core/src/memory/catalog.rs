//! Ordered collection of cataloged regions and the operations that keep it
//! in step with the target's memory map.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::memory::region::{CaptureState, MemoryRegion};
use crate::pattern::{CompiledPattern, find_in_buffer};
use crate::process::{MapEntry, MemorySource};

/// Summary of the catalog, used for status lines and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub regions: usize,
    pub allocated_bytes: u64,
    pub captured_bytes: u64,
    pub failed: usize,
    pub partial: usize,
    pub pending: usize,
    /// Wall time of the last snapshot, refresh or load.
    pub last_duration: Option<Duration>,
}

/// Regions sorted by address, never overlapping once verified.
#[derive(Debug, Default)]
pub struct RegionCatalog {
    regions: Vec<MemoryRegion>,
}

impl RegionCatalog {
    /// Build a catalog from regions in the given order, verifying it.
    pub fn from_regions(regions: Vec<MemoryRegion>) -> Result<Self> {
        let catalog = Self { regions };
        catalog.verify()?;
        Ok(catalog)
    }

    /// Enumerate the readable anonymous mappings of `source`.
    ///
    /// Map order is preserved; ordering is checked separately by [`verify`].
    ///
    /// [`verify`]: RegionCatalog::verify
    pub fn enumerate<S: MemorySource>(source: &S, allocate: bool) -> Result<Self> {
        let entries = source.memory_map()?;
        let cataloged: Vec<&MapEntry> = entries.iter().filter(|e| e.is_cataloged()).collect();
        debug!(
            "Enumerated {} of {} mappings ({} bytes) for pid {}",
            cataloged.len(),
            entries.len(),
            cataloged.iter().map(|e| e.size()).sum::<u64>(),
            source.pid()
        );
        let regions = cataloged
            .into_iter()
            .map(|entry| MemoryRegion::from_map_entry(entry, allocate))
            .collect();
        Ok(Self { regions })
    }

    pub fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn clear(&mut self) {
        self.regions.clear();
    }

    /// Index of the region containing `address`.
    pub fn index_of(&self, address: u64) -> Option<usize> {
        let index = self.regions.partition_point(|r| r.end() <= address);
        self.regions
            .get(index)
            .filter(|r| r.contains(address))
            .map(|_| index)
    }

    pub fn region(&self, index: usize) -> Option<&MemoryRegion> {
        self.regions.get(index)
    }

    /// Check that regions are ascending and disjoint.
    pub fn verify(&self) -> Result<()> {
        for pair in self.regions.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            let kind = if prev.begin() > next.begin() {
                "unsorted"
            } else if prev.end() > next.begin() {
                "overlapping"
            } else {
                continue;
            };
            return Err(Error::InconsistentRegionOrdering {
                kind,
                prev_begin: prev.begin(),
                prev_end: prev.end(),
                begin: next.begin(),
                end: next.end(),
            });
        }
        Ok(())
    }

    /// Copy every region from the process, one read per region.
    ///
    /// Per-region failures are recorded in the region's capture state and
    /// never abort the batch.
    pub fn bulk_read<S: MemorySource>(&mut self, source: &S) {
        for region in &mut self.regions {
            capture_region(source, region);
        }
    }

    /// Re-fetch one region if the refresh policy asks for it.
    ///
    /// With `dirty_tracking` a region is re-read at most once between two
    /// calls to [`rebuild`]. A region whose last read failed is not retried
    /// until the next rebuild.
    ///
    /// [`rebuild`]: RegionCatalog::rebuild
    pub fn refresh_region<S: MemorySource>(
        &mut self,
        source: &S,
        index: usize,
        dirty_tracking: bool,
    ) {
        let Some(region) = self.regions.get_mut(index) else {
            return;
        };
        if !region.is_dirty() && (dirty_tracking || region.capture() == CaptureState::Failed) {
            return;
        }
        capture_region(source, region);
    }

    /// Re-enumerate the process and carry buffers over to unchanged regions.
    ///
    /// Regions are matched by exact bounds with a cursor that only moves
    /// forward, so a mapping that changed position relative to its
    /// neighbours between two calls is not recognised as the same region.
    /// Every region comes out dirty.
    pub fn rebuild<S: MemorySource>(&mut self, source: &S, lazy_alloc: bool) -> Result<()> {
        let mut fresh = Self::enumerate(source, false)?;
        let mut previous = std::mem::take(&mut self.regions);

        let mut cursor = 0usize;
        let mut reused = 0usize;
        for region in &mut fresh.regions {
            let matched = previous[cursor..]
                .iter()
                .position(|old| old.begin() == region.begin() && old.end() == region.end());
            match matched {
                Some(offset) => {
                    let index = cursor + offset;
                    region.adopt(&mut previous[index]);
                    cursor = index + 1;
                    reused += 1;
                }
                None => {
                    trace!("New region {}", region.label());
                    if !lazy_alloc && let Err(e) = region.allocate() {
                        warn!("Region {} left unallocated: {}", region.label(), e);
                    }
                }
            }
            region.set_dirty(true);
        }

        debug!(
            "Rebuilt catalog: {} regions, {} reused, {} dropped",
            fresh.regions.len(),
            reused,
            previous.len() - reused
        );
        self.regions = fresh.regions;
        self.verify()
    }

    /// Mark every region stale.
    pub fn mark_all_dirty(&mut self) {
        for region in &mut self.regions {
            region.set_dirty(true);
        }
    }

    /// First address at or after `start_address` where `pattern` matches.
    ///
    /// Only captured bytes are searched; a match never spans two regions.
    pub fn find(&self, pattern: &CompiledPattern, start_address: u64) -> Option<u64> {
        let first = self.regions.partition_point(|r| r.end() <= start_address);
        self.regions[first..].iter().find_map(|region| {
            let from = start_address.saturating_sub(region.begin()) as usize;
            find_in_buffer(pattern, region.captured_bytes(), from)
                .map(|offset| region.begin() + offset as u64)
        })
    }

    pub fn stats(&self) -> CatalogStats {
        let mut stats = CatalogStats {
            regions: self.regions.len(),
            ..CatalogStats::default()
        };
        for region in &self.regions {
            if region.is_allocated() {
                stats.allocated_bytes += region.size() as u64;
            }
            stats.captured_bytes += region.valid_len() as u64;
            match region.capture() {
                CaptureState::Pending => stats.pending += 1,
                CaptureState::Failed => stats.failed += 1,
                CaptureState::Captured(len) if len < region.size() => stats.partial += 1,
                CaptureState::Captured(_) => {}
            }
        }
        stats
    }
}

fn capture_region<S: MemorySource>(source: &S, region: &mut MemoryRegion) {
    let begin = region.begin();
    let size = region.size();
    let result = match region.buffer_mut() {
        Ok(buffer) => source.read_into(begin, buffer).map_err(|e| e.to_string()),
        Err(e) => Err(format!("can't allocate {} bytes: {}", size, e)),
    };
    let capture = match result {
        Ok(copied) if copied == size => CaptureState::Captured(copied),
        Ok(copied) => {
            warn!(
                "Region {} only partially read: {} of {} bytes",
                region.label(),
                copied,
                size
            );
            CaptureState::Captured(copied)
        }
        Err(e) => {
            warn!("Region {} could not be read: {}", region.label(), e);
            CaptureState::Failed
        }
    };
    region.set_capture(capture);
    region.set_dirty(false);
}
