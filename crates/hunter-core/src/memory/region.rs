use std::collections::TryReserveError;

use tracing::warn;

use crate::process::MapEntry;

/// How much of a region's buffer holds bytes copied from the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Nothing has been copied yet.
    Pending,
    /// This many leading bytes are valid (may be less than the region size).
    Captured(usize),
    /// The last copy failed; the region supplies no data.
    Failed,
}

/// A contiguous range of the target's address space and its cached contents.
#[derive(Debug)]
pub struct MemoryRegion {
    begin: u64,
    end: u64,
    content: Option<Vec<u8>>,
    capture: CaptureState,
    dirty: bool,
    label: String,
}

impl MemoryRegion {
    /// Create a region covering `begin..end`.
    ///
    /// With `allocate` the buffer is created immediately, otherwise it is
    /// created on first capture. A buffer that cannot be allocated is left
    /// to the first capture, which then records the failure.
    pub fn new(begin: u64, end: u64, label: impl Into<String>, allocate: bool) -> Self {
        debug_assert!(begin < end);
        let mut region = Self {
            begin,
            end,
            content: None,
            capture: CaptureState::Pending,
            dirty: true,
            label: label.into(),
        };
        if allocate && let Err(e) = region.allocate() {
            warn!("Region {} left unallocated: {}", region.label, e);
        }
        region
    }

    pub fn from_map_entry(entry: &MapEntry, allocate: bool) -> Self {
        Self::new(entry.begin, entry.end, entry.line.clone(), allocate)
    }

    pub fn begin(&self) -> u64 {
        self.begin
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn size(&self) -> usize {
        (self.end - self.begin) as usize
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn capture(&self) -> CaptureState {
        self.capture
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn contains(&self, address: u64) -> bool {
        self.begin <= address && address < self.end
    }

    pub fn is_allocated(&self) -> bool {
        self.content.is_some()
    }

    /// The whole buffer, if allocated.
    pub fn content(&self) -> Option<&[u8]> {
        self.content.as_deref()
    }

    /// Number of leading bytes holding captured data.
    pub fn valid_len(&self) -> usize {
        match (self.capture, &self.content) {
            (CaptureState::Captured(len), Some(_)) => len,
            _ => 0,
        }
    }

    /// The captured prefix of the buffer; empty when nothing usable was copied.
    pub fn captured_bytes(&self) -> &[u8] {
        let len = self.valid_len();
        self.content.as_deref().map(|c| &c[..len]).unwrap_or(&[])
    }

    /// Create the zeroed buffer unless it already exists.
    pub(crate) fn allocate(&mut self) -> Result<(), TryReserveError> {
        if self.content.is_none() {
            let size = self.size();
            let mut buffer = Vec::new();
            buffer.try_reserve_exact(size)?;
            buffer.resize(size, 0);
            self.content = Some(buffer);
        }
        Ok(())
    }

    /// Buffer to copy into, allocating it on first use.
    pub(crate) fn buffer_mut(&mut self) -> Result<&mut [u8], TryReserveError> {
        self.allocate()?;
        Ok(self.content.as_deref_mut().unwrap_or_default())
    }

    pub(crate) fn set_capture(&mut self, capture: CaptureState) {
        self.capture = capture;
    }

    pub(crate) fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// Move buffer and capture state out of `old` into this region.
    ///
    /// The buffer is moved, not copied, so its heap allocation is reused.
    pub(crate) fn adopt(&mut self, old: &mut MemoryRegion) {
        debug_assert_eq!((self.begin, self.end), (old.begin, old.end));
        self.content = old.content.take();
        self.capture = old.capture;
        old.capture = CaptureState::Pending;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_region_has_no_data() {
        let region = MemoryRegion::new(0x1000, 0x2000, "lazy", false);
        assert!(!region.is_allocated());
        assert_eq!(region.size(), 0x1000);
        assert_eq!(region.valid_len(), 0);
        assert!(region.captured_bytes().is_empty());
        assert!(region.is_dirty());
    }

    #[test]
    fn test_captured_prefix() {
        let mut region = MemoryRegion::new(0x1000, 0x1008, "eager", true);
        region.buffer_mut().unwrap()[..3].copy_from_slice(&[1, 2, 3]);
        region.set_capture(CaptureState::Captured(3));
        assert_eq!(region.captured_bytes(), &[1, 2, 3]);

        region.set_capture(CaptureState::Failed);
        assert!(region.captured_bytes().is_empty());
    }

    #[test]
    fn test_oversized_region_stays_unallocated() {
        let mut region = MemoryRegion::new(0, u64::MAX, "huge", true);
        assert!(!region.is_allocated());
        assert!(region.allocate().is_err());
        assert!(region.buffer_mut().is_err());
        assert!(region.captured_bytes().is_empty());
    }

    #[test]
    fn test_contains_is_half_open() {
        let region = MemoryRegion::new(0x1000, 0x1010, "r", false);
        assert!(region.contains(0x1000));
        assert!(region.contains(0x100F));
        assert!(!region.contains(0x1010));
        assert!(!region.contains(0x0FFF));
    }

    #[test]
    fn test_adopt_moves_buffer() {
        let mut old = MemoryRegion::new(0x1000, 0x1010, "old", true);
        old.set_capture(CaptureState::Captured(0x10));
        let ptr = old.content().unwrap().as_ptr();

        let mut new = MemoryRegion::new(0x1000, 0x1010, "new", false);
        new.adopt(&mut old);

        assert_eq!(new.content().unwrap().as_ptr(), ptr);
        assert_eq!(new.capture(), CaptureState::Captured(0x10));
        assert!(!old.is_allocated());
    }
}
