use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::memory::{CaptureState, MemoryRegion};

const PREFIX: &str = "mem.";
const SUFFIX: &str = ".bin";

/// File name of a region dump: `mem.<begin>-<end>.bin`, 16 hex digits each.
pub fn region_file_name(begin: u64, end: u64) -> String {
    format!("{}{:016x}-{:016x}{}", PREFIX, begin, end, SUFFIX)
}

/// Parse the bounds out of a region dump file name.
///
/// Returns `None` for names that do not follow the dump layout. Bounds are
/// returned as written, even when inverted.
pub fn parse_region_file_name(name: &str) -> Option<(u64, u64)> {
    let body = name.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
    let (begin, end) = body.split_once('-')?;
    let parse = |s: &str| {
        if s.len() == 16 && s.bytes().all(|b| b.is_ascii_hexdigit()) {
            u64::from_str_radix(s, 16).ok()
        } else {
            None
        }
    };
    Some((parse(begin)?, parse(end)?))
}

/// Write the captured bytes of every region into `dir`.
///
/// Regions with nothing captured produce empty files so the layout of the
/// address space survives the round trip.
pub fn store_regions(dir: &Path, regions: &[MemoryRegion]) -> Result<()> {
    fs::create_dir_all(dir)
        .map_err(|e| Error::persistence(dir, format!("can't create directory: {}", e)))?;

    let mut total = 0usize;
    for region in regions {
        let path = dir.join(region_file_name(region.begin(), region.end()));
        let bytes = region.captured_bytes();
        let mut file = File::create(&path)
            .map_err(|e| Error::persistence(&path, format!("can't create file: {}", e)))?;
        file.write_all(bytes)
            .and_then(|_| file.flush())
            .map_err(|e| Error::persistence(&path, format!("short write: {}", e)))?;
        total += bytes.len();
    }

    info!(
        "Stored {} regions ({} bytes) in {}",
        regions.len(),
        total,
        dir.display()
    );
    Ok(())
}

/// Read region dumps back from `dir`, sorted by file name.
///
/// Unrelated files are skipped. Ordering and overlap are not checked here.
pub fn load_regions(dir: &Path) -> Result<Vec<MemoryRegion>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| Error::persistence(dir, format!("can't open directory: {}", e)))?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::persistence(dir, e.to_string()))?;
        let path = entry.path();
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_file {
            debug!("Skipping non-regular entry {}", path.display());
            continue;
        }
        let Some((begin, end)) = parse_region_file_name(&name) else {
            debug!("Skipping unrelated file {}", path.display());
            continue;
        };
        if begin >= end {
            return Err(Error::persistence(
                &path,
                format!("inverted bounds {:#x}-{:#x}", begin, end),
            ));
        }
        found.push((name, begin, end));
    }
    found.sort_by(|a, b| a.0.cmp(&b.0));

    let mut regions = Vec::with_capacity(found.len());
    for (name, begin, end) in found {
        let path = dir.join(&name);
        let mut region = MemoryRegion::new(begin, end, name, false);
        let size = region.size();

        let mut file = File::open(&path)
            .map_err(|e| Error::persistence(&path, format!("can't open file: {}", e)))?;
        let file_len = file
            .metadata()
            .map_err(|e| Error::persistence(&path, e.to_string()))?
            .len();
        if file_len > size as u64 {
            return Err(Error::persistence(
                &path,
                format!("{} bytes of content for a {} byte region", file_len, size),
            ));
        }
        let captured = file_len as usize;
        let buffer = region.buffer_mut().map_err(|e| {
            Error::persistence(&path, format!("can't allocate {} bytes: {}", size, e))
        })?;
        file.read_exact(&mut buffer[..captured])
            .map_err(|e| Error::persistence(&path, format!("can't read whole file: {}", e)))?;

        region.set_capture(CaptureState::Captured(captured));
        region.set_dirty(false);
        regions.push(region);
    }

    debug!("Loaded {} regions from {}", regions.len(), dir.display());
    Ok(regions)
}
