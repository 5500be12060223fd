//! Parsing of `/proc/<pid>/maps`.
//!
//! Each line has the form
//!
//! ```text
//! 57524000-58428000 rw-p 00000000 00:00 0                                  [heap]
//! ```
//!
//! i.e. `begin-end permissions offset device inode [pathname]` with addresses
//! and offset in unprefixed hex and a decimal inode.

use std::fs;

use tracing::trace;

use crate::error::{Error, Result};

/// One mapping line of a process memory map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry {
    pub begin: u64,
    pub end: u64,
    pub permissions: String,
    pub offset: u64,
    pub device: String,
    pub inode: u64,
    pub pathname: Option<String>,
    /// The unparsed line, kept for diagnostics.
    pub line: String,
}

impl MapEntry {
    pub fn is_readable(&self) -> bool {
        self.permissions.starts_with('r')
    }

    /// Readable anonymous/private mappings (heap, stack and similar) are the
    /// only ones the catalog keeps; file-backed mappings are excluded.
    pub fn is_cataloged(&self) -> bool {
        self.is_readable() && self.inode == 0
    }

    pub fn size(&self) -> u64 {
        self.end - self.begin
    }
}

/// Parse a single map line, returning `None` for malformed input.
pub fn parse_map_line(line: &str) -> Option<MapEntry> {
    let mut fields = line.split_whitespace();

    let range = fields.next()?;
    let (begin, end) = range.split_once('-')?;
    let begin = u64::from_str_radix(begin, 16).ok()?;
    let end = u64::from_str_radix(end, 16).ok()?;
    if begin >= end {
        return None;
    }

    let permissions = fields.next()?.to_string();
    let offset = u64::from_str_radix(fields.next()?, 16).ok()?;
    let device = fields.next()?.to_string();
    let inode = fields.next()?.parse::<u64>().ok()?;

    let rest: Vec<&str> = fields.collect();
    let pathname = if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    };

    Some(MapEntry {
        begin,
        end,
        permissions,
        offset,
        device,
        inode,
        pathname,
        line: line.trim_end().to_string(),
    })
}

/// Parse a whole map description, skipping malformed lines.
///
/// Entries are returned in the order they appear.
pub fn parse_maps(text: &str) -> Vec<MapEntry> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let entry = parse_map_line(line);
            if entry.is_none() {
                trace!("Skipping malformed map line: {:?}", line);
            }
            entry
        })
        .collect()
}

/// Read and parse `/proc/<pid>/maps`.
pub fn read_process_maps(pid: i32) -> Result<Vec<MapEntry>> {
    let path = format!("/proc/{}/maps", pid);
    let text =
        fs::read_to_string(&path).map_err(|source| Error::EnumerationUnavailable { pid, source })?;
    Ok(parse_maps(&text))
}
