//! Hex address parsing and formatting utilities.

use anyhow::{Context, Result};

/// Parse a hex address string (with or without 0x prefix).
pub fn parse_hex_address(s: &str) -> Result<u64> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u64::from_str_radix(digits, 16).with_context(|| format!("Invalid hex address: {}", s))
}

/// Parse a comma separated list of hex offsets, e.g. `0x48,0x10`.
///
/// An empty string yields an empty chain.
pub fn parse_offset_list(s: &str) -> Result<Vec<u64>> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_hex_address)
        .collect()
}

/// Format an address as a hex string with 0x prefix.
pub fn format_hex_address(addr: u64) -> String {
    format!("0x{:X}", addr)
}
