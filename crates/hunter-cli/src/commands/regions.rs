//! Regions command implementation.

use std::path::Path;

use anyhow::Result;
use hunter_core::{BrowserOptions, CaptureState, MemoryRegion};
use serde::Serialize;

use crate::cli_utils::open_session;

#[derive(Serialize)]
struct RegionInfo<'a> {
    begin: String,
    end: String,
    size: usize,
    captured: Option<usize>,
    label: &'a str,
}

impl<'a> From<&'a MemoryRegion> for RegionInfo<'a> {
    fn from(region: &'a MemoryRegion) -> Self {
        Self {
            begin: format!("{:#x}", region.begin()),
            end: format!("{:#x}", region.end()),
            size: region.size(),
            captured: match region.capture() {
                CaptureState::Captured(len) => Some(len),
                CaptureState::Pending | CaptureState::Failed => None,
            },
            label: region.label(),
        }
    }
}

/// Run the regions command
pub fn run(
    pid: Option<i32>,
    replay: Option<&Path>,
    json: bool,
    options: BrowserOptions,
) -> Result<()> {
    let browser = open_session(pid, replay, options)?;

    if json {
        let infos: Vec<RegionInfo> = browser.regions().iter().map(RegionInfo::from).collect();
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }

    for region in browser.regions() {
        let capture = match region.capture() {
            CaptureState::Captured(len) if len == region.size() => "full".to_string(),
            CaptureState::Captured(len) => format!("{} bytes", len),
            CaptureState::Pending => "pending".to_string(),
            CaptureState::Failed => "failed".to_string(),
        };
        println!(
            "{:016x}-{:016x} {:>10} {:>12}  {}",
            region.begin(),
            region.end(),
            region.size(),
            capture,
            region.label()
        );
    }

    let stats = browser.stats();
    println!(
        "{} regions, {} bytes captured, {} failed, {} partial",
        stats.regions, stats.captured_bytes, stats.failed, stats.partial
    );
    Ok(())
}
