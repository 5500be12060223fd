//! Dump command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use hunter_core::BrowserOptions;

use crate::cli_utils::attach;

/// Snapshot `pid` and store every region under `dir`
pub fn run(pid: i32, dir: &Path, options: BrowserOptions) -> Result<()> {
    let browser = attach(pid, options)?;
    browser
        .store(dir)
        .with_context(|| format!("Failed to store dumps in {}", dir.display()))?;

    let stats = browser.stats();
    println!(
        "Stored {} regions ({} bytes) in {}",
        stats.regions,
        stats.captured_bytes,
        dir.display()
    );
    if stats.failed > 0 {
        println!("{} regions could not be read", stats.failed);
    }
    Ok(())
}
