//! Scan command implementation.
//!
//! Compiles a pattern set, searches the whole catalog once and prints where
//! each signature was found. With `--relative` every match is also decoded
//! as a RIP-relative instruction, which is how most signatures lead to the
//! data they guard.

use std::path::Path;

use anyhow::{Context, Result};
use hunter_core::pattern::{CompiledPattern, compile_all};
use hunter_core::{BrowserOptions, load_patterns};
use tracing::warn;

use crate::cli_utils::open_session;
use crate::samples::builtin_patterns;

/// Run the scan command
pub fn run(
    pid: Option<i32>,
    replay: Option<&Path>,
    patterns_file: Option<&Path>,
    relative: bool,
    debug_all: bool,
    options: BrowserOptions,
) -> Result<()> {
    let set = match patterns_file {
        Some(path) => load_patterns(path)
            .with_context(|| format!("Failed to load patterns from {}", path.display()))?,
        None => builtin_patterns(),
    };

    let mut compiled: Vec<CompiledPattern> = compile_all(&set)
        .into_iter()
        .filter_map(|result| result.map_err(|e| warn!("{}", e)).ok())
        .collect();

    let mut browser = open_session(pid, replay, options)?;
    let found = browser.find_all(&mut compiled, debug_all);

    for pattern in &compiled {
        match pattern.resolved_address {
            Some(address) if relative => {
                let target = browser
                    .try_resolve_relative(address, false)
                    .map(|t| format!("{:#x}", t))
                    .unwrap_or_else(|| "n/a".to_string());
                println!("{:<20} {:#018x} -> {}", pattern.name(), address, target);
            }
            Some(address) => println!("{:<20} {:#018x}", pattern.name(), address),
            None => println!("{:<20} not found", pattern.name()),
        }
    }

    println!("{} of {} patterns found", found, set.patterns.len());
    Ok(())
}
