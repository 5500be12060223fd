//! Common CLI utility functions shared across commands.

use std::path::Path;

use anyhow::{Context, Result, bail};
use hunter_core::{Browser, BrowserOptions, LiveProcess};
use tracing::info;

use crate::cli::Args;

/// Session options from the options file, overridden by command-line flags.
pub fn browser_options(args: &Args) -> Result<BrowserOptions> {
    let mut options = match &args.options {
        Some(path) => BrowserOptions::load(path)
            .with_context(|| format!("Failed to load options from {}", path.display()))?,
        None => BrowserOptions::default(),
    };
    if args.direct {
        options.direct_mem = true;
    }
    if args.no_dirty {
        options.dirty_tracking = false;
    }
    if args.eager {
        options.lazy_alloc = false;
    }
    Ok(options)
}

/// Attach to a live process and take a first snapshot.
pub fn attach(pid: i32, options: BrowserOptions) -> Result<Browser> {
    let process = LiveProcess::new(pid);
    if !process.is_alive() {
        bail!("Process {} not found", pid);
    }
    let mut browser = Browser::with_source(process, options);
    browser
        .snapshot()
        .with_context(|| format!("Failed to snapshot process {}", pid))?;
    Ok(browser)
}

/// Open a session on either a live process or a replay directory.
pub fn open_session(
    pid: Option<i32>,
    replay: Option<&Path>,
    options: BrowserOptions,
) -> Result<Browser> {
    match (pid, replay) {
        (_, Some(dir)) => {
            let mut browser = Browser::offline(options);
            browser
                .load(dir)
                .with_context(|| format!("Failed to load dumps from {}", dir.display()))?;
            info!("Replaying {}", dir.display());
            Ok(browser)
        }
        (Some(pid), None) => attach(pid, options),
        (None, None) => bail!("Either --pid or --replay is required"),
    }
}
