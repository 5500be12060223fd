//! Session options and front-end timing constants.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Consistency and performance trade-offs of a browsing session.
///
/// Fixed when the session is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserOptions {
    /// Re-fetch a region at most once per polling cycle.
    pub dirty_tracking: bool,
    /// Allocate buffers for newly mapped regions only when first read.
    pub lazy_alloc: bool,
    /// Bypass the catalog and read every value straight from the process.
    pub direct_mem: bool,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            dirty_tracking: true,
            lazy_alloc: true,
            direct_mem: false,
        }
    }
}

impl BrowserOptions {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Poll loop timing.
pub mod polling {
    use std::time::Duration;

    /// Time between two catalog refreshes in the watch loop.
    pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(1000);

    /// Refresh intervals below this are clamped.
    pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(50);

    /// Granularity of the keyboard poll inside one interval.
    pub const INPUT_POLL: Duration = Duration::from_millis(50);
}
