//! Watch command implementation.
//!
//! Locates every watched signature once, then polls the process: each cycle
//! refreshes the catalog, re-evaluates every watch and paints a frame.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::terminal;
use hunter_core::config::polling;
use hunter_core::pattern::CompiledPattern;
use hunter_core::{Browser, BrowserOptions, CatalogStats, MemorySource, TextEncoding};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cli::ValueType;
use crate::cli_utils::attach;
use crate::control::LoopControl;
use crate::input::{self, KeyAction};
use crate::render::{Attr, Brush, FileBrush, TerminalBrush};
use crate::value::{ValueFormat, read_value, resolve_target};

/// One watched value: signature, then optional RIP-relative step and
/// pointer chain, then a typed read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchSpec {
    pub name: String,
    pub pattern: String,
    #[serde(default)]
    pub relative: bool,
    #[serde(default)]
    pub chain: Vec<u64>,
    #[serde(default, rename = "type")]
    pub value_type: ValueType,
    /// Read a text field of this many bytes instead of a number.
    #[serde(default)]
    pub text_len: Option<usize>,
    #[serde(default)]
    pub encoding: TextEncoding,
}

impl WatchSpec {
    fn format(&self) -> ValueFormat {
        match self.text_len {
            Some(len) => ValueFormat::Text {
                len,
                encoding: self.encoding,
            },
            None => ValueFormat::Number(self.value_type),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WatchList {
    pub watches: Vec<WatchSpec>,
}

impl WatchList {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read {}", path.as_ref().display()))?;
        Ok(serde_json::from_str(&content)?)
    }
}

struct Watch {
    spec: WatchSpec,
    pattern: Option<CompiledPattern>,
}

struct WatchRow {
    name: String,
    address: Option<u64>,
    value: std::result::Result<String, String>,
}

/// Compile every watch and locate its signature in the current catalog.
fn locate<S: MemorySource>(browser: &Browser<S>, list: &WatchList) -> Vec<Watch> {
    list.watches
        .iter()
        .map(|spec| {
            let pattern = match CompiledPattern::compile(&spec.name, &spec.pattern) {
                Ok(mut pattern) => {
                    pattern.resolved_address = browser.find(&pattern, 0);
                    Some(pattern)
                }
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            };
            Watch {
                spec: spec.clone(),
                pattern,
            }
        })
        .collect()
}

/// Resolve and read one watch.
///
/// Misses (unmapped or short targets) end up in the row; anything else means
/// the session itself is broken and is returned as an error.
fn evaluate<S: MemorySource>(
    browser: &mut Browser<S>,
    watch: &Watch,
) -> hunter_core::Result<WatchRow> {
    let name = watch.spec.name.clone();
    let Some(found) = watch.pattern.as_ref().and_then(|p| p.resolved_address) else {
        return Ok(WatchRow {
            name,
            address: None,
            value: Err("pattern not found".to_string()),
        });
    };

    let spec = &watch.spec;
    let (address, value) = match resolve_target(browser, found, spec.relative, &spec.chain) {
        Ok(address) => (Some(address), read_value(browser, address, spec.format())),
        Err(e) => (None, Err(e)),
    };
    let value = match value {
        Ok(value) => Ok(value),
        Err(e) if e.is_lookup_miss() => Err(e.to_string()),
        Err(e) => return Err(e),
    };
    Ok(WatchRow {
        name,
        address,
        value,
    })
}

fn paint(
    brush: &mut dyn Brush,
    pid: i32,
    rows: &[WatchRow],
    stats: &CatalogStats,
    paused: bool,
) -> io::Result<()> {
    brush.begin_frame()?;

    brush.draw_text(&format!(" hunter  pid {} ", pid), &[Attr::Bold, Attr::Reverse])?;
    brush.draw_text(&format!("  {}", Local::now().format("%H:%M:%S")), &[Attr::Dim])?;
    if paused {
        brush.draw_text("  [paused]", &[Attr::Yellow, Attr::Bold])?;
    }
    brush.next_row()?;
    brush.next_row()?;

    let width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0);
    for row in rows {
        brush.draw_text(&format!("{:<width$}  ", row.name, width = width), &[Attr::Bold])?;
        match row.address {
            Some(address) => brush.draw_text(&format!("{:#018x}  ", address), &[Attr::Blue])?,
            None => brush.draw_text(&format!("{:<18}  ", "-"), &[Attr::Dim])?,
        }
        match &row.value {
            Ok(value) => brush.draw_text(value, &[Attr::Green])?,
            Err(message) => brush.draw_text(message, &[Attr::Red])?,
        }
        brush.next_row()?;
    }

    brush.next_row()?;
    let elapsed = stats
        .last_duration
        .map(|d| format!("{:.1} ms", d.as_secs_f64() * 1000.0))
        .unwrap_or_else(|| "-".to_string());
    brush.draw_text(
        &format!(
            "{} regions, {} bytes captured, refresh {}",
            stats.regions, stats.captured_bytes, elapsed
        ),
        &[Attr::Dim],
    )?;
    brush.next_row()?;
    brush.draw_text("p pause  r refresh  q quit", &[Attr::Dim])?;
    brush.next_row()?;

    brush.end_frame()
}

struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Run the watch command
pub fn run(
    pid: i32,
    watches_path: &Path,
    interval_ms: u64,
    output: Option<PathBuf>,
    options: BrowserOptions,
) -> Result<()> {
    let list = WatchList::load(watches_path)?;
    let interval = Duration::from_millis(interval_ms).max(polling::MIN_REFRESH_INTERVAL);

    let mut browser = attach(pid, options)?;
    let watches = locate(&browser, &list);
    info!(
        "Located {} of {} watches",
        watches
            .iter()
            .filter(|w| w.pattern.as_ref().is_some_and(|p| p.resolved_address.is_some()))
            .count(),
        watches.len()
    );

    let control = Arc::new(LoopControl::new());
    let control_ctrlc = Arc::clone(&control);
    ctrlc::set_handler(move || control_ctrlc.quit())?;

    let (mut brush, _raw_mode): (Box<dyn Brush>, Option<RawMode>) = match output {
        Some(path) => (Box::new(FileBrush::new(path)), None),
        None => {
            let raw_mode = RawMode::enable()?;
            let _keyboard = input::spawn_keyboard_monitor(Arc::clone(&control));
            (Box::new(TerminalBrush::new(io::stdout())), Some(raw_mode))
        }
    };

    let mut paused = false;
    let mut rows: Vec<WatchRow> = Vec::new();
    loop {
        if !paused || rows.is_empty() {
            browser
                .refresh_catalog()
                .with_context(|| format!("Lost process {}", pid))?;
            rows = watches
                .iter()
                .map(|w| evaluate(&mut browser, w))
                .collect::<hunter_core::Result<_>>()?;
        }
        paint(brush.as_mut(), pid, &rows, &browser.stats(), paused)?;

        match control.next_action(interval) {
            Some(KeyAction::Quit) => break,
            Some(KeyAction::Pause) => paused = !paused,
            Some(KeyAction::Refresh) => paused = false,
            None => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hunter_core::MockProcess;

    fn session() -> Browser<MockProcess> {
        let process = MockProcess::builder()
            .zeroed(0x1000, 0x100)
            .write_bytes(0x20, &[0x48, 0x8B, 0x0D])
            .write_i32(0x23, 0x80 - 0x27)
            .write_bytes(0x27, &[0x48, 0x8D, 0x54, 0x24, 0x38])
            .write_u64(0x80, 0x10C0)
            .write_i32(0xC8, 1234)
            .build();
        let mut browser = Browser::with_source(process, BrowserOptions::default());
        browser.snapshot().unwrap();
        browser
    }

    fn list() -> WatchList {
        serde_json::from_str(
            r#"{
                "watches": [
                    {
                        "name": "damage",
                        "pattern": "48 8B 0D ?? ?? ?? ?? 48 8D 54 24 38",
                        "relative": true,
                        "chain": [8],
                        "type": "i32"
                    },
                    { "name": "missing", "pattern": "DE AD BE EF" },
                    { "name": "broken", "pattern": "4" }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_watch_list_defaults() {
        let list = list();
        assert_eq!(list.watches[0].value_type, ValueType::I32);
        assert_eq!(list.watches[1].value_type, ValueType::U64);
        assert!(list.watches[1].chain.is_empty());
        assert_eq!(list.watches[1].encoding, TextEncoding::Utf8);
    }

    #[test]
    fn test_evaluate_watches() {
        let mut browser = session();
        let watches = locate(&browser, &list());
        assert!(watches[2].pattern.is_none());

        browser.refresh_catalog().unwrap();
        let rows: Vec<WatchRow> = watches
            .iter()
            .map(|w| evaluate(&mut browser, w).unwrap())
            .collect();
        assert_eq!(rows[0].address, Some(0x10C8));
        assert_eq!(rows[0].value, Ok("1234".to_string()));
        assert!(rows[1].value.is_err());
        assert!(rows[2].value.is_err());
    }

    #[test]
    fn test_paint_to_file() {
        let mut browser = session();
        let watches = locate(&browser, &list());
        let rows: Vec<WatchRow> = watches
            .iter()
            .map(|w| evaluate(&mut browser, w).unwrap())
            .collect();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.txt");
        let mut brush = FileBrush::new(&path);
        paint(&mut brush, 4242, &rows, &browser.stats(), true).unwrap();

        let frame = fs::read_to_string(&path).unwrap();
        assert!(frame.contains("pid 4242"));
        assert!(frame.contains("[paused]"));
        assert!(frame.contains("damage"));
        assert!(frame.contains("1234"));
        assert!(frame.contains("pattern not found"));
    }

    #[test]
    fn test_session_failure_is_not_a_miss() {
        let options = BrowserOptions {
            direct_mem: true,
            ..BrowserOptions::default()
        };
        let mut browser = Browser::offline(options);
        let mut pattern = CompiledPattern::compile("damage", "48 8B 0D").unwrap();
        pattern.resolved_address = Some(0x1000);
        let watch = Watch {
            spec: list().watches[0].clone(),
            pattern: Some(pattern),
        };

        assert!(matches!(
            evaluate(&mut browser, &watch),
            Err(hunter_core::Error::NoProcess)
        ));
    }
}
