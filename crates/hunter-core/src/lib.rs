pub mod config;
pub mod error;
pub mod memory;
pub mod pattern;
pub mod process;
pub mod storage;

pub use config::BrowserOptions;
pub use error::{Error, Result};
pub use memory::{Browser, CaptureState, CatalogStats, MemoryRegion};
pub use pattern::{CompiledPattern, PatternSet, PatternSignature, load_patterns, save_patterns};
pub use process::{LiveProcess, MemorySource, Primitive, TextEncoding};

#[doc(hidden)]
pub use process::{MockProcess, MockProcessBuilder};
