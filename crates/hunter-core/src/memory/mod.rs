mod browser;
mod catalog;
mod region;
mod resolve;

pub use browser::Browser;
pub use catalog::{CatalogStats, RegionCatalog};
pub use region::{CaptureState, MemoryRegion};
pub use resolve::rip;
