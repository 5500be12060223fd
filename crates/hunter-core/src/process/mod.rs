mod bytes;
pub mod maps;
mod reader;
mod source;

// Mock process for testing (always available for unit and integration tests)
#[doc(hidden)]
pub mod mock;

pub use bytes::{Primitive, TextEncoding, decode_text};
pub use maps::{MapEntry, parse_map_line, parse_maps, read_process_maps};
pub use reader::LiveProcess;
pub use source::MemorySource;

#[doc(hidden)]
pub use mock::{MockProcess, MockProcessBuilder};
