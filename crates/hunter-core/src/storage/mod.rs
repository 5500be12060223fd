mod dump;

pub use dump::*;
