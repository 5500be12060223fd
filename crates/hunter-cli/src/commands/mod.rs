//! CLI command implementations.

pub mod dump;
pub mod hex_utils;
pub mod read;
pub mod regions;
pub mod scan;
pub mod watch;
