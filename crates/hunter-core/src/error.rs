use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Memory map of process {pid} unavailable: {source}")]
    EnumerationUnavailable {
        pid: i32,
        #[source]
        source: std::io::Error,
    },

    #[error("Inconsistent region sequence ({kind}): {prev_begin:#x}-{prev_end:#x} followed by {begin:#x}-{end:#x}")]
    InconsistentRegionOrdering {
        kind: &'static str,
        prev_begin: u64,
        prev_end: u64,
        begin: u64,
        end: u64,
    },

    #[error("Failed to read region {begin:#x}-{end:#x}: {message}")]
    RegionReadFailure { begin: u64, end: u64, message: String },

    #[error("Address {address:#x} is not mapped: {message}")]
    AddressNotMapped { address: u64, message: String },

    #[error("Read of {size} bytes at {address:#x} exceeds captured data ({available} bytes available)")]
    BufferTooSmall {
        address: u64,
        size: usize,
        available: usize,
    },

    #[error("Malformed pattern '{name}': {message}")]
    MalformedPattern { name: String, message: String },

    #[error("Persistence failure at {}: {message}", path.display())]
    PersistenceIoFailure { path: PathBuf, message: String },

    #[error("No live process attached to this session")]
    NoProcess,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn not_mapped(address: u64, message: impl Into<String>) -> Self {
        Error::AddressNotMapped {
            address,
            message: message.into(),
        }
    }

    pub fn malformed_pattern(name: &str, message: impl Into<String>) -> Self {
        Error::MalformedPattern {
            name: name.to_string(),
            message: message.into(),
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::PersistenceIoFailure {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether the error concerns a single lookup and leaves the session usable.
    ///
    /// Catalog-level failures (enumeration, ordering, persistence) are fatal
    /// to the operation that raised them.
    pub fn is_lookup_miss(&self) -> bool {
        matches!(
            self,
            Error::AddressNotMapped { .. }
                | Error::BufferTooSmall { .. }
                | Error::RegionReadFailure { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
