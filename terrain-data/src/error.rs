//! Error types for point cloud loading.

use thiserror::Error;

/// Errors that abort loading a point cloud.
///
/// A missing or unreadable file is not one of them: readers log a warning
/// and yield an empty cloud instead.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Unrecognized point cloud file: {0} (expected .txt, .lasbin or .las)")]
    UnrecognizedFormat(String),

    #[error("Unsupported LAS point data record format: {0} (only 1 and 2 are supported)")]
    UnsupportedPointFormat(u8),

    #[error("Truncated {what}: expected {expected} bytes, found {actual}")]
    TruncatedData {
        what: &'static str,
        expected: u64,
        actual: u64,
    },

    #[error("Height grid of {width}x{depth} cells exceeds the limit of {limit}")]
    GridTooLarge {
        width: usize,
        depth: usize,
        limit: usize,
    },

    #[error("Invalid LAS header: {0}")]
    InvalidHeader(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LoadError>;
