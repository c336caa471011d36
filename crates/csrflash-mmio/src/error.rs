//! Error types for the MMIO backend

use thiserror::Error;

/// MMIO backend errors
#[derive(Debug, Error)]
pub enum MmioError {
    /// Failed to open /dev/mem
    #[error("Failed to open /dev/mem: {0}")]
    OpenFailed(#[source] std::io::Error),

    /// mmap of the physical range failed
    #[error("Failed to map {size:#x} bytes at {address:#x}: {source}")]
    MapFailed {
        address: u64,
        size: usize,
        #[source]
        source: std::io::Error,
    },

    /// Register address falls outside the mapped window
    #[error("Register address {address:#x} is outside the {size:#x} byte window")]
    OutOfRange { address: u32, size: usize },

    /// Bus width / stride combination cannot be accessed
    #[error("Invalid register layout: {0}")]
    InvalidLayout(String),

    /// Operation not supported on this platform
    #[error("Not supported: {0}")]
    NotSupported(&'static str),
}

/// Result type for MMIO operations
pub type Result<T> = std::result::Result<T, MmioError>;
