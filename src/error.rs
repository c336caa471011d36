//! Error types for the command-line front end

use csrflash_core::ProgramError;
use thiserror::Error;

/// CLI errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Backend name not recognised (or not compiled in)
    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    /// Backend option without `=`
    #[error("Invalid parameter format: '{0}' (expected key=value)")]
    InvalidParamFormat(String),

    /// Backend option with an unusable value
    #[error("Invalid value '{value}' for '{param}': {reason}")]
    InvalidParam {
        param: String,
        value: String,
        reason: String,
    },

    /// Required backend option missing
    #[error("Backend {backend} requires {param}=<value>")]
    MissingParam {
        backend: &'static str,
        param: &'static str,
    },

    /// Opening the MMIO window failed
    #[cfg(feature = "mmio")]
    #[error(transparent)]
    Mmio(#[from] csrflash_mmio::MmioError),

    /// Device reported a failed program cycle
    #[error("Program failed: {0}")]
    Program(#[from] ProgramError),
}
