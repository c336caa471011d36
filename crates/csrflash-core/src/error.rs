//! Outcome and error types for csrflash-core
//!
//! Every programming call ends in exactly one [`Outcome`]. There is no
//! separate error channel: the four failure kinds are ordinary results.
//! [`ProgramError`] is the failure half of that set, for callers that want
//! to propagate with `?`.

use core::fmt;

/// Result of a single programming call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Cell programmed, no error bits reported
    Success,
    /// Programming voltage error (status bit 3)
    VppError,
    /// Program failure (status bit 4)
    ProgramError,
    /// Target lies in a protected block (status bit 1)
    ProtectedBlockError,
    /// Device reported an invalid command or status (status bit 2)
    InvalidStatusError,
}

/// Failure kinds of a programming call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramError {
    /// Programming voltage error
    Vpp,
    /// Program failure
    Program,
    /// Target lies in a protected block
    ProtectedBlock,
    /// Invalid command or status
    InvalidStatus,
}

impl Outcome {
    /// Whether the call succeeded
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// The failure kind, if any
    pub const fn error(self) -> Option<ProgramError> {
        match self {
            Self::Success => None,
            Self::VppError => Some(ProgramError::Vpp),
            Self::ProgramError => Some(ProgramError::Program),
            Self::ProtectedBlockError => Some(ProgramError::ProtectedBlock),
            Self::InvalidStatusError => Some(ProgramError::InvalidStatus),
        }
    }

    /// Convert into a `Result` so failures can be propagated with `?`
    pub const fn into_result(self) -> Result<()> {
        match self.error() {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }
}

impl From<ProgramError> for Outcome {
    fn from(err: ProgramError) -> Self {
        match err {
            ProgramError::Vpp => Self::VppError,
            ProgramError::Program => Self::ProgramError,
            ProgramError::ProtectedBlock => Self::ProtectedBlockError,
            ProgramError::InvalidStatus => Self::InvalidStatusError,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error() {
            None => write!(f, "success"),
            Some(e) => write!(f, "{}", e),
        }
    }
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vpp => write!(f, "programming voltage (Vpp) error"),
            Self::Program => write!(f, "program error"),
            Self::ProtectedBlock => write!(f, "block is protected"),
            Self::InvalidStatus => write!(f, "invalid command or status"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ProgramError {}

/// Result type alias using the core error type
pub type Result<T> = core::result::Result<T, ProgramError>;
