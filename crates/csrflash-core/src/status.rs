//! Status register model
//!
//! Bit layout of the status byte returned by a CSR read:
//!
//! | Bit | Meaning |
//! |-----|---------|
//! | 7   | Ready: the device finished its internal operation |
//! | 4   | Program error |
//! | 3   | Vpp (programming voltage) error |
//! | 2   | Invalid command / status error |
//! | 1   | Protected block |
//!
//! The error bits are only meaningful once [`Status::READY`] is set.

use crate::error::Outcome;
use crate::register::RegisterDatum;
use bitflags::bitflags;

bitflags! {
    /// Status register bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: RegisterDatum {
        /// Write attempted to a locked block
        const PROTECTED_BLOCK = 1 << 1;
        /// Device rejected the command sequence
        const INVALID_STATUS  = 1 << 2;
        /// Programming voltage out of range
        const VPP_ERROR       = 1 << 3;
        /// Cell failed to program
        const PROGRAM_ERROR   = 1 << 4;
        /// Internal operation complete, status valid
        const READY           = 1 << 7;

        /// All bits that classify as a failure
        const ERRORS = Self::PROTECTED_BLOCK.bits()
            | Self::INVALID_STATUS.bits()
            | Self::VPP_ERROR.bits()
            | Self::PROGRAM_ERROR.bits();
    }
}

/// Error bits in the order they are tested; the first match wins.
///
/// Reordering this table changes how multi-bit status values classify.
const DECODE_PRIORITY: [(Status, Outcome); 4] = [
    (Status::VPP_ERROR, Outcome::VppError),
    (Status::PROGRAM_ERROR, Outcome::ProgramError),
    (Status::PROTECTED_BLOCK, Outcome::ProtectedBlockError),
    (Status::INVALID_STATUS, Outcome::InvalidStatusError),
];

impl Status {
    /// Interpret a raw CSR read, keeping bits this crate has no name for
    pub const fn from_datum(datum: RegisterDatum) -> Self {
        Self::from_bits_retain(datum)
    }

    /// Whether the device reports ready
    pub const fn is_ready(self) -> bool {
        self.contains(Self::READY)
    }

    /// Whether any error bit is set
    pub const fn has_error(self) -> bool {
        self.intersects(Self::ERRORS)
    }

    /// Classify this status into an [`Outcome`]
    ///
    /// The ready bit is ignored here; callers are expected to have waited
    /// for it already.
    pub fn outcome(self) -> Outcome {
        decode_status(self)
    }
}

/// Classify a status snapshot using the fixed error bit priority
pub fn decode_status(status: Status) -> Outcome {
    DECODE_PRIORITY
        .iter()
        .find(|(bit, _)| status.contains(*bit))
        .map(|(_, outcome)| *outcome)
        .unwrap_or(Outcome::Success)
}
