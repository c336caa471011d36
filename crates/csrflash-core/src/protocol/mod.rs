//! Protocol implementations
//!
//! This module contains the command/status register programming sequence.

mod csr;

pub use csr::*;
