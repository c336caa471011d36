//! Command codes written to the control/status register
//!
//! The CSR doubles as the command port: writes to offset 0 are interpreted
//! by the device as commands, reads return the status byte.

use crate::register::RegisterDatum;

/// Program setup - the next data write programs the addressed cell
pub const CMD_PROGRAM: RegisterDatum = 0x40;
/// Reset - clears latched status and returns the device to read mode
pub const CMD_RESET: RegisterDatum = 0xff;
