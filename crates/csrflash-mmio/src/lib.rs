//! csrflash-mmio - Memory-mapped register backend
//!
//! Gives the CSR programming protocol access to a real flash part whose
//! command/status register and array are visible in the physical address
//! space (parallel NOR behind a bus bridge, boot flash windows, FPGA
//! soft-cores). The window is mapped through `/dev/mem`, so this needs root.
//!
//! # Example
//!
//! ```ignore
//! use csrflash_core::flash::CsrFlash;
//! use csrflash_mmio::{MmioRegisters, RegisterWidth};
//!
//! let regs = MmioRegisters::open(0xff80_0000, 0x80_0000, RegisterWidth::W16, 2)?;
//! let mut flash = CsrFlash::new(regs);
//! flash.program(0x100, 0x1234).into_result()?;
//! ```

mod error;
mod physmap;
mod registers;

pub use error::{MmioError, Result};
pub use physmap::PhysMap;
pub use registers::{MmioRegisters, RegisterWidth, RegisterWindow};
