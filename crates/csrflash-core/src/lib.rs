//! csrflash-core - Command/status register flash programming
//!
//! This crate implements the classic Intel/AMD-style command/status register
//! (CSR) protocol for programming a single flash cell through a memory-mapped
//! register window. It is `no_std` and allocation free so the same code runs
//! on a host talking to `/dev/mem`, inside firmware, or against an emulator.
//!
//! # Features
//!
//! - `std` - Implement `std::error::Error` for [`ProgramError`] (includes `alloc`)
//! - `alloc` - Implement [`RegisterIo`] for boxed backends
//! - `is_sync` - Compile the register trait and protocol as blocking code
//!
//! # Example
//!
//! ```ignore
//! use csrflash_core::{flash::CsrFlash, register::RegisterIo};
//!
//! fn program_word<IO: RegisterIo>(io: IO) {
//!     let mut flash = CsrFlash::new(io);
//!     match flash.program(0xdead, 0xbeef).into_result() {
//!         Ok(()) => println!("programmed"),
//!         Err(e) => println!("program failed: {}", e),
//!     }
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
// Allow async fn in traits - we use maybe-async for dual sync/async support
#![allow(async_fn_in_trait)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod command;
pub mod error;
pub mod flash;
pub mod protocol;
pub mod register;
pub mod status;
pub mod wait;

pub use error::{Outcome, ProgramError, Result};
pub use register::{RegisterAddress, RegisterDatum, RegisterIo, CSR_ADDRESS};
pub use status::Status;
