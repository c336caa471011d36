//! High-level flash device
//!
//! [`CsrFlash`] bundles a register backend with a wait strategy so callers
//! don't have to thread both through every protocol call.

mod device;

pub use device::CsrFlash;
