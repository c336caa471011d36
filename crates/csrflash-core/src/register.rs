//! Register access capability
//!
//! The protocol never touches hardware directly. Everything goes through
//! [`RegisterIo`], which a backend (MMIO mapping, emulator, test double)
//! implements.
//!
//! Uses `maybe_async` to support both sync and async modes:
//! - With `is_sync` feature: blocking/synchronous
//! - Without `is_sync` feature: async (for Embassy and friends)

use maybe_async::maybe_async;

/// Offset of a register or flash cell inside the device window
pub type RegisterAddress = u32;

/// Value read from or written to a register
pub type RegisterDatum = u16;

/// Offset of the control/status register
pub const CSR_ADDRESS: RegisterAddress = 0;

/// Raw register access (sync or async depending on `is_sync` feature)
///
/// Both operations are assumed to complete before returning. Any
/// clear-on-read behaviour of the device is the implementation's concern.
///
/// Taking `&mut self` means one outstanding operation per handle; sharing a
/// device between threads requires the caller to serialize access.
#[maybe_async(AFIT)]
pub trait RegisterIo {
    /// Read the current value at `address`
    async fn read(&mut self, address: RegisterAddress) -> RegisterDatum;

    /// Write `datum` to `address`
    async fn write(&mut self, address: RegisterAddress, datum: RegisterDatum);
}

#[maybe_async(AFIT)]
impl<T: RegisterIo + ?Sized> RegisterIo for &mut T {
    async fn read(&mut self, address: RegisterAddress) -> RegisterDatum {
        (**self).read(address).await
    }

    async fn write(&mut self, address: RegisterAddress, datum: RegisterDatum) {
        (**self).write(address, datum).await
    }
}

// Lets a CLI pick a backend at runtime behind `Box<dyn RegisterIo>`
#[cfg(feature = "alloc")]
#[maybe_async(AFIT)]
impl<T: RegisterIo + ?Sized> RegisterIo for alloc::boxed::Box<T> {
    async fn read(&mut self, address: RegisterAddress) -> RegisterDatum {
        (**self).read(address).await
    }

    async fn write(&mut self, address: RegisterAddress, datum: RegisterDatum) {
        (**self).write(address, datum).await
    }
}
