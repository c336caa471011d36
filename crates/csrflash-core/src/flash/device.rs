//! CSR flash device adapter

use crate::error::Outcome;
use crate::protocol;
use crate::register::{RegisterAddress, RegisterDatum, RegisterIo};
use crate::status::Status;
use crate::wait::{BusyWait, WaitStrategy};
use maybe_async::maybe_async;

/// Flash device driven through a command/status register
///
/// Owns the register backend and the wait strategy. Each [`program`] call
/// runs the full sequence once; nothing is carried over between calls.
///
/// # Example
///
/// ```ignore
/// use csrflash_core::flash::CsrFlash;
///
/// let mut flash = CsrFlash::new(backend);
/// let outcome = flash.program(0x1000, 0x55aa);
/// assert!(outcome.is_success());
/// ```
///
/// [`program`]: CsrFlash::program
#[derive(Debug)]
pub struct CsrFlash<IO, W = BusyWait> {
    io: IO,
    wait: W,
}

impl<IO: RegisterIo> CsrFlash<IO> {
    /// Create a device that busy-waits for completion
    pub fn new(io: IO) -> Self {
        Self { io, wait: BusyWait }
    }
}

impl<IO: RegisterIo, W: WaitStrategy> CsrFlash<IO, W> {
    /// Create a device with a custom wait strategy
    pub fn with_wait(io: IO, wait: W) -> Self {
        Self { io, wait }
    }

    /// Program `datum` into the cell at `address`
    ///
    /// On any failure outcome the device has already been reset.
    #[maybe_async]
    pub async fn program(&mut self, address: RegisterAddress, datum: RegisterDatum) -> Outcome {
        protocol::program_with(&mut self.io, &mut self.wait, address, datum).await
    }

    /// Read the status register once
    #[maybe_async]
    pub async fn read_status(&mut self) -> Status {
        protocol::read_status(&mut self.io).await
    }

    /// Block until the device reports ready and return its status
    #[maybe_async]
    pub async fn wait_ready(&mut self) -> Status {
        protocol::wait_ready(&mut self.io, &mut self.wait).await
    }

    /// Reset the device, clearing latched status
    #[maybe_async]
    pub async fn clear_status(&mut self) {
        protocol::clear_status(&mut self.io).await
    }

    /// Get a reference to the register backend
    pub fn io(&self) -> &IO {
        &self.io
    }

    /// Get a mutable reference to the register backend
    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    /// Get a mutable reference to the wait strategy
    pub fn wait_strategy_mut(&mut self) -> &mut W {
        &mut self.wait
    }

    /// Release the register backend
    pub fn into_inner(self) -> IO {
        self.io
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Device that is always ready and reports a fixed status
    struct FixedStatus {
        status: RegisterDatum,
        resets: u32,
        last_write: Option<(RegisterAddress, RegisterDatum)>,
    }

    impl FixedStatus {
        fn new(status: RegisterDatum) -> Self {
            Self {
                status,
                resets: 0,
                last_write: None,
            }
        }
    }

    impl RegisterIo for FixedStatus {
        fn read(&mut self, _address: RegisterAddress) -> RegisterDatum {
            self.status
        }

        fn write(&mut self, address: RegisterAddress, datum: RegisterDatum) {
            if address == 0 && datum == 0xff {
                self.resets += 1;
            }
            self.last_write = Some((address, datum));
        }
    }

    #[test]
    fn test_program_success() {
        let mut flash = CsrFlash::new(FixedStatus::new(0x80));
        assert_eq!(flash.program(0x100, 0x1234), Outcome::Success);
        assert_eq!(flash.io().resets, 0);
        assert_eq!(flash.io().last_write, Some((0x100, 0x1234)));
    }

    #[test]
    fn test_program_failure_resets_once() {
        let mut flash = CsrFlash::new(FixedStatus::new(0x80 | 0x02));
        assert_eq!(flash.program(0x100, 0x1234), Outcome::ProtectedBlockError);
        assert_eq!(flash.into_inner().resets, 1);
    }

    #[test]
    fn test_borrowed_backend() {
        let mut io = FixedStatus::new(0x80 | 0x10);
        {
            let mut flash = CsrFlash::new(&mut io);
            assert_eq!(flash.program(0x4, 0), Outcome::ProgramError);
            assert_eq!(flash.read_status(), Status::READY | Status::PROGRAM_ERROR);
            flash.clear_status();
        }
        assert_eq!(io.resets, 2);
    }
}
