//! Command/status register programming sequence
//!
//! A single-cell program runs through these phases, once per call:
//!
//! ```text
//! Idle -> Unlocking -> Writing -> Polling -> Deciding -> (Resetting) -> Done
//! ```
//!
//! 1. Write [`CMD_PROGRAM`] to the CSR, then the datum to the target cell.
//! 2. Read the CSR until the wait strategy reports ready. There is no cap on
//!    the number of reads.
//! 3. Classify the last status read (see [`crate::status::decode_status`]).
//! 4. On any failure write [`CMD_RESET`] to the CSR before returning.
//!
//! The reset clears the device's latched status; the call still reports the
//! failure. Callers must not issue a second reset.
//!
//! Uses `maybe_async` to support both sync and async modes:
//! - With `is_sync` feature: blocking/synchronous
//! - Without `is_sync` feature: async

use crate::command::{CMD_PROGRAM, CMD_RESET};
use crate::error::Outcome;
use crate::register::{RegisterAddress, RegisterDatum, RegisterIo, CSR_ADDRESS};
use crate::status::Status;
use crate::wait::{BusyWait, WaitStrategy};
use maybe_async::maybe_async;

/// Read the status register once
#[maybe_async]
pub async fn read_status<M: RegisterIo + ?Sized>(io: &mut M) -> Status {
    Status::from_datum(io.read(CSR_ADDRESS).await)
}

/// Send the reset command, clearing latched status
#[maybe_async]
pub async fn clear_status<M: RegisterIo + ?Sized>(io: &mut M) {
    io.write(CSR_ADDRESS, CMD_RESET).await
}

/// Send the program setup command followed by the data write
///
/// No read is performed between the two writes.
#[maybe_async]
pub async fn enter_program_mode<M: RegisterIo + ?Sized>(
    io: &mut M,
    address: RegisterAddress,
    datum: RegisterDatum,
) {
    io.write(CSR_ADDRESS, CMD_PROGRAM).await;
    io.write(address, datum).await;
}

/// Poll the status register until `wait` reports ready
///
/// Performs at least one read. Never gives up: a device that stays busy
/// keeps this loop spinning. Returns the status that ended the loop.
#[maybe_async]
pub async fn wait_ready<M, W>(io: &mut M, wait: &mut W) -> Status
where
    M: RegisterIo + ?Sized,
    W: WaitStrategy + ?Sized,
{
    let mut polls: u32 = 0;
    loop {
        let status = read_status(io).await;
        polls = polls.saturating_add(1);
        if wait.is_ready(status) {
            log::trace!("Ready after {} poll(s), status {:?}", polls, status);
            return status;
        }
        wait.backoff(polls);
    }
}

/// Program `datum` into the cell at `address`, busy-waiting for completion
#[maybe_async]
pub async fn program<M: RegisterIo + ?Sized>(
    io: &mut M,
    address: RegisterAddress,
    datum: RegisterDatum,
) -> Outcome {
    program_with(io, &mut BusyWait, address, datum).await
}

/// Program `datum` into the cell at `address` using a custom wait strategy
#[maybe_async]
pub async fn program_with<M, W>(
    io: &mut M,
    wait: &mut W,
    address: RegisterAddress,
    datum: RegisterDatum,
) -> Outcome
where
    M: RegisterIo + ?Sized,
    W: WaitStrategy + ?Sized,
{
    log::debug!("Programming 0x{:04X} at 0x{:08X}", datum, address);
    enter_program_mode(io, address, datum).await;

    let status = wait_ready(io, wait).await;
    let outcome = status.outcome();

    if !outcome.is_success() {
        log::warn!(
            "Program at 0x{:08X} failed: {} (status 0x{:02X}), resetting device",
            address,
            outcome,
            status.bits()
        );
        clear_status(io).await;
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wait::Backoff;
    use heapless::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Access {
        Read(RegisterAddress),
        Write(RegisterAddress, RegisterDatum),
    }

    /// Replays scripted status values and records every access
    struct ScriptedIo<'a> {
        reads: &'a [RegisterDatum],
        next_read: usize,
        log: Vec<Access, 32>,
    }

    impl<'a> ScriptedIo<'a> {
        fn new(reads: &'a [RegisterDatum]) -> Self {
            Self {
                reads,
                next_read: 0,
                log: Vec::new(),
            }
        }

        fn writes(&self) -> impl Iterator<Item = (RegisterAddress, RegisterDatum)> + '_ {
            self.log.iter().filter_map(|a| match a {
                Access::Write(addr, data) => Some((*addr, *data)),
                Access::Read(_) => None,
            })
        }

        fn read_count(&self) -> usize {
            self.log
                .iter()
                .filter(|a| matches!(a, Access::Read(_)))
                .count()
        }
    }

    impl RegisterIo for ScriptedIo<'_> {
        fn read(&mut self, address: RegisterAddress) -> RegisterDatum {
            let value = *self
                .reads
                .get(self.next_read)
                .expect("protocol read more often than scripted");
            self.next_read += 1;
            self.log.push(Access::Read(address)).unwrap();
            value
        }

        fn write(&mut self, address: RegisterAddress, datum: RegisterDatum) {
            self.log.push(Access::Write(address, datum)).unwrap();
        }
    }

    const READY: RegisterDatum = 1 << 7;

    fn assert_program_mode_entered(io: &ScriptedIo<'_>) {
        assert_eq!(io.log[0], Access::Write(0, 0x40));
        assert_eq!(io.log[1], Access::Write(0xdead, 0xbeef));
    }

    #[test]
    fn test_program_succeeds_ready_immediately() {
        let reads = [READY];
        let mut io = ScriptedIo::new(&reads);

        assert_eq!(program(&mut io, 0xdead, 0xbeef), Outcome::Success);

        assert_program_mode_entered(&io);
        assert_eq!(io.log[2], Access::Read(0));
        assert_eq!(io.log.len(), 3);
    }

    #[test]
    fn test_program_succeeds_after_waiting_for_ready() {
        let reads = [0, 0, READY];
        let mut io = ScriptedIo::new(&reads);

        assert_eq!(program(&mut io, 0xdead, 0xbeef), Outcome::Success);

        assert_program_mode_entered(&io);
        assert_eq!(&io.log[2..], &[Access::Read(0); 3]);
        assert_eq!(io.writes().count(), 2);
    }

    #[test]
    fn test_error_bits_before_ready_are_ignored() {
        // Busy reads may carry stale error bits; only the ready read decides
        let reads = [1 << 3 | 1 << 4, READY];
        let mut io = ScriptedIo::new(&reads);

        assert_eq!(program(&mut io, 0xdead, 0xbeef), Outcome::Success);
        assert_eq!(io.read_count(), 2);
        assert_eq!(io.writes().count(), 2);
    }

    #[test]
    fn test_program_vpp_error() {
        let reads = [READY | 1 << 3];
        let mut io = ScriptedIo::new(&reads);

        assert_eq!(program(&mut io, 0xdead, 0xbeef), Outcome::VppError);

        assert_program_mode_entered(&io);
        assert_eq!(io.log[2], Access::Read(0));
        assert_eq!(io.log[3], Access::Write(0, 0xff));
        assert_eq!(io.log.len(), 4);
    }

    #[test]
    fn test_program_program_error() {
        let reads = [READY | 1 << 4];
        let mut io = ScriptedIo::new(&reads);

        assert_eq!(program(&mut io, 0xdead, 0xbeef), Outcome::ProgramError);
        assert_eq!(io.log.last(), Some(&Access::Write(0, 0xff)));
    }

    #[test]
    fn test_program_protected_block_error() {
        let reads = [READY | 1 << 1];
        let mut io = ScriptedIo::new(&reads);

        assert_eq!(
            program(&mut io, 0xdead, 0xbeef),
            Outcome::ProtectedBlockError
        );
        assert_eq!(io.log.last(), Some(&Access::Write(0, 0xff)));
    }

    #[test]
    fn test_program_invalid_error() {
        let reads = [READY | 1 << 2];
        let mut io = ScriptedIo::new(&reads);

        assert_eq!(
            program(&mut io, 0xdead, 0xbeef),
            Outcome::InvalidStatusError
        );

        assert_program_mode_entered(&io);
        assert_eq!(io.log[2], Access::Read(0));
        assert_eq!(io.log[3], Access::Write(0, 0xff));
        assert_eq!(io.log.len(), 4);
    }

    #[test]
    fn test_all_error_bits_classify_as_vpp() {
        let reads = [READY | 1 << 1 | 1 << 2 | 1 << 3 | 1 << 4];
        let mut io = ScriptedIo::new(&reads);

        assert_eq!(program(&mut io, 0x10, 0x1234), Outcome::VppError);

        let writes: Vec<_, 4> = io.writes().collect();
        assert_eq!(&writes[..], &[(0, 0x40), (0x10, 0x1234), (0, 0xff)]);
    }

    #[test]
    fn test_reset_written_once_after_slow_failure() {
        let reads = [0, 0, 0, READY | 1 << 4];
        let mut io = ScriptedIo::new(&reads);

        assert_eq!(program(&mut io, 0x20, 0), Outcome::ProgramError);
        assert_eq!(io.read_count(), 4);

        let resets = io.writes().filter(|w| *w == (0, 0xff)).count();
        assert_eq!(resets, 1);
    }

    #[test]
    fn test_backoff_runs_between_polls_only() {
        let reads = [0, 0, READY];
        let mut io = ScriptedIo::new(&reads);
        let mut calls: heapless::Vec<u32, 4> = heapless::Vec::new();
        let mut wait = Backoff::new(|polls| calls.push(polls).unwrap());

        let outcome = program_with(&mut io, &mut wait, 0xdead, 0xbeef);

        assert_eq!(outcome, Outcome::Success);
        assert_eq!(&calls[..], &[1, 2]);
    }

    #[test]
    fn test_wait_ready_returns_ready_snapshot() {
        let reads = [0, READY | 1 << 2];
        let mut io = ScriptedIo::new(&reads);

        let status = wait_ready(&mut io, &mut BusyWait);

        assert_eq!(status, Status::READY | Status::INVALID_STATUS);
        assert_eq!(io.writes().count(), 0);
    }

    #[test]
    fn test_clear_status_writes_reset() {
        let reads: [RegisterDatum; 0] = [];
        let mut io = ScriptedIo::new(&reads);
        clear_status(&mut io);
        assert_eq!(&io.log[..], &[Access::Write(0, 0xff)]);
    }
}
