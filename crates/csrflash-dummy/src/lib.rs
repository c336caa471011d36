//! csrflash-dummy - In-memory CSR flash emulator for testing
//!
//! This crate provides register backends that need no hardware:
//!
//! - [`DummyCsrFlash`] emulates a command/status register flash part with
//!   NOR programming semantics, a configurable busy period and fault
//!   injection.
//! - [`ScriptedIo`] replays a fixed list of status values, for checking the
//!   exact register sequence a caller produces.
//!
//! Both record every register access in order.

use core::ops::Range;

use csrflash_core::command::{CMD_PROGRAM, CMD_RESET};
use csrflash_core::{RegisterAddress, RegisterDatum, RegisterIo, Status, CSR_ADDRESS};

/// A single register access as seen by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Read of the given address
    Read(RegisterAddress),
    /// Write of a datum to the given address
    Write(RegisterAddress, RegisterDatum),
}

/// Value of an erased cell
pub const ERASED: RegisterDatum = 0xffff;

/// Largest cell count the front end accepts (32 MiB of backing store)
pub const MAX_SIZE: u32 = 1 << 24;

/// Configuration for the dummy flash
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Number of addressable cells, including the CSR at address 0
    ///
    /// Every cell is backed by memory up front; see [`MAX_SIZE`].
    pub size: u32,
    /// Status reads reporting busy after each program cycle
    pub busy_polls: u32,
    /// Simulate a programming voltage fault
    pub vpp_low: bool,
    /// Address ranges that refuse programming
    pub protected: Vec<Range<RegisterAddress>>,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            size: 64 * 1024,
            busy_polls: 2,
            vpp_low: false,
            protected: Vec::new(),
        }
    }
}

/// Dummy CSR flash
///
/// Address 0 is the command/status register; every other address in
/// `1..size` is a cell. Cells start erased. A data write only takes effect
/// right after [`CMD_PROGRAM`] was written to the CSR, and can only clear
/// bits. Errors latch in the status register until [`CMD_RESET`].
#[derive(Debug)]
pub struct DummyCsrFlash {
    config: DummyConfig,
    cells: Vec<RegisterDatum>,
    latched: Status,
    armed: bool,
    busy_remaining: u32,
    accesses: Vec<Access>,
}

impl DummyCsrFlash {
    /// Create a new dummy flash with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let cells = vec![ERASED; config.size as usize];
        Self {
            config,
            cells,
            latched: Status::empty(),
            armed: false,
            busy_remaining: 0,
            accesses: Vec::new(),
        }
    }

    /// Create a new dummy flash with default configuration
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Value of the cell at `address`, if it exists
    pub fn cell(&self, address: RegisterAddress) -> Option<RegisterDatum> {
        if address == CSR_ADDRESS {
            return None;
        }
        self.cells.get(address as usize).copied()
    }

    /// Error bits currently latched
    pub fn latched_status(&self) -> Status {
        self.latched
    }

    /// Toggle the programming voltage fault
    pub fn set_vpp_low(&mut self, vpp_low: bool) {
        self.config.vpp_low = vpp_low;
    }

    /// Refuse programming inside `range`
    pub fn protect(&mut self, range: Range<RegisterAddress>) {
        self.config.protected.push(range);
    }

    /// All accesses since creation or the last [`take_accesses`](Self::take_accesses)
    pub fn accesses(&self) -> &[Access] {
        &self.accesses
    }

    /// Drain the access log
    pub fn take_accesses(&mut self) -> Vec<Access> {
        core::mem::take(&mut self.accesses)
    }

    fn is_protected(&self, address: RegisterAddress) -> bool {
        self.config.protected.iter().any(|r| r.contains(&address))
    }

    fn handle_command(&mut self, command: RegisterDatum) {
        match command {
            CMD_PROGRAM => self.armed = true,
            CMD_RESET => {
                self.latched = Status::empty();
                self.armed = false;
                self.busy_remaining = 0;
            }
            other => {
                log::debug!("dummy: unknown command 0x{:02X}", other);
                self.latched |= Status::INVALID_STATUS;
                self.armed = false;
            }
        }
    }

    fn handle_program(&mut self, address: RegisterAddress, datum: RegisterDatum) {
        self.armed = false;
        self.busy_remaining = self.config.busy_polls;

        if self.config.vpp_low {
            self.latched |= Status::VPP_ERROR;
            return;
        }

        let Some(current) = self.cell(address) else {
            log::debug!("dummy: program outside array at 0x{:08X}", address);
            self.latched |= Status::INVALID_STATUS;
            return;
        };

        if self.is_protected(address) {
            self.latched |= Status::PROTECTED_BLOCK;
            return;
        }

        // Flash programming: can only change 1 -> 0
        if current & datum != datum {
            self.latched |= Status::PROGRAM_ERROR;
            return;
        }

        self.cells[address as usize] = datum;
    }
}

impl RegisterIo for DummyCsrFlash {
    fn read(&mut self, address: RegisterAddress) -> RegisterDatum {
        self.accesses.push(Access::Read(address));

        if address != CSR_ADDRESS {
            return self.cell(address).unwrap_or(ERASED);
        }

        if self.busy_remaining > 0 {
            self.busy_remaining -= 1;
            return self.latched.difference(Status::READY).bits();
        }
        (self.latched | Status::READY).bits()
    }

    fn write(&mut self, address: RegisterAddress, datum: RegisterDatum) {
        self.accesses.push(Access::Write(address, datum));

        if address == CSR_ADDRESS {
            self.handle_command(datum);
        } else if self.armed {
            self.handle_program(address, datum);
        } else {
            log::debug!("dummy: data write to 0x{:08X} without setup", address);
            self.latched |= Status::INVALID_STATUS;
        }
    }
}

/// Scripted register backend
///
/// Every read returns the next scripted value regardless of address; once
/// the script runs out the last value repeats. Writes are only recorded.
#[derive(Debug, Clone)]
pub struct ScriptedIo {
    script: Vec<RegisterDatum>,
    position: usize,
    accesses: Vec<Access>,
}

impl ScriptedIo {
    /// Create a backend replaying `script`
    pub fn new(script: impl IntoIterator<Item = RegisterDatum>) -> Self {
        Self {
            script: script.into_iter().collect(),
            position: 0,
            accesses: Vec::new(),
        }
    }

    /// All accesses so far
    pub fn accesses(&self) -> &[Access] {
        &self.accesses
    }

    /// Number of scripted values consumed
    pub fn reads_consumed(&self) -> usize {
        self.position
    }
}

impl RegisterIo for ScriptedIo {
    fn read(&mut self, address: RegisterAddress) -> RegisterDatum {
        self.accesses.push(Access::Read(address));
        let value = self
            .script
            .get(self.position)
            .or(self.script.last())
            .copied()
            .unwrap_or(0);
        self.position = (self.position + 1).min(self.script.len());
        value
    }

    fn write(&mut self, address: RegisterAddress, datum: RegisterDatum) {
        self.accesses.push(Access::Write(address, datum));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csrflash_core::flash::CsrFlash;
    use csrflash_core::{protocol, Outcome};

    fn quick_config() -> DummyConfig {
        DummyConfig {
            size: 0x100,
            busy_polls: 0,
            ..DummyConfig::default()
        }
    }

    #[test]
    fn test_program_and_read_back() {
        let mut flash = CsrFlash::new(DummyCsrFlash::new(quick_config()));

        assert_eq!(flash.program(0x10, 0xbeef), Outcome::Success);

        let dummy = flash.into_inner();
        assert_eq!(dummy.cell(0x10), Some(0xbeef));
        assert_eq!(dummy.cell(0x11), Some(ERASED));
        assert!(dummy.latched_status().is_empty());
    }

    #[test]
    fn test_busy_period_is_polled_through() {
        let config = DummyConfig {
            busy_polls: 3,
            ..quick_config()
        };
        let mut dummy = DummyCsrFlash::new(config);

        assert_eq!(protocol::program(&mut dummy, 0x20, 0x1234), Outcome::Success);
        assert_eq!(
            dummy.accesses(),
            &[
                Access::Write(0, 0x40),
                Access::Write(0x20, 0x1234),
                Access::Read(0),
                Access::Read(0),
                Access::Read(0),
                Access::Read(0),
            ]
        );
    }

    #[test]
    fn test_zero_to_one_is_program_error() {
        let mut dummy = DummyCsrFlash::new(quick_config());

        assert_eq!(protocol::program(&mut dummy, 0x30, 0x00ff), Outcome::Success);
        assert_eq!(
            protocol::program(&mut dummy, 0x30, 0xff00),
            Outcome::ProgramError
        );

        // Cell unchanged, status cleared by the reset write
        assert_eq!(dummy.cell(0x30), Some(0x00ff));
        assert!(dummy.latched_status().is_empty());
        assert_eq!(dummy.accesses().last(), Some(&Access::Write(0, 0xff)));
    }

    #[test]
    fn test_clearing_more_bits_succeeds() {
        let mut dummy = DummyCsrFlash::new(quick_config());

        assert_eq!(protocol::program(&mut dummy, 0x30, 0x0ff0), Outcome::Success);
        assert_eq!(protocol::program(&mut dummy, 0x30, 0x00f0), Outcome::Success);
        assert_eq!(dummy.cell(0x30), Some(0x00f0));
    }

    #[test]
    fn test_vpp_low() {
        let mut dummy = DummyCsrFlash::new(quick_config());
        dummy.set_vpp_low(true);

        assert_eq!(protocol::program(&mut dummy, 0x40, 0), Outcome::VppError);
        assert_eq!(dummy.cell(0x40), Some(ERASED));
    }

    #[test]
    fn test_protected_range() {
        let mut dummy = DummyCsrFlash::new(quick_config());
        dummy.protect(0x80..0x90);

        assert_eq!(
            protocol::program(&mut dummy, 0x88, 0),
            Outcome::ProtectedBlockError
        );
        assert_eq!(protocol::program(&mut dummy, 0x90, 0), Outcome::Success);
    }

    #[test]
    fn test_out_of_range_is_invalid() {
        let mut dummy = DummyCsrFlash::new(quick_config());

        assert_eq!(
            protocol::program(&mut dummy, 0x1000, 0),
            Outcome::InvalidStatusError
        );
    }

    #[test]
    fn test_vpp_takes_priority_over_protection() {
        let mut dummy = DummyCsrFlash::new(quick_config());
        dummy.protect(0x01..0x100);
        dummy.set_vpp_low(true);

        assert_eq!(protocol::program(&mut dummy, 0x10, 0), Outcome::VppError);
    }

    #[test]
    fn test_unarmed_write_latches_invalid() {
        let mut dummy = DummyCsrFlash::new(quick_config());
        dummy.write(0x10, 0);

        assert_eq!(dummy.cell(0x10), Some(ERASED));
        assert_eq!(
            protocol::read_status(&mut dummy),
            Status::READY | Status::INVALID_STATUS
        );

        protocol::clear_status(&mut dummy);
        assert_eq!(protocol::read_status(&mut dummy), Status::READY);
    }

    #[test]
    fn test_unknown_command_latches_invalid() {
        let mut dummy = DummyCsrFlash::new(quick_config());
        dummy.write(CSR_ADDRESS, 0x20);
        assert!(dummy.latched_status().contains(Status::INVALID_STATUS));
    }

    #[test]
    fn test_take_accesses_drains_log() {
        let mut dummy = DummyCsrFlash::new(quick_config());
        protocol::read_status(&mut dummy);

        assert_eq!(dummy.take_accesses(), vec![Access::Read(0)]);
        assert!(dummy.accesses().is_empty());
    }

    #[test]
    fn test_scripted_sequence() {
        let mut io = ScriptedIo::new([0, 0, 1 << 7]);

        assert_eq!(protocol::program(&mut io, 0xdead, 0xbeef), Outcome::Success);
        assert_eq!(io.reads_consumed(), 3);
        assert_eq!(
            io.accesses(),
            &[
                Access::Write(0, 0x40),
                Access::Write(0xdead, 0xbeef),
                Access::Read(0),
                Access::Read(0),
                Access::Read(0),
            ]
        );
    }

    #[test]
    fn test_scripted_repeats_last_value() {
        let mut io = ScriptedIo::new([1 << 7 | 1 << 2]);

        assert_eq!(
            protocol::program(&mut io, 0xdead, 0xbeef),
            Outcome::InvalidStatusError
        );
        assert_eq!(
            protocol::read_status(&mut io),
            Status::READY | Status::INVALID_STATUS
        );
        assert_eq!(io.accesses()[3], Access::Write(0, 0xff));
    }
}
