//! Register backend on top of a mapped window
//!
//! Register address `a` lives at byte offset `a * stride` inside the window
//! and is accessed with the configured bus width. On a 32-bit bus the datum
//! is zero-extended on write and truncated on read; on an 8-bit bus only the
//! low byte is transferred.

use crate::error::{MmioError, Result};
use crate::physmap::PhysMap;
use csrflash_core::{RegisterAddress, RegisterDatum, RegisterIo};

/// Bus width of a register access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegisterWidth {
    /// 8-bit accesses
    W8,
    /// 16-bit accesses
    #[default]
    W16,
    /// 32-bit accesses
    W32,
}

impl RegisterWidth {
    /// Width for a bit count (8, 16 or 32)
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(Self::W8),
            16 => Some(Self::W16),
            32 => Some(Self::W32),
            _ => None,
        }
    }

    /// Size of one access in bytes
    pub const fn bytes(self) -> usize {
        match self {
            Self::W8 => 1,
            Self::W16 => 2,
            Self::W32 => 4,
        }
    }
}

/// Raw volatile access to a mapped byte window
pub trait RegisterWindow {
    /// Number of accessible bytes
    fn len(&self) -> usize;
    /// Read an 8-bit value
    fn read8(&self, offset: usize) -> u8;
    /// Read a 16-bit value
    fn read16(&self, offset: usize) -> u16;
    /// Read a 32-bit value
    fn read32(&self, offset: usize) -> u32;
    /// Write an 8-bit value
    fn write8(&self, offset: usize, value: u8);
    /// Write a 16-bit value
    fn write16(&self, offset: usize, value: u16);
    /// Write a 32-bit value
    fn write32(&self, offset: usize, value: u32);
}

impl RegisterWindow for PhysMap {
    fn len(&self) -> usize {
        PhysMap::len(self)
    }
    fn read8(&self, offset: usize) -> u8 {
        PhysMap::read8(self, offset)
    }
    fn read16(&self, offset: usize) -> u16 {
        PhysMap::read16(self, offset)
    }
    fn read32(&self, offset: usize) -> u32 {
        PhysMap::read32(self, offset)
    }
    fn write8(&self, offset: usize, value: u8) {
        PhysMap::write8(self, offset, value)
    }
    fn write16(&self, offset: usize, value: u16) {
        PhysMap::write16(self, offset, value)
    }
    fn write32(&self, offset: usize, value: u32) {
        PhysMap::write32(self, offset, value)
    }
}

/// Flash register window accessed through memory-mapped I/O
pub struct MmioRegisters<M = PhysMap> {
    window: M,
    width: RegisterWidth,
    stride: usize,
}

impl MmioRegisters<PhysMap> {
    /// Map `len` bytes at `phys_addr` and wrap them as a register window
    pub fn open(phys_addr: u64, len: usize, width: RegisterWidth, stride: usize) -> Result<Self> {
        let map = PhysMap::new(phys_addr, len)?;
        Self::new(map, width, stride)
    }
}

impl<M: RegisterWindow> MmioRegisters<M> {
    /// Wrap an existing window
    ///
    /// `stride` is the byte distance between consecutive register
    /// addresses. It must be a non-zero multiple of the bus width so every
    /// access stays naturally aligned.
    pub fn new(window: M, width: RegisterWidth, stride: usize) -> Result<Self> {
        if stride == 0 || stride % width.bytes() != 0 {
            return Err(MmioError::InvalidLayout(format!(
                "stride {} is not a multiple of the {}-byte bus width",
                stride,
                width.bytes()
            )));
        }
        if window.len() < width.bytes() {
            return Err(MmioError::InvalidLayout(format!(
                "{}-byte window cannot hold the status register",
                window.len()
            )));
        }
        Ok(Self {
            window,
            width,
            stride,
        })
    }

    /// Bus width in use
    pub fn width(&self) -> RegisterWidth {
        self.width
    }

    /// Byte offset of `address`, if the whole access fits in the window
    pub fn offset(&self, address: RegisterAddress) -> Option<usize> {
        let start = (address as usize).checked_mul(self.stride)?;
        let end = start.checked_add(self.width.bytes())?;
        (end <= self.window.len()).then_some(start)
    }

    /// Fail unless `address` can be accessed
    pub fn check_address(&self, address: RegisterAddress) -> Result<()> {
        self.offset(address)
            .map(|_| ())
            .ok_or(MmioError::OutOfRange {
                address,
                size: self.window.len(),
            })
    }

    /// Release the underlying window
    pub fn into_window(self) -> M {
        self.window
    }
}

impl<M: RegisterWindow> RegisterIo for MmioRegisters<M> {
    fn read(&mut self, address: RegisterAddress) -> RegisterDatum {
        let Some(offset) = self.offset(address) else {
            log::error!("mmio: read of unmapped register {:#x}", address);
            return RegisterDatum::MAX;
        };
        let value = match self.width {
            RegisterWidth::W8 => self.window.read8(offset) as RegisterDatum,
            RegisterWidth::W16 => self.window.read16(offset),
            RegisterWidth::W32 => self.window.read32(offset) as RegisterDatum,
        };
        log::trace!("mmio: read  [{:#x}] -> {:#06x}", address, value);
        value
    }

    fn write(&mut self, address: RegisterAddress, datum: RegisterDatum) {
        let Some(offset) = self.offset(address) else {
            log::error!("mmio: write to unmapped register {:#x} dropped", address);
            return;
        };
        log::trace!("mmio: write [{:#x}] <- {:#06x}", address, datum);
        match self.width {
            RegisterWidth::W8 => self.window.write8(offset, datum as u8),
            RegisterWidth::W16 => self.window.write16(offset, datum),
            RegisterWidth::W32 => self.window.write32(offset, datum as u32),
        }
    }
}
