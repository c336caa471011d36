//! Physical memory mapping for MMIO access
//!
//! This module maps a physical address range through /dev/mem on Linux so
//! the flash's register window can be accessed with volatile loads and
//! stores.
//!
//! # Safety
//!
//! Accessing physical memory is inherently unsafe and requires root
//! privileges. The caller is responsible for pointing the mapping at the
//! flash register window and nothing else.

use crate::error::{MmioError, Result};

/// Page-aligned extent of a physical mapping
#[cfg(target_os = "linux")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PageSpan {
    /// Physical address rounded down to a page boundary
    aligned_addr: u64,
    /// Distance from `aligned_addr` to the requested address
    page_offset: usize,
    /// Whole pages covering `page_offset + len`
    map_len: usize,
}

/// Compute the pages needed to cover `len` bytes at `phys_addr`
///
/// `page_size` must be a power of two. Fails when `len` is zero or the
/// rounded mapping length does not fit in `usize`.
#[cfg(target_os = "linux")]
fn page_span(phys_addr: u64, len: usize, page_size: usize) -> Result<PageSpan> {
    if len == 0 {
        return Err(MmioError::InvalidLayout("mapping length is zero".into()));
    }
    if !page_size.is_power_of_two() {
        return Err(MmioError::InvalidLayout(format!(
            "page size {:#x} is not a power of two",
            page_size
        )));
    }

    let page_mask = page_size - 1;
    // The offset is below page_size, so it always fits in usize
    let page_offset = (phys_addr & page_mask as u64) as usize;
    let aligned_addr = phys_addr - page_offset as u64;
    let map_len = len
        .checked_add(page_offset)
        .and_then(|n| n.checked_add(page_mask))
        .map(|n| n & !page_mask)
        .ok_or_else(|| {
            MmioError::InvalidLayout(format!(
                "{:#x} bytes at {:#x} overflows the address space",
                len, phys_addr
            ))
        })?;

    Ok(PageSpan {
        aligned_addr,
        page_offset,
        map_len,
    })
}

/// A mapped region of physical memory
#[cfg(target_os = "linux")]
pub struct PhysMap {
    /// Pointer to the first requested byte
    ptr: *mut u8,
    /// Requested length
    len: usize,
    /// Length of the underlying page-aligned mapping
    map_len: usize,
    /// Distance from the page-aligned mapping start to `ptr`
    page_offset: usize,
    /// Physical address (for error reporting)
    phys_addr: u64,
}

#[cfg(target_os = "linux")]
impl PhysMap {
    /// Map `len` bytes of physical memory starting at `phys_addr`
    ///
    /// The mapping is uncached (`O_SYNC`) and shared, as required for
    /// device registers.
    pub fn new(phys_addr: u64, len: usize) -> Result<Self> {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;
        use std::os::unix::io::AsRawFd;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open("/dev/mem")
            .map_err(MmioError::OpenFailed)?;

        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
        let PageSpan {
            aligned_addr,
            page_offset,
            map_len,
        } = page_span(phys_addr, len, page_size)?;

        let base = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                map_len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                aligned_addr as libc::off_t,
            )
        };

        if base == libc::MAP_FAILED {
            return Err(MmioError::MapFailed {
                address: phys_addr,
                size: len,
                source: std::io::Error::last_os_error(),
            });
        }

        log::debug!(
            "Mapped {:#x} bytes at physical {:#x} ({:#x} byte mapping)",
            len,
            phys_addr,
            map_len
        );

        Ok(Self {
            ptr: unsafe { (base as *mut u8).add(page_offset) },
            len,
            map_len,
            page_offset,
            phys_addr,
        })
    }

    /// Read an 8-bit value at `offset`
    #[inline]
    pub fn read8(&self, offset: usize) -> u8 {
        debug_assert!(offset < self.len);
        unsafe { core::ptr::read_volatile(self.ptr.add(offset)) }
    }

    /// Read a 16-bit value at `offset`, which must be 2-byte aligned
    #[inline]
    pub fn read16(&self, offset: usize) -> u16 {
        debug_assert!(offset + 2 <= self.len);
        debug_assert!(offset & 1 == 0, "unaligned 16-bit read");
        unsafe { core::ptr::read_volatile(self.ptr.add(offset) as *const u16) }
    }

    /// Read a 32-bit value at `offset`, which must be 4-byte aligned
    #[inline]
    pub fn read32(&self, offset: usize) -> u32 {
        debug_assert!(offset + 4 <= self.len);
        debug_assert!(offset & 3 == 0, "unaligned 32-bit read");
        unsafe { core::ptr::read_volatile(self.ptr.add(offset) as *const u32) }
    }

    /// Write an 8-bit value at `offset`
    #[inline]
    pub fn write8(&self, offset: usize, value: u8) {
        debug_assert!(offset < self.len);
        unsafe { core::ptr::write_volatile(self.ptr.add(offset), value) }
    }

    /// Write a 16-bit value at `offset`, which must be 2-byte aligned
    #[inline]
    pub fn write16(&self, offset: usize, value: u16) {
        debug_assert!(offset + 2 <= self.len);
        debug_assert!(offset & 1 == 0, "unaligned 16-bit write");
        unsafe { core::ptr::write_volatile(self.ptr.add(offset) as *mut u16, value) }
    }

    /// Write a 32-bit value at `offset`, which must be 4-byte aligned
    #[inline]
    pub fn write32(&self, offset: usize, value: u32) {
        debug_assert!(offset + 4 <= self.len);
        debug_assert!(offset & 3 == 0, "unaligned 32-bit write");
        unsafe { core::ptr::write_volatile(self.ptr.add(offset) as *mut u32, value) }
    }

    /// Physical address of the first mapped byte
    pub fn phys_addr(&self) -> u64 {
        self.phys_addr
    }

    /// Number of accessible bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the mapping is empty (never true for a live mapping)
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(target_os = "linux")]
impl Drop for PhysMap {
    fn drop(&mut self) {
        unsafe {
            let base = self.ptr.sub(self.page_offset);
            libc::munmap(base as *mut libc::c_void, self.map_len);
        }
    }
}

// The mapping is only touched through volatile accesses; exclusive use is
// enforced one level up by `&mut self` on RegisterIo.
#[cfg(target_os = "linux")]
unsafe impl Send for PhysMap {}

// Stub for non-Linux platforms
#[cfg(not(target_os = "linux"))]
pub struct PhysMap {
    _private: (),
}

#[cfg(not(target_os = "linux"))]
impl PhysMap {
    pub fn new(_phys_addr: u64, _len: usize) -> Result<Self> {
        Err(MmioError::NotSupported(
            "physical memory mapping is only supported on Linux",
        ))
    }

    pub fn read8(&self, _offset: usize) -> u8 {
        0
    }

    pub fn read16(&self, _offset: usize) -> u16 {
        0
    }

    pub fn read32(&self, _offset: usize) -> u32 {
        0
    }

    pub fn write8(&self, _offset: usize, _value: u8) {}

    pub fn write16(&self, _offset: usize, _value: u16) {}

    pub fn write32(&self, _offset: usize, _value: u32) {}

    pub fn phys_addr(&self) -> u64 {
        0
    }

    pub fn len(&self) -> usize {
        0
    }

    pub fn is_empty(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires root and /dev/mem access
    fn test_physmap_unaligned_start() {
        // Low memory is readable on most x86 machines
        let map = PhysMap::new(0xf0010, 0x20).unwrap();
        assert_eq!(map.len(), 0x20);
        assert_eq!(map.phys_addr(), 0xf0010);
        let _ = map.read8(0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_zero_length_rejected() {
        assert!(matches!(
            page_span(0x1000, 0, 0x1000),
            Err(MmioError::InvalidLayout(_))
        ));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_page_span_unaligned() {
        let span = page_span(0xf0010, 0x20, 0x1000).unwrap();
        assert_eq!(
            span,
            PageSpan {
                aligned_addr: 0xf0000,
                page_offset: 0x10,
                map_len: 0x1000,
            }
        );

        // Crossing a page boundary maps both pages
        let span = page_span(0x1ff0, 0x20, 0x1000).unwrap();
        assert_eq!(span.aligned_addr, 0x1000);
        assert_eq!(span.map_len, 0x2000);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_page_span_overflow_rejected() {
        for addr in [0x1000, 0x1001, 0x1002, 0x1fff] {
            assert!(matches!(
                page_span(addr, usize::MAX, 0x1000),
                Err(MmioError::InvalidLayout(_))
            ));
        }
        // Largest length that still rounds up without wrapping
        assert!(page_span(0x1000, usize::MAX - 0xfff, 0x1000).is_ok());
        assert!(page_span(0x1001, usize::MAX - 0xfff, 0x1000).is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_page_span_rejects_bad_page_size() {
        assert!(page_span(0x1000, 0x10, 0x1800).is_err());
    }
}
