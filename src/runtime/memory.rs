//! WebAssembly linear memory
//!
//! A zero-initialised byte buffer whose length is always a whole number of
//! 64 KiB pages. Every access is bounds-checked; reaching past the end of
//! the buffer is the trap "out of bounds memory access".

use super::{RuntimeError, Trap};
use byteorder::{ByteOrder, LittleEndian};
use std::fmt;
use std::ops::Range;

/// WebAssembly page size in bytes (64KB)
pub const PAGE_SIZE: usize = 65536;

/// Absolute page count ceiling (4GB of address space)
pub const MAX_PAGES: u32 = 65536;

pub struct Memory {
    data: Vec<u8>,
    /// Page count the memory may grow to, never above [`MAX_PAGES`]
    maximum: u32,
}

impl Memory {
    /// Allocate `minimum` zeroed pages. An absent maximum means the page
    /// ceiling, and a larger one is clamped to it.
    pub fn from_limits(minimum: u32, maximum: Option<u32>) -> Result<Self, RuntimeError> {
        if minimum > MAX_PAGES {
            return Err(RuntimeError::InvalidModule(format!(
                "memory size {minimum} pages exceeds maximum {MAX_PAGES} pages"
            )));
        }
        let maximum = maximum.unwrap_or(MAX_PAGES).min(MAX_PAGES);
        if minimum > maximum {
            return Err(RuntimeError::InvalidModule(format!(
                "memory size {minimum} pages exceeds declared maximum {maximum} pages"
            )));
        }
        Ok(Memory {
            data: vec![0u8; minimum as usize * PAGE_SIZE],
            maximum,
        })
    }

    /// Memory sized to hold `bytes` (rounded up to whole pages) and fixed at
    /// that size, with `bytes` copied to address 0
    pub fn from_data(bytes: &[u8]) -> Self {
        let pages = bytes.len().div_ceil(PAGE_SIZE);
        let mut data = vec![0u8; pages * PAGE_SIZE];
        data[..bytes.len()].copy_from_slice(bytes);
        Memory {
            data,
            maximum: pages as u32,
        }
    }

    /// Current size in pages
    pub fn size(&self) -> u32 {
        (self.data.len() / PAGE_SIZE) as u32
    }

    pub fn maximum(&self) -> u32 {
        self.maximum
    }

    /// Grow by `pages` zeroed pages, returning the previous size. Fails
    /// without touching the buffer when the maximum would be exceeded.
    pub fn grow_by(&mut self, pages: u32) -> Option<u32> {
        let previous = self.size();
        let target = previous.checked_add(pages)?;
        if target > self.maximum {
            return None;
        }
        let bytes = target as usize * PAGE_SIZE;
        self.data.try_reserve(bytes - self.data.len()).ok()?;
        self.data.resize(bytes, 0);
        Some(previous)
    }

    fn range(&self, offset: u64, len: usize) -> Result<Range<usize>, RuntimeError> {
        let start = usize::try_from(offset).map_err(|_| Trap::MemoryOutOfBounds)?;
        let end = start.checked_add(len).ok_or(Trap::MemoryOutOfBounds)?;
        if end > self.data.len() {
            return Err(Trap::MemoryOutOfBounds.into());
        }
        Ok(start..end)
    }

    /// Read `ceil(bits / 8)` bytes at `offset` as a little-endian integer
    pub fn load(&self, offset: u64, bits: u32) -> Result<u64, RuntimeError> {
        let len = width(bits)?;
        let range = self.range(offset, len)?;
        Ok(LittleEndian::read_uint(&self.data[range], len))
    }

    /// Write the low `bits` of `value` at `offset`, little-endian
    pub fn store(&mut self, offset: u64, value: u64, bits: u32) -> Result<(), RuntimeError> {
        let len = width(bits)?;
        let range = self.range(offset, len)?;
        let masked = if len == 8 { value } else { value & ((1u64 << (len * 8)) - 1) };
        LittleEndian::write_uint(&mut self.data[range], masked, len);
        Ok(())
    }

    /// Copy `bytes` into memory at `offset`, as done for data segments
    pub fn write_bytes(&mut self, offset: u64, bytes: &[u8]) -> Result<(), RuntimeError> {
        let range = self.range(offset, bytes.len())?;
        self.data[range].copy_from_slice(bytes);
        Ok(())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Byte width of an access of `bits` bits
fn width(bits: u32) -> Result<usize, RuntimeError> {
    match bits {
        1..=64 => Ok(bits.div_ceil(8) as usize),
        _ => Err(RuntimeError::InvalidInstruction(format!("{bits}-bit memory access"))),
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memory")
            .field("pages", &self.size())
            .field("maximum", &self.maximum)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn is_out_of_bounds<T: fmt::Debug>(result: Result<T, RuntimeError>) -> bool {
        matches!(result, Err(RuntimeError::Trap(Trap::MemoryOutOfBounds)))
    }

    #[test]
    fn test_from_limits() {
        let mem = Memory::from_limits(1, Some(10)).unwrap();
        assert_eq!(mem.size(), 1);
        assert_eq!(mem.maximum(), 10);
        assert_eq!(mem.bytes().len(), PAGE_SIZE);

        let mem = Memory::from_limits(0, None).unwrap();
        assert_eq!(mem.size(), 0);
        assert_eq!(mem.maximum(), MAX_PAGES);

        let mem = Memory::from_limits(0, Some(MAX_PAGES + 5)).unwrap();
        assert_eq!(mem.maximum(), MAX_PAGES);

        assert!(Memory::from_limits(MAX_PAGES + 1, None).is_err());
        assert!(Memory::from_limits(3, Some(2)).is_err());
    }

    #[test]
    fn test_from_data() {
        let mem = Memory::from_data(&[1, 2, 3]);
        assert_eq!(mem.size(), 1);
        assert_eq!(mem.maximum(), 1);
        assert_eq!(mem.load(0, 24).unwrap(), 0x03_02_01);
        assert_eq!(mem.load(3, 8).unwrap(), 0);

        let empty = Memory::from_data(&[]);
        assert_eq!(empty.size(), 0);
    }

    #[test]
    fn test_grow_within_limit() {
        let mut mem = Memory::from_limits(1, Some(3)).unwrap();
        mem.store(0, 0xdead_beef, 32).unwrap();

        assert_eq!(mem.grow_by(2), Some(1));
        assert_eq!(mem.size(), 3);
        assert_eq!(mem.bytes().len() % PAGE_SIZE, 0);
        // original data preserved, new pages zeroed
        assert_eq!(mem.load(0, 32).unwrap(), 0xdead_beef);
        assert_eq!(mem.load(PAGE_SIZE as u64 * 2, 64).unwrap(), 0);
        assert_eq!(mem.grow_by(0), Some(3));
    }

    #[test]
    fn test_grow_beyond_maximum_fails_untouched() {
        let mut mem = Memory::from_limits(0, Some(2)).unwrap();
        assert_eq!(mem.grow_by(3), None);
        assert_eq!(mem.size(), 0);
        assert_eq!(mem.grow_by(u32::MAX), None);
        assert!(mem.bytes().is_empty());
    }

    #[rstest]
    #[case(8, 0xab, &[0xab])]
    #[case(16, 0xbeef, &[0xef, 0xbe])]
    #[case(32, 0x1234_5678, &[0x78, 0x56, 0x34, 0x12])]
    #[case(64, 0x0102_0304_0506_0708, &[8, 7, 6, 5, 4, 3, 2, 1])]
    fn test_little_endian(#[case] bits: u32, #[case] value: u64, #[case] bytes: &[u8]) {
        let mut mem = Memory::from_limits(1, None).unwrap();
        mem.store(3, value, bits).unwrap();
        assert_eq!(&mem.bytes()[3..3 + bytes.len()], bytes);
        assert_eq!(mem.load(3, bits).unwrap(), value);
    }

    #[test]
    fn test_store_masks_to_width() {
        let mut mem = Memory::from_limits(1, None).unwrap();
        mem.store(0, u64::MAX, 64).unwrap();
        mem.store(0, 0x1_2345, 16).unwrap();
        assert_eq!(mem.load(0, 32).unwrap(), 0xffff_2345);
    }

    #[test]
    fn test_bounds() {
        let mut mem = Memory::from_limits(1, None).unwrap();
        let end = PAGE_SIZE as u64;
        assert!(mem.load(end - 4, 32).is_ok());
        assert!(is_out_of_bounds(mem.load(end - 3, 32)));
        assert!(is_out_of_bounds(mem.load(end, 8)));
        assert!(is_out_of_bounds(mem.store(end - 7, 1, 64)));
        assert!(is_out_of_bounds(mem.load(u64::MAX, 8)));
        assert!(is_out_of_bounds(mem.write_bytes(end - 2, &[0; 3])));
        mem.write_bytes(end - 3, &[9; 3]).unwrap();
        assert_eq!(mem.load(end - 1, 8).unwrap(), 9);
    }
}
