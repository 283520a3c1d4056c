//! Little-endian readers and small helpers for ELF64 parsing

use crate::formats::elf::types::{ElfError, Result};

/// Bounds-checked little-endian reads from a byte slice
pub trait LeRead {
    fn read_u16(&self, offset: usize) -> Result<u16>;
    fn read_u32(&self, offset: usize) -> Result<u32>;
    fn read_u64(&self, offset: usize) -> Result<u64>;
    fn read_i64(&self, offset: usize) -> Result<i64>;
}

fn read_array<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    offset
        .checked_add(N)
        .and_then(|end| data.get(offset..end))
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(ElfError::Truncated { offset, needed: N })
}

impl LeRead for [u8] {
    fn read_u16(&self, offset: usize) -> Result<u16> {
        read_array(self, offset).map(u16::from_le_bytes)
    }

    fn read_u32(&self, offset: usize) -> Result<u32> {
        read_array(self, offset).map(u32::from_le_bytes)
    }

    fn read_u64(&self, offset: usize) -> Result<u64> {
        read_array(self, offset).map(u64::from_le_bytes)
    }

    fn read_i64(&self, offset: usize) -> Result<i64> {
        read_array(self, offset).map(i64::from_le_bytes)
    }
}

/// Read a null-terminated string from data
pub fn read_cstring(data: &[u8], offset: usize) -> Result<&str> {
    if offset >= data.len() {
        return Err(ElfError::InvalidOffset { offset });
    }

    let slice = &data[offset..];
    let end = slice.iter().position(|&b| b == 0).unwrap_or(slice.len());

    std::str::from_utf8(&slice[..end]).map_err(|_| ElfError::InvalidString)
}

/// Align a value up to the specified alignment, `None` on overflow
pub fn align_up(value: u64, alignment: u64) -> Option<u64> {
    if alignment <= 1 {
        Some(value)
    } else {
        value
            .checked_add(alignment - 1)
            .map(|v| v & !(alignment - 1))
    }
}

/// Slice `[offset, offset + size)` out of `data`, if it fits
pub fn slice_at(data: &[u8], offset: u64, size: u64) -> Option<&[u8]> {
    let start = usize::try_from(offset).ok()?;
    let len = usize::try_from(size).ok()?;
    data.get(start..start.checked_add(len)?)
}
