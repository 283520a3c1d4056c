//! Kernel symbols and the kernel header stored at each kernel's start.

use crate::code_object::CodeObject;
use crate::error::{CodeObjectError, Result};
use crate::formats::elf::symbols::SymbolRef;
use std::fmt;
use tracing::trace;

/// Size of the kernel header (`amd_kernel_code_t`) at the start of a kernel
pub const KERNEL_HEADER_SIZE: usize = 256;

/// Read-only view of the fixed-size kernel header.
///
/// The layout beyond the leading identification fields is owned by the
/// runtime; [`KernelHeader::as_bytes`] exposes the whole payload.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct KernelHeader<'a> {
    bytes: &'a [u8; KERNEL_HEADER_SIZE],
}

impl<'a> KernelHeader<'a> {
    /// View the first [`KERNEL_HEADER_SIZE`] bytes of `bytes`
    pub fn from_bytes(bytes: &'a [u8]) -> Option<Self> {
        let bytes = bytes.get(..KERNEL_HEADER_SIZE)?.try_into().ok()?;
        Some(Self { bytes })
    }

    pub fn as_bytes(&self) -> &'a [u8; KERNEL_HEADER_SIZE] {
        self.bytes
    }

    fn field<const N: usize>(&self, at: usize) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[at..at + N]);
        out
    }

    pub fn version_major(&self) -> u32 {
        u32::from_le_bytes(self.field(0))
    }

    pub fn version_minor(&self) -> u32 {
        u32::from_le_bytes(self.field(4))
    }

    pub fn machine_kind(&self) -> u16 {
        u16::from_le_bytes(self.field(8))
    }

    /// Machine version as (major, minor, stepping)
    pub fn machine_version(&self) -> (u16, u16, u16) {
        (
            u16::from_le_bytes(self.field(10)),
            u16::from_le_bytes(self.field(12)),
            u16::from_le_bytes(self.field(14)),
        )
    }

    /// Byte offset from the header to the first instruction
    pub fn kernel_code_entry_byte_offset(&self) -> i64 {
        i64::from_le_bytes(self.field(16))
    }
}

impl fmt::Debug for KernelHeader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelHeader")
            .field("version", &(self.version_major(), self.version_minor()))
            .field("machine_kind", &self.machine_kind())
            .field("machine_version", &self.machine_version())
            .field("entry_offset", &self.kernel_code_entry_byte_offset())
            .finish()
    }
}

/// A symbol-table entry known to denote a kernel.
///
/// Obtained from [`CodeObject::kernels`] or [`CodeObject::as_kernel_symbol`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelSymbol<'a> {
    symbol: SymbolRef<'a>,
}

impl<'a> KernelSymbol<'a> {
    pub(crate) fn new_unchecked(symbol: SymbolRef<'a>) -> Self {
        Self { symbol }
    }

    pub fn name(&self) -> &'a str {
        self.symbol.name
    }

    /// Virtual address of the kernel inside the code section
    pub fn value(&self) -> u64 {
        self.symbol.value()
    }

    /// Declared size; zero means unspecified
    pub fn size(&self) -> u64 {
        self.symbol.size()
    }

    /// Index in the symbol table
    pub fn index(&self) -> usize {
        self.symbol.index
    }

    pub fn symbol(&self) -> &SymbolRef<'a> {
        &self.symbol
    }

    /// The kernel header at this symbol's address.
    ///
    /// Read from the text section's file data at `value - sh_addr`. Bounds
    /// are checked on every call since the symbol may come from untrusted
    /// input; a section without file data (NOBITS) has no header.
    pub fn kernel_header<'data>(
        &self,
        code_object: &CodeObject<'data>,
    ) -> Result<KernelHeader<'data>> {
        let text = code_object.text_section()?;
        let bounds = text.addr()..text.addr().saturating_add(text.size());
        let header_len = KERNEL_HEADER_SIZE as u64;
        let end = self.value().saturating_add(header_len);
        let out_of_range = || CodeObjectError::out_of_range(self.value(), end, bounds.clone());

        let relative = self
            .value()
            .checked_sub(text.addr())
            .filter(|rel| rel.checked_add(header_len).is_some_and(|e| e <= text.size()))
            .and_then(|rel| usize::try_from(rel).ok())
            .ok_or_else(out_of_range)?;

        trace!(
            kernel = self.name(),
            offset = text.offset().saturating_add(relative as u64),
            "Reading kernel header"
        );
        text.data
            .get(relative..)
            .and_then(KernelHeader::from_bytes)
            .ok_or_else(out_of_range)
    }
}
