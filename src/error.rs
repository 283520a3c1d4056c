//! Error types for code object access.
//!
//! Every fallible operation on a code object returns one of these variants
//! instead of panicking; all of them are deterministic for a given buffer.

use crate::formats::elf::ElfError;
use thiserror::Error;

/// Main error type for code object operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeObjectError {
    /// Fewer bytes remain than a record header needs
    #[error("Truncated record: {available} bytes left, header needs {needed}")]
    TruncatedRecord { available: usize, needed: usize },

    /// Descriptor shorter than the requested typed view
    #[error("Descriptor too small: need {needed} bytes, have {available}")]
    DescriptorTooSmall { needed: usize, available: usize },

    /// Symbol is not a function defined inside the code section
    #[error("Symbol '{name}' is not a kernel")]
    NotAKernel { name: String },

    /// Computed offset or extent lies outside the section
    #[error("Out of range: [{start:#x}, {end:#x}) exceeds section bounds [{bound_start:#x}, {bound_end:#x})")]
    OutOfRange {
        start: u64,
        end: u64,
        bound_start: u64,
        bound_end: u64,
    },

    /// Zero-size kernel symbol shares its start offset with another kernel
    #[error("Kernel extent at {offset:#x} is ambiguous: several kernels start there")]
    AmbiguousKernelExtent { offset: u64 },

    /// Canonical section absent
    #[error("Section not found: {0}")]
    SectionNotFound(String),

    /// The buffer is not a usable ELF64 image
    #[error("ELF error: {0}")]
    Elf(#[from] ElfError),
}

impl CodeObjectError {
    pub(crate) fn out_of_range(start: u64, end: u64, bounds: std::ops::Range<u64>) -> Self {
        Self::OutOfRange {
            start,
            end,
            bound_start: bounds.start,
            bound_end: bounds.end,
        }
    }
}

/// Result type alias for code object operations
pub type Result<T> = std::result::Result<T, CodeObjectError>;
